//! Runtime machinery behind the `trace_scope!`/`trace_point!` macros.
//!
//! Rust's macro hygiene means a `trace_point!` invocation can't reach into an
//! enclosing `trace_scope!`'s expansion the way the original's sibling-macro
//! trick did — the scope guard has to be bound to a variable and passed in
//! explicitly. The guard still carries the generation counters that let a
//! misplaced `TRACE` (declared against a `SCOPE` that isn't re-entered on
//! every iteration) be caught at runtime instead of silently misattributing
//! time.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::aggregator;
use crate::config;
use crate::location::{self, SiteKey, SiteMarker};
use crate::store::{Sample, TraceOptions};

thread_local! {
    static SCOPE_GENERATIONS: RefCell<HashMap<SiteKey, u32>> = RefCell::new(HashMap::new());
    static TRACE_GENERATIONS: RefCell<HashMap<SiteKey, u32>> = RefCell::new(HashMap::new());
}

fn next_generation(map: &'static std::thread::LocalKey<RefCell<HashMap<SiteKey, u32>>>, key: SiteKey) -> u32 {
    map.with(|cell| {
        let mut map = cell.borrow_mut();
        let slot = map.entry(key).or_insert(0);
        *slot += 1;
        *slot
    })
}

fn level_is_active(level: u8) -> bool {
    config::ACTIVE_COMPILE_LEVEL <= level && level >= config::config().trace_level()
}

enum GuardState {
    Active { key: SiteKey, scope_generation: u32 },
    Inert,
}

/// The value `trace_scope!` evaluates to. Bind it (`let _scope = ...;`) and
/// pass it to every `trace_point!` nested directly in the same block scope.
pub struct ScopeGuard {
    state: GuardState,
}

impl ScopeGuard {
    /// Called by `trace_scope!`; not meant to be invoked directly.
    #[doc(hidden)]
    pub fn enter(marker: &'static SiteMarker, level: u8, file: &'static str, line: u32) -> ScopeGuard {
        if !level_is_active(level) {
            return ScopeGuard { state: GuardState::Inert };
        }

        let key = location::site_key(marker);
        location::registry().publish(key, None, Some(file), Some(line));
        let scope_generation = next_generation(&SCOPE_GENERATIONS, key);
        aggregator::with_current_store(|store| store.scope_begin(key));
        ScopeGuard {
            state: GuardState::Active { key, scope_generation },
        }
    }

    /// Called by `trace_point!`; not meant to be invoked directly.
    #[doc(hidden)]
    #[allow(clippy::too_many_arguments)]
    pub fn trace(
        &self,
        marker: &'static SiteMarker,
        label: &'static str,
        file: &'static str,
        line: u32,
        mask: u8,
        handler: Option<&dyn Fn(&Sample)>,
    ) {
        let scope_generation = match self.state {
            GuardState::Inert => return,
            GuardState::Active { scope_generation, .. } => scope_generation,
        };

        let key = location::site_key(marker);
        location::registry().publish(key, Some(label), Some(file), Some(line));
        let trace_generation = next_generation(&TRACE_GENERATIONS, key);

        if scope_generation != trace_generation {
            tracing::warn!(
                label,
                file,
                line,
                scope_generation,
                trace_generation,
                "TRACE and its enclosing TRACE_SCOPE disagree on how many times they ran"
            );
            if scope_generation < trace_generation {
                panic!(
                    "TRACE {label} missing TRACE_SCOPE declaration in SAME block scope. \
                     TRACE_SCOPE count {scope_generation} < TRACE count {trace_generation}. \
                     Possible cause: TRACE_SCOPE for {{ TRACE }}. ({file}:{line})"
                );
            } else {
                panic!(
                    "TRACE {label} missing TRACE_SCOPE declaration in SAME block scope. \
                     TRACE_SCOPE count {scope_generation} > TRACE count {trace_generation}. \
                     Possible cause: TRACE_SCOPE if {{ TRACE }}. ({file}:{line})"
                );
            }
        }

        let mut options = TraceOptions::new(mask);
        if let Some(handler) = handler {
            options = options.with_handler(handler);
        }
        aggregator::with_current_store(|store| store.trace_point(key, &options));
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        if let GuardState::Active { .. } = self.state {
            aggregator::with_current_store(|store| store.scope_end());
        }
    }
}
