//! Process-wide, lazily-initialized tracing configuration.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::OnceLock;

/// Compile-time/runtime annotation level, ascending from most to least chatty.
pub const VERBOSE: u8 = 0;
pub const DEBUG: u8 = 1;
pub const INFO: u8 = 2;
pub const OFF: u8 = 3;

/// The compile-time instrumentation ceiling selected via Cargo features.
/// Annotations above this level are never recorded, and comparisons against
/// it are constant-folded away by the optimizer in release builds — the same
/// trick `tracing`'s `STATIC_MAX_LEVEL` uses.
#[cfg(feature = "level-verbose")]
pub const ACTIVE_COMPILE_LEVEL: u8 = VERBOSE;
#[cfg(all(feature = "level-debug", not(feature = "level-verbose")))]
pub const ACTIVE_COMPILE_LEVEL: u8 = DEBUG;
#[cfg(all(
    feature = "level-info",
    not(any(feature = "level-verbose", feature = "level-debug"))
))]
pub const ACTIVE_COMPILE_LEVEL: u8 = INFO;
#[cfg(all(
    feature = "level-off",
    not(any(feature = "level-verbose", feature = "level-debug", feature = "level-info"))
))]
pub const ACTIVE_COMPILE_LEVEL: u8 = OFF;

/// Runtime-mutable knobs consulted by every scope guard on construction.
pub struct TraceConfig {
    trace_level: AtomicU8,
    anonymize: AtomicBool,
}

impl TraceConfig {
    /// Runtime annotation ceiling. Annotations with `level < trace_level()`
    /// are inert for the lifetime of their guard.
    pub fn trace_level(&self) -> u8 {
        self.trace_level.load(Ordering::Relaxed)
    }

    pub fn set_trace_level(&self, level: u8) {
        self.trace_level.store(level, Ordering::Relaxed);
    }

    /// When set, location lookups blank `label`/`file`/`line`, keeping only
    /// the dense `anonymous_id`.
    pub fn anonymize(&self) -> bool {
        self.anonymize.load(Ordering::Relaxed)
    }

    pub fn set_anonymize(&self, anonymize: bool) {
        self.anonymize.store(anonymize, Ordering::Relaxed);
    }
}

pub fn config() -> &'static TraceConfig {
    static CONFIG: OnceLock<TraceConfig> = OnceLock::new();
    CONFIG.get_or_init(|| TraceConfig {
        trace_level: AtomicU8::new(INFO),
        anonymize: AtomicBool::new(false),
    })
}
