//! Hierarchical, in-process call-tree tracing and profiling for annotated
//! scopes and trace points. Unlike sampling profilers, every measurement
//! comes from an explicit `trace_scope!`/`trace_point!` annotation in the
//! source; the engine attributes it to a path in a per-thread call tree that
//! mirrors the lexical nesting of those annotations, aggregates repeated
//! visits to the same tree node, and renders the result as a table. Example:
//!
//! ```text
//! Trace summary of ThreadId(1)
//!
//! +-----------------+-------+----------+----------+-----------+-----------+------------+----------+
//! |      label      | count | time (s) | time (%) | rss (GiB) | hwm (GiB) | swap (GiB) | location |
//! +=================================================================================================+
//! | step1 (2)       |     1 |    0.100 |    83.33 |     0.012 |     0.012 |      0.000 | f.rs:12  |
//! |-----------------+-------+----------+----------+-----------+-----------+------------+----------|
//! | step2 (3)       |     1 |    0.020 |    16.67 |     0.012 |     0.012 |      0.000 | f.rs:14  |
//! +-----------------+-------+----------+----------+-----------+-----------+------------+----------+
//! ```
//!
//! Annotate code with [`trace_scope!`] at the top of a block and
//! [`trace_point!`] at the points within it you want measured. The guard
//! `trace_scope!` returns must be bound to a variable — Rust's macro hygiene
//! means a sibling `trace_point!` call can't reach it implicitly:
//!
//! ```
//! use scopetrace::{trace_point, trace_scope, INFO};
//!
//! fn handle_request() {
//!     let _scope = trace_scope!(INFO);
//!     // .. step one's work ..
//!     trace_point!(_scope, "step1");
//!     // .. step two's work ..
//!     trace_point!(_scope, "step2");
//! }
//! ```
//!
//! Call [`record_table()`] to get the aggregated [`ParallelRecordTable`]
//! across every thread that has traced so far, and [`render::render_parallel_table`]
//! to turn it into text.

mod aggregator;
pub mod config;
pub mod glue;
pub mod location;
pub mod memory;
pub mod render;
pub mod report;
pub mod store;

pub use aggregator::{clear, record_table};
pub use config::{DEBUG, INFO, OFF, VERBOSE};
pub use glue::ScopeGuard;
pub use location::{Location, SiteMarker};
pub use memory::Memory;
pub use report::{ParallelRecordTable, Record, RecordTable};
pub use store::{Sample, MEM};

/// Opens a scope lasting until the end of the current block. Evaluates to a
/// [`ScopeGuard`] that must be bound (`let _scope = trace_scope!(level);`);
/// its `Drop` closes the scope on every exit path, normal or not.
///
/// `level` must be one of [`VERBOSE`], [`DEBUG`], [`INFO`]. An annotation is
/// active only when `level` is at or above both the compile-time ceiling
/// (selected via the `level-*` Cargo features) and the runtime
/// [`config::TraceConfig::trace_level`].
#[macro_export]
macro_rules! trace_scope {
    ($level:expr) => {{
        static SITE: $crate::SiteMarker = $crate::SiteMarker::INIT;
        $crate::ScopeGuard::enter(&SITE, $level, file!(), line!())
    }};
}

/// Records a point at the current site against the `trace_scope!` guard bound
/// in the same block. Closes the interval since the previous trace point (or
/// the scope's own entry) and advances the tree's current node sideways to
/// this site's sibling slot.
///
/// Forms:
/// - `trace_point!(scope, label)`
/// - `trace_point!(scope, label, mask)` — `mask` is a bitwise-OR of flags;
///   only [`MEM`] is defined (sample memory at this point).
/// - `trace_point!(scope, label, mask, handler)` — additionally invoke
///   `handler(&Sample)` synchronously.
#[macro_export]
macro_rules! trace_point {
    ($scope:expr, $label:expr) => {{
        static SITE: $crate::SiteMarker = $crate::SiteMarker::INIT;
        $scope.trace(&SITE, $label, file!(), line!(), 0, None)
    }};
    ($scope:expr, $label:expr, $mask:expr) => {{
        static SITE: $crate::SiteMarker = $crate::SiteMarker::INIT;
        $scope.trace(&SITE, $label, file!(), line!(), $mask, None)
    }};
    ($scope:expr, $label:expr, $mask:expr, $handler:expr) => {{
        static SITE: $crate::SiteMarker = $crate::SiteMarker::INIT;
        $scope.trace(&SITE, $label, file!(), line!(), $mask, Some(&$handler as &dyn Fn(&$crate::Sample)))
    }};
}
