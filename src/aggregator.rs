//! Parallel aggregator: one lazily-created [`TraceStore`] per thread.
//!
//! First use from a thread allocates a store behind the aggregator's mutex
//! and binds a thread-local handle to it; every later call on that thread
//! goes straight through the thread-local with no aggregator-wide lock.
//! Report generation and `clear_all()` walk every store under the
//! aggregator's mutex, which only ever excludes store *creation* — not
//! ordinary tracing on already-bound threads.

use std::cell::RefCell;
use std::sync::{Arc, Mutex, OnceLock};

use crate::report::ParallelRecordTable;
use crate::store::TraceStore;

#[derive(Default)]
struct Aggregator {
    stores: Mutex<Vec<Arc<Mutex<TraceStore>>>>,
}

fn aggregator() -> &'static Aggregator {
    static AGGREGATOR: OnceLock<Aggregator> = OnceLock::new();
    AGGREGATOR.get_or_init(Aggregator::default)
}

thread_local! {
    static CURRENT_STORE: RefCell<Option<Arc<Mutex<TraceStore>>>> = const { RefCell::new(None) };
}

fn current_store() -> Arc<Mutex<TraceStore>> {
    CURRENT_STORE.with(|cell| {
        let mut slot = cell.borrow_mut();
        if let Some(store) = slot.as_ref() {
            return store.clone();
        }
        let thread_id = std::thread::current().id();
        tracing::debug!(?thread_id, "allocating a new trace store for this thread");
        let store = Arc::new(Mutex::new(TraceStore::new(thread_id)));
        lock_stores().push(store.clone());
        *slot = Some(store.clone());
        store
    })
}

fn lock_stores() -> std::sync::MutexGuard<'static, Vec<Arc<Mutex<TraceStore>>>> {
    aggregator().stores.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A scope/trace count mismatch (or a user-supplied sample handler) can
/// panic while a store's mutex is held; recovering the poisoned lock instead
/// of propagating it keeps the tracer usable for whatever code runs next,
/// matching a fatal-but-recoverable error rather than bricking the process.
fn lock_store(store: &Mutex<TraceStore>) -> std::sync::MutexGuard<'_, TraceStore> {
    store.lock().unwrap_or_else(|poisoned| {
        tracing::warn!("recovering a poisoned trace store after a panic on another call");
        poisoned.into_inner()
    })
}

/// Run `f` against the current thread's store, creating it on first use.
pub(crate) fn with_current_store<R>(f: impl FnOnce(&mut TraceStore) -> R) -> R {
    let store = current_store();
    let mut guard = lock_store(&store);
    f(&mut guard)
}

/// Build the combined report across every thread that has traced so far.
pub fn record_table() -> ParallelRecordTable {
    let stores = lock_stores();
    let tables = stores.iter().map(|store| lock_store(store).record_table()).collect();
    ParallelRecordTable { tables }
}

/// Reset every thread's call tree to its initial one-root state. Safe only
/// when no tracer is concurrently mid-call on another thread — `clear()`
/// does not itself quiesce tracers, it only serializes against store
/// *creation*, matching the aggregator's mutex discipline.
pub fn clear() {
    let stores = lock_stores();
    for store in stores.iter() {
        lock_store(store).clear();
    }
}
