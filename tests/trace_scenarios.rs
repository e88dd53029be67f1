//! End-to-end scenarios against the public `trace_scope!`/`trace_point!`
//! surface. The aggregator and location registry are process-wide
//! singletons, so every test here serializes on `GUARD` and clears the tree
//! before asserting — otherwise parallel test threads would observe each
//! other's nodes.

use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use scopetrace::{trace_point, trace_scope, DEBUG, INFO};

static GUARD: Mutex<()> = Mutex::new(());

fn this_threads_table() -> scopetrace::RecordTable {
    let report = scopetrace::record_table();
    report
        .tables
        .into_iter()
        .find(|t| t.thread_id == thread::current().id())
        .expect("this thread traced at least once")
}

/// E1 — a single scope with three sequential trace points. The scope's own
/// (unlabeled) node absorbs the first interval; each subsequent trace site's
/// node absorbs the interval up to the next trace point. Three sibling rows
/// at depth 0; the fourth ("step3"'s) sibling is created but never closed and
/// so emits no row.
#[test]
fn single_scope_three_trace_points() {
    let _guard = GUARD.lock().unwrap();
    scopetrace::clear();

    {
        let _scope = trace_scope!(INFO);
        thread::sleep(Duration::from_millis(30));
        trace_point!(_scope, "step1");
        thread::sleep(Duration::from_millis(5));
        trace_point!(_scope, "step2");
        thread::sleep(Duration::from_millis(5));
        trace_point!(_scope, "step3");
    }

    let table = this_threads_table();
    assert_eq!(table.records.len(), 3);
    assert!(table.records.iter().all(|r| r.count == 1 && r.depth == 0));
    let total: Duration = table.records.iter().map(|r| r.time_interval).sum();
    assert_eq!(total, table.root_interval);
    assert!(total >= Duration::from_millis(35));
}

/// A scope that is entered but never directly closed against (no trace point
/// fires while it is the current node) contributes no record of its own —
/// its child surfaces one depth shallower than it otherwise would.
#[test]
fn scope_never_traced_into_is_a_transparent_prefix() {
    let _guard = GUARD.lock().unwrap();
    scopetrace::clear();

    {
        let _outer = trace_scope!(INFO);
        let _inner = trace_scope!(INFO);
        trace_point!(_inner, "leaf");
    }

    let table = this_threads_table();
    assert_eq!(table.records.len(), 1);
    assert_eq!(table.records[0].depth, 0);
}

/// E2, taken literally: the outer `SCOPE` is entered exactly once for the
/// whole loop, while `TRACE "outer"` sits at that same outer level but fires
/// once per iteration. That is exactly the `SCOPE for { TRACE }` misuse
/// shape the scope/trace count invariant exists to catch (the outer scope's
/// generation is frozen at 1 the moment it is entered, while "outer"'s own
/// generation climbs past it on the loop's second iteration) — so, run
/// literally, E2 must panic rather than produce the aggregated report its
/// prose describes.
#[test]
fn literal_e2_trace_outside_inner_scope_but_inside_loop_panics() {
    let _guard = GUARD.lock().unwrap();
    scopetrace::clear();

    let result = std::panic::catch_unwind(|| {
        let _outer = trace_scope!(INFO);
        for _ in 0..10 {
            {
                let _inner = trace_scope!(INFO);
                trace_point!(_inner, "a");
                trace_point!(_inner, "b");
            }
            trace_point!(_outer, "outer");
        }
    });

    assert!(result.is_err(), "TRACE \"outer\" firing once per iteration against a once-entered SCOPE must panic");
    let message = result
        .unwrap_err()
        .downcast_ref::<String>()
        .cloned()
        .unwrap_or_default();
    assert!(message.contains("TRACE_SCOPE count 1 < TRACE count 2"), "got: {message}");
}

/// The same shape, corrected: the outer scope's trailing `TRACE` moves
/// outside the loop so it fires exactly once, matching its once-entered
/// `SCOPE`. Repeated visits to the inner scope then aggregate cleanly onto
/// two depth-1 rows (the inner scope's own node and "a"'s node) instead of
/// minting a new subtree per iteration, plus the outer scope's own row and
/// its "other" residual.
#[test]
fn repeated_inner_scope_aggregates_across_iterations_when_outer_trace_is_outside_the_loop() {
    let _guard = GUARD.lock().unwrap();
    scopetrace::clear();

    {
        let _outer = trace_scope!(INFO);
        for _ in 0..10 {
            let _inner = trace_scope!(INFO);
            thread::sleep(Duration::from_millis(1));
            trace_point!(_inner, "a");
            thread::sleep(Duration::from_millis(1));
            trace_point!(_inner, "b");
        }
        trace_point!(_outer, "after_loop");
    }

    let table = this_threads_table();
    assert_eq!(table.records.len(), 4);

    let tens: Vec<_> = table.records.iter().filter(|r| r.count == 10).collect();
    assert_eq!(tens.len(), 2, "expected the inner scope's own node and \"a\"'s node to each close 10 times");
    assert!(tens.iter().any(|r| r.location.as_ref().map(|l| l.label_str().starts_with("a (")).unwrap_or(false)));

    let outer_row = table.records.iter().find(|r| r.depth == 0).expect("outer scope's own row");
    assert_eq!(outer_row.count, 1);
    let other_row = table.records.iter().find(|r| r.location.is_none()).expect("other residual for the outer scope");
    assert_eq!(other_row.depth, 1);
}

/// Branch-by-branch inside a loop: `SCOPE_X`/`SCOPE_Y` are distinct lexical
/// sites, so their own nodes stay separate siblings with independent counts
/// even though both close against the same parent scope-per-iteration node.
#[test]
fn branching_inside_a_loop_keeps_siblings_distinct() {
    let _guard = GUARD.lock().unwrap();
    scopetrace::clear();

    for i in 0..9 {
        if i % 3 == 0 {
            let _x = trace_scope!(INFO);
            trace_point!(_x, "x");
        } else {
            let _y = trace_scope!(INFO);
            trace_point!(_y, "y");
        }
    }

    let table = this_threads_table();
    assert_eq!(table.records.len(), 2, "branch x and branch y each keep their own node");
    let mut counts: Vec<_> = table.records.iter().map(|r| r.count).collect();
    counts.sort_unstable();
    assert_eq!(counts, vec![3, 6]);
    assert!(table.records.iter().all(|r| r.depth == 0));
}

/// E4 — `TRACE` firing more times than its enclosing `TRACE_SCOPE` has been
/// (re-)entered is the classic `SCOPE for { TRACE }` misuse and must panic
/// with the documented diagnostic on the call that first exceeds the count.
#[test]
fn scope_outside_loop_with_trace_inside_panics_on_second_iteration() {
    let _guard = GUARD.lock().unwrap();
    scopetrace::clear();

    let result = std::panic::catch_unwind(|| {
        let _scope = trace_scope!(DEBUG);
        for _ in 0..2 {
            trace_point!(_scope, "s");
        }
    });

    assert!(result.is_err());
    let message = result.unwrap_err();
    let message = message
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| message.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_default();
    assert!(message.contains("TRACE_SCOPE count 1 < TRACE count 2"), "got: {message}");
}

/// E5 — N threads each running the same pattern concurrently produce N
/// independent per-thread sub-tables; no record migrates across threads.
#[test]
fn cross_thread_tracing_stays_isolated() {
    let _guard = GUARD.lock().unwrap();
    scopetrace::clear();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            thread::spawn(|| {
                let _scope = trace_scope!(INFO);
                for _ in 0..3 {
                    let _inner = trace_scope!(INFO);
                    trace_point!(_inner, "work");
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let report = scopetrace::record_table();
    let spawned: Vec<_> = report
        .tables
        .iter()
        .filter(|t| !t.records.is_empty() && t.thread_id != thread::current().id())
        .collect();
    assert_eq!(spawned.len(), 8);
    for table in spawned {
        let total_count: u64 = table.records.iter().map(|r| r.count).sum();
        assert_eq!(total_count, 3);
    }
}

/// E6 — running the same scenario, clearing, then running it again yields
/// the same structural report (record count, depths, counts), and no new
/// `anonymous_id`s are minted for sites re-traced after the clear.
#[test]
fn clear_then_rerun_reproduces_the_same_structure() {
    let _guard = GUARD.lock().unwrap();
    scopetrace::clear();

    fn run() {
        let _scope = trace_scope!(INFO);
        trace_point!(_scope, "step1");
        trace_point!(_scope, "step2");
    }

    run();
    let first = this_threads_table();
    let first_ids: Vec<u32> = first.records.iter().filter_map(|r| r.location.as_ref().map(|l| l.anonymous_id())).collect();

    scopetrace::clear();
    let cleared = this_threads_table();
    assert!(cleared.records.is_empty());

    run();
    let second = this_threads_table();
    let second_ids: Vec<u32> = second.records.iter().filter_map(|r| r.location.as_ref().map(|l| l.anonymous_id())).collect();

    assert_eq!(first.records.len(), second.records.len());
    for (a, b) in first.records.iter().zip(second.records.iter()) {
        assert_eq!(a.count, b.count);
        assert_eq!(a.depth, b.depth);
    }
    assert_eq!(first_ids, second_ids);
}
