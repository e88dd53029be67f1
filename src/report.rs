//! Flattens a per-thread call tree into a linear, depth-first [`RecordTable`].

use std::thread::ThreadId;
use std::time::Duration;

use crate::location::Location;
use crate::memory::Memory;
use crate::store::{Node, TraceStore};

/// One row of a flattened report: either a real annotation site, or a
/// synthesized "other" residual (`location == None`).
#[derive(Debug, Clone)]
pub struct Record {
    pub location: Option<Location>,
    pub count: u64,
    pub time_interval: Duration,
    pub memory: Memory,
    pub depth: usize,
}

impl Record {
    fn other(time_interval: Duration, depth: usize) -> Self {
        Record {
            location: None,
            count: 1,
            time_interval,
            memory: Memory::default(),
            depth,
        }
    }
}

/// The flattened report for a single thread's call tree.
#[derive(Debug, Clone)]
pub struct RecordTable {
    pub thread_id: ThreadId,
    pub root_interval: Duration,
    pub entry_interval: Duration,
    pub records: Vec<Record>,
}

/// The concatenation of every thread's `RecordTable`, as produced by the
/// parallel aggregator.
#[derive(Debug, Clone)]
pub struct ParallelRecordTable {
    pub tables: Vec<RecordTable>,
}

pub(crate) fn build(store: &TraceStore) -> RecordTable {
    let mut records = Vec::new();
    let mut root_interval = Duration::ZERO;
    for &child in &store.nodes[0].children {
        root_interval += visit(store, child, 0, &mut records);
    }
    RecordTable {
        thread_id: store.thread_id(),
        root_interval,
        entry_interval: root_interval,
        records,
    }
}

/// Depth-first visit. Returns the node's own aggregated interval so the
/// caller can compute its "other" residual — a placeholder (never directly
/// traced) instead returns the sum of *its* descendants, since it has no
/// interval of its own to attribute.
fn visit(store: &TraceStore, idx: usize, depth: usize, out: &mut Vec<Record>) -> Duration {
    let node = &store.nodes[idx];
    if node.count == 0 {
        let mut total = Duration::ZERO;
        for &child in &node.children {
            total += visit(store, child, depth, out);
        }
        return total;
    }

    out.push(to_record(node, depth));

    if !node.children.is_empty() {
        let mut child_total = Duration::ZERO;
        for &child in &node.children {
            child_total += visit(store, child, depth + 1, out);
        }
        let other = node.time_interval.checked_sub(child_total).unwrap_or(Duration::ZERO);
        out.push(Record::other(other, depth + 1));
    }

    node.time_interval
}

fn to_record(node: &Node, depth: usize) -> Record {
    Record {
        location: Some(crate::location::registry().lookup(node.location_id)),
        count: node.count,
        time_interval: node.time_interval,
        memory: node.memory,
        depth,
    }
}
