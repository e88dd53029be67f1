//! Renders a [`RecordTable`]/[`ParallelRecordTable`] as aligned text.
//!
//! The engine only produces rows of plain strings plus per-column alignment;
//! turning that into aligned text is an external concern, fulfilled here with
//! [`comfy_table`] rather than hand-rolled column-width arithmetic.

use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};

use crate::report::{ParallelRecordTable, Record, RecordTable};

const HEADER: [&str; 8] = [
    "label", "count", "time (s)", "time (%)", "rss (GiB)", "hwm (GiB)", "swap (GiB)", "location",
];

/// Render one thread's flattened report.
pub fn render_table(table: &RecordTable) -> String {
    let mut out = String::new();
    render_table_into(table, &mut out);
    out
}

/// Render every thread's report, each preceded by a `Trace summary of thread
/// <id>` header, mirroring how a single-threaded report is introduced.
pub fn render_parallel_table(tables: &ParallelRecordTable) -> String {
    let mut out = String::new();
    for table in &tables.tables {
        out.push_str(&format!("Trace summary of {:?}\n\n", table.thread_id));
        render_table_into(table, &mut out);
        out.push('\n');
    }
    out
}

fn render_table_into(table: &RecordTable, out: &mut String) {
    let mut comfy = Table::new();
    comfy
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(HEADER.iter().map(|h| Cell::new(h).set_alignment(CellAlignment::Center)));

    for record in &table.records {
        comfy.add_row(row_cells(record, table.root_interval));
    }

    out.push_str(&comfy.to_string());
    out.push('\n');
}

fn row_cells(record: &Record, root_interval: std::time::Duration) -> Vec<Cell> {
    let indent = "  ".repeat(record.depth);
    let label = match &record.location {
        Some(location) => format!("{indent}{}", location.label_str()),
        None => format!("{indent}other"),
    };
    let location_str = record.location.as_ref().map(|l| l.location_str()).unwrap_or_default();

    let percent = if root_interval.is_zero() {
        String::new()
    } else {
        format!(
            "{:.2}",
            100.0 * record.time_interval.as_secs_f64() / root_interval.as_secs_f64()
        )
    };

    vec![
        Cell::new(label).set_alignment(CellAlignment::Left),
        Cell::new(record.count).set_alignment(CellAlignment::Right),
        Cell::new(format!("{:.3}", record.time_interval.as_secs_f64())).set_alignment(CellAlignment::Right),
        Cell::new(percent).set_alignment(CellAlignment::Right),
        Cell::new(format!("{:.3}", record.memory.rss_gib())).set_alignment(CellAlignment::Right),
        Cell::new(format!("{:.3}", record.memory.hwm_gib())).set_alignment(CellAlignment::Right),
        Cell::new(format!("{:.3}", record.memory.swap_gib())).set_alignment(CellAlignment::Right),
        Cell::new(location_str).set_alignment(CellAlignment::Left),
    ]
}
