//! Multi-day track stitching.
//!
//! Tables loaded for a window are joined into one table before events are
//! extracted, so a storm that crosses an SPC-date boundary is seen as a
//! single track.

use std::borrow::Borrow;

use storm_common::{StormObject, StormTable};
use tracing::debug;

/// Concatenate tables in order, aligning every table to the union of all
/// columns (first-seen order).
///
/// Columns missing from a table are null-filled; nothing is dropped and
/// schema differences never fail. Row order within each table is kept.
pub fn concat_tables<T: Borrow<StormTable>>(tables: &[T]) -> StormTable {
    concat_where(tables, |_| true)
}

/// Stitch a window's tables (lowest date index first) and drop immature rows.
///
/// Rows with `age_seconds >= min_age_seconds` are kept. The result is not
/// re-sorted by time. Only kept rows are copied out of the input tables.
pub fn stitch<T: Borrow<StormTable>>(tables: &[T], min_age_seconds: i64) -> StormTable {
    let stitched = concat_where(tables, |row| row.age_seconds >= min_age_seconds);

    debug!(
        rows = tables.iter().map(|t| t.borrow().len()).sum::<usize>(),
        mature_rows = stitched.len(),
        min_age_seconds,
        "Stitched window tables"
    );
    stitched
}

fn concat_where<T, F>(tables: &[T], keep: F) -> StormTable
where
    T: Borrow<StormTable>,
    F: Fn(&StormObject) -> bool,
{
    let mut union: Vec<String> = Vec::new();
    for table in tables {
        for column in table.borrow().columns() {
            if !union.contains(column) {
                union.push(column.clone());
            }
        }
    }

    let rows: Vec<StormObject> = tables
        .iter()
        .flat_map(|table| table.borrow().rows())
        .filter(|&row| keep(row))
        .cloned()
        .collect();
    StormTable::with_columns(union, rows)
}
