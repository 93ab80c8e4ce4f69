use std::collections::BTreeSet;

use super::table::NormalizedTable;
use crate::grid::Cell;

/// Rewrites every data cell whose trimmed value is a configured "no data"
/// token to null. Runs after all structural reconciliation, so it only ever
/// sees true data cells, never header residue.
pub fn normalize_sentinels(table: NormalizedTable, tokens: &BTreeSet<String>) -> NormalizedTable {
    let rows = table
        .rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|cell| match &cell {
                    Cell::Text(s) if tokens.contains(s.trim()) => Cell::Empty,
                    _ => cell,
                })
                .collect()
        })
        .collect();
    NormalizedTable {
        columns: table.columns,
        rows,
    }
}
