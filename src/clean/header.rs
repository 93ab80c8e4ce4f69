use std::collections::{BTreeMap, HashSet};
use tracing::warn;

use crate::grid::{Cell, RawGrid};

/// Rows scanned for a span-rule anchor. Merged headers in this survey never
/// sit below the first six physical rows.
pub const SPAN_SCAN_ROWS: usize = 6;

/// Reconstructs merged-cell semantics the export flattened away: a merged
/// header cell arrives as one filled cell followed by blanks, so each rule
/// key's label is copied rightward across its configured span. The anchor is
/// the first matching cell in row-then-column order within the scan region;
/// a second match is flagged, not silently resolved. Propagation never
/// overwrites a non-blank cell and stops at the grid edge.
pub fn propagate_spans(grid: &RawGrid, span_rules: &BTreeMap<String, usize>) -> RawGrid {
    if span_rules.is_empty() {
        return grid.clone();
    }

    let mut rows: Vec<Vec<Cell>> = grid.rows().to_vec();
    let scan_rows = grid.height().min(SPAN_SCAN_ROWS);

    for (label, span) in span_rules {
        let mut anchor: Option<(usize, usize)> = None;
        for r in 0..scan_rows {
            for c in 0..grid.width() {
                if rows[r][c].display() == *label {
                    if anchor.is_some() {
                        warn!(label = %label, row = r, column = c, "span label appears more than once in the header block; keeping first");
                    } else {
                        anchor = Some((r, c));
                    }
                }
            }
        }

        if let Some((r, c)) = anchor {
            let end = (c + span).min(grid.width() - 1);
            for cc in c + 1..=end {
                if rows[r][cc].is_blank() {
                    rows[r][cc] = Cell::Text(label.clone());
                }
            }
        }
    }

    RawGrid::from_rows(rows)
}

/// Collapses the configured header rows into one label per column: non-empty
/// trimmed cell texts joined with `_` in row order, or the stringified column
/// position when every cell is empty.
pub fn flatten(grid: &RawGrid, header_rows: &[usize]) -> Vec<String> {
    (0..grid.width())
        .map(|c| {
            let parts: Vec<String> = header_rows
                .iter()
                .filter_map(|&r| grid.rows().get(r))
                .map(|row| row[c].display())
                .filter(|s| !s.is_empty())
                .collect();
            if parts.is_empty() {
                c.to_string()
            } else {
                parts.join("_")
            }
        })
        .collect()
}

/// No two output columns may share a name: a repeated label gets an `_<n>`
/// suffix (n counting occurrences from 2) in left-to-right order.
pub fn dedupe_labels(labels: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    labels
        .into_iter()
        .map(|label| {
            if seen.insert(label.clone()) {
                counts.insert(label.clone(), 1);
                return label;
            }
            let count = counts.entry(label.clone()).or_insert(1);
            loop {
                *count += 1;
                let candidate = format!("{}_{}", label, count);
                if seen.insert(candidate.clone()) {
                    return candidate;
                }
            }
        })
        .collect()
}
