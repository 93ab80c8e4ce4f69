use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, error, info};

use super::{header, reconcile, sentinel, table::NormalizedTable};
use crate::error::NormalizeError;
use crate::family::DatasetFamily;
use crate::grid::{load::load_workbook, Cell, RawGrid};
use crate::intake::SourceFile;
use crate::layout::profile::LayoutProfile;
use crate::layout::registry::LayoutRegistry;

/// Accumulated output of a run: one table per (family, year).
pub type FamilyTables = BTreeMap<DatasetFamily, BTreeMap<u16, NormalizedTable>>;

/// Normalizes every sheet of one workbook under the profile resolved for
/// (family, year). A malformed sheet is logged and skipped, sibling sheets
/// continue; an unreadable file or a profile gap fails the whole file.
pub fn normalize_file(
    registry: &LayoutRegistry,
    family: DatasetFamily,
    path: &Path,
    year: u16,
) -> Result<BTreeMap<String, NormalizedTable>, NormalizeError> {
    Ok(normalize_file_ordered(registry, family, path, year)?
        .into_iter()
        .collect())
}

/// Like [`normalize_file`], but keeps the workbook's own sheet order. The
/// aggregation folds in this order, so "last sheet wins" means last in the
/// workbook, not last alphabetically.
pub fn normalize_file_ordered(
    registry: &LayoutRegistry,
    family: DatasetFamily,
    path: &Path,
    year: u16,
) -> Result<Vec<(String, NormalizedTable)>, NormalizeError> {
    let profile = registry.resolve(family, year)?;
    let sheets = load_workbook(path)?;
    Ok(normalize_sheets(profile, family, path, year, sheets))
}

/// The per-sheet loop, separated from file I/O so grids can be fed directly.
/// Output preserves the input sheet order.
pub fn normalize_sheets(
    profile: &LayoutProfile,
    family: DatasetFamily,
    path: &Path,
    year: u16,
    sheets: Vec<(String, RawGrid)>,
) -> Vec<(String, NormalizedTable)> {
    let mut out = Vec::new();
    for (sheet, grid) in sheets {
        match normalize_grid(profile, &grid) {
            Ok(table) => {
                info!(
                    file = %path.display(),
                    sheet = %sheet,
                    %family,
                    year,
                    rows = table.len(),
                    "sheet normalized"
                );
                out.push((sheet, table));
            }
            Err(reason) => {
                let err = NormalizeError::MalformedSheet {
                    path: path.to_path_buf(),
                    sheet,
                    family,
                    year,
                    reason,
                };
                error!(%err, "sheet skipped");
            }
        }
    }
    out
}

/// Normalizes one raw grid: trim, validate shape, propagate spans, flatten
/// the header, slice the data region, reconcile rows, null out sentinels.
/// Errors are shape mismatches that the caller wraps into MalformedSheet.
pub fn normalize_grid(profile: &LayoutProfile, raw: &RawGrid) -> Result<NormalizedTable, String> {
    let grid = raw.trim();

    let max_header = profile.header_rows.iter().copied().max().unwrap_or(0);
    if grid.height() <= max_header {
        return Err(format!(
            "{} rows, but the header block needs row {}",
            grid.height(),
            max_header
        ));
    }
    if grid.height() <= profile.data_start_row {
        return Err(format!("no data rows past row {}", profile.data_start_row));
    }

    let grid = header::propagate_spans(&grid, &profile.span_rules);
    let mut labels = header::flatten(&grid, &profile.header_rows);
    let mut rows: Vec<Vec<Cell>> = grid.rows()[profile.data_start_row..].to_vec();

    // Layouts that fold the category into the year column get an empty
    // category column synthesized up front; relocation populates it.
    if let Some(reloc) = &profile.category_relocation {
        if reloc.synthesize_category_column {
            labels.insert(reloc.category_column, String::new());
            for row in &mut rows {
                row.insert(reloc.category_column, Cell::Empty);
            }
        }
    }

    if let Some(max_pos) = profile.max_column_reference() {
        if max_pos >= labels.len() {
            return Err(format!(
                "profile references column {} but the sheet has {}",
                max_pos,
                labels.len()
            ));
        }
    }

    for (&pos, name) in &profile.relabels {
        labels[pos] = name.clone();
    }
    let labels = header::dedupe_labels(labels);

    let (columns, rows) = reconcile::reconcile(labels, rows, profile)?;
    let table = NormalizedTable { columns, rows };
    Ok(sentinel::normalize_sentinels(table, &profile.sentinel_tokens))
}

/// Drives the whole run: every source file is normalized and folded into the
/// per-family, per-year collection. Failures skip their file and the run
/// continues. When two sheets or files land on the same (family, year) the
/// one processed later wins; that is policy, not an error.
pub fn collect_tables(registry: &LayoutRegistry, sources: &[SourceFile]) -> FamilyTables {
    let mut out: FamilyTables = BTreeMap::new();
    for src in sources {
        match normalize_file_ordered(registry, src.family, &src.path, src.year) {
            Ok(sheets) => fold_tables(&mut out, src, sheets),
            Err(err) => error!(%err, "file skipped"),
        }
    }
    out
}

/// Folds one workbook's normalized sheets, in workbook order, into the
/// per-family, per-year collection.
fn fold_tables(out: &mut FamilyTables, src: &SourceFile, sheets: Vec<(String, NormalizedTable)>) {
    let years = out.entry(src.family).or_default();
    for (sheet, table) in sheets {
        if years.insert(src.year, table).is_some() {
            debug!(
                family = %src.family,
                year = src.year,
                sheet = %sheet,
                "replaced earlier table for this year"
            );
        }
    }
}
