use calamine::{open_workbook, Data, Range, Reader, Xls, Xlsx};
use std::io::{Read, Seek};
use std::path::Path;
use tracing::{debug, warn};

use super::{Cell, RawGrid};
use crate::error::NormalizeError;

/// Reads every sheet of one workbook into a raw grid, with no semantic
/// interpretation. The survey published `.xls` for most of its history, so
/// the legacy codec is tried first; the modern codec gets one retry before
/// the file is declared unreadable. A sheet that fails to read after the
/// workbook opened is logged and skipped, its siblings continue.
pub fn load_workbook(path: &Path) -> Result<Vec<(String, RawGrid)>, NormalizeError> {
    match open_workbook::<Xls<_>, _>(path) {
        Ok(mut wb) => Ok(read_sheets(&mut wb, path)),
        Err(xls_err) => {
            debug!(path = %path.display(), error = %xls_err, "legacy codec failed, retrying as xlsx");
            match open_workbook::<Xlsx<_>, _>(path) {
                Ok(mut wb) => Ok(read_sheets(&mut wb, path)),
                Err(xlsx_err) => Err(NormalizeError::UnreadableFile {
                    path: path.to_path_buf(),
                    reason: format!("xls: {xls_err}; xlsx: {xlsx_err}"),
                }),
            }
        }
    }
}

fn read_sheets<RS, R>(wb: &mut R, path: &Path) -> Vec<(String, RawGrid)>
where
    RS: Read + Seek,
    R: Reader<RS>,
    R::Error: std::fmt::Display,
{
    let names = wb.sheet_names().to_owned();
    let results = names.into_iter().map(|name| {
        let grid = wb
            .worksheet_range(&name)
            .map(|range| grid_from_range(&range))
            .map_err(|e| e.to_string());
        (name, grid)
    });
    keep_readable(path, results)
}

/// Sheet-level read failures are resolved at sheet scope: logged, dropped,
/// never fatal for the workbook.
fn keep_readable(
    path: &Path,
    sheets: impl IntoIterator<Item = (String, Result<RawGrid, String>)>,
) -> Vec<(String, RawGrid)> {
    let mut out = Vec::new();
    for (name, result) in sheets {
        match result {
            Ok(grid) => out.push((name, grid)),
            Err(reason) => warn!(
                path = %path.display(),
                sheet = %name,
                reason = %reason,
                "sheet unreadable; siblings continue"
            ),
        }
    }
    out
}

fn grid_from_range(range: &Range<Data>) -> RawGrid {
    let rows = range
        .rows()
        .map(|row| row.iter().map(cell_from_data).collect())
        .collect();
    RawGrid::from_rows(rows)
}

fn cell_from_data(value: &Data) -> Cell {
    match value {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        other => Cell::Text(other.to_string()),
    }
}
