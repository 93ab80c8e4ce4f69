use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, error};

use crate::error::NormalizeError;
use crate::family::DatasetFamily;
use crate::{YEAR_MAX, YEAR_MIN};

/// One workbook the fetcher left in the downloads directory, routed and
/// year-stamped, ready for the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub family: DatasetFamily,
    pub year: u16,
}

// Year-encoding conventions the published files use, in priority order:
// four digits immediately before the extension, then the `_<year>_<timestamp>`
// suffix the fetcher stamps on downloads.
static TRAILING_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4})\.[A-Za-z]+$").expect("pattern should parse"));
static SUFFIX_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_(\d{4})_\d+\.[A-Za-z]+$").expect("pattern should parse"));

/// Extracts the survey year from a file name; the first convention whose
/// captured digits form a plausible year wins.
pub fn extract_year(name: &str) -> Result<u16, NormalizeError> {
    for pattern in [&*TRAILING_YEAR, &*SUFFIX_YEAR] {
        if let Some(caps) = pattern.captures(name) {
            if let Ok(year) = caps[1].parse::<u16>() {
                if (YEAR_MIN..=YEAR_MAX).contains(&year) {
                    return Ok(year);
                }
            }
        }
    }
    Err(NormalizeError::YearExtraction {
        name: name.to_string(),
    })
}

/// Walks the downloads directory and builds the pipeline's work list. Files
/// without a family marker are ignored; files whose name encodes no year are
/// reported and skipped. The list is sorted by path so the last-write-wins
/// aggregation stays deterministic run to run.
pub fn scan_downloads(dir: &Path) -> Result<Vec<SourceFile>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("reading downloads directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .collect();
    paths.sort();

    let mut sources = Vec::new();
    for path in paths {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(family) = DatasetFamily::from_file_name(name) else {
            debug!(file = %name, "no survey-table marker; ignored");
            continue;
        };
        match extract_year(name) {
            Ok(year) => sources.push(SourceFile { path, family, year }),
            Err(err) => error!(%err, "file skipped"),
        }
    }
    Ok(sources)
}
