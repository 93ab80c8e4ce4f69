use std::path::PathBuf;
use thiserror::Error;

use crate::family::DatasetFamily;

/// Failure taxonomy for the normalization engine. Each variant is resolved at
/// the narrowest scope that makes sense: sheet errors skip the sheet, file
/// errors skip the file, and nothing aborts the overall run.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// Neither the legacy nor the modern spreadsheet codec could open the file.
    #[error("unreadable spreadsheet {}: {reason}", path.display())]
    UnreadableFile { path: PathBuf, reason: String },

    /// No layout rule covers this (family, year). A configuration gap, not a
    /// data problem: fix it by adding a profile.
    #[error("no layout profile for {family} in year {year}")]
    ProfileNotFound { family: DatasetFamily, year: u16 },

    /// The grid shape contradicts the resolved profile's assumptions.
    #[error("malformed sheet `{sheet}` in {} ({family}, {year}): {reason}", path.display())]
    MalformedSheet {
        path: PathBuf,
        sheet: String,
        family: DatasetFamily,
        year: u16,
        reason: String,
    },

    /// The file name matches neither year-encoding convention.
    #[error("no year encoded in file name `{name}`")]
    YearExtraction { name: String },
}
