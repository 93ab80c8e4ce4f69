use anyhow::{Context, Result};
use std::{fs, path::PathBuf};

use crate::clean::table::NormalizedTable;
use crate::family::DatasetFamily;

/// Persistence collaborator seam: receives one normalized table per
/// (family, year) and is free to store it however it likes.
pub trait TableSink {
    fn store(&mut self, family: DatasetFamily, year: u16, table: &NormalizedTable) -> Result<()>;
}

/// Reference sink writing `<out_dir>/<family>/<year>.csv`.
pub struct CsvSink {
    out_dir: PathBuf,
}

impl CsvSink {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        CsvSink {
            out_dir: out_dir.into(),
        }
    }
}

impl TableSink for CsvSink {
    fn store(&mut self, family: DatasetFamily, year: u16, table: &NormalizedTable) -> Result<()> {
        let dir = self.out_dir.join(family.as_str());
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating output directory {}", dir.display()))?;

        let path = dir.join(format!("{year}.csv"));
        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("creating {}", path.display()))?;
        writer.write_record(&table.columns)?;
        for row in &table.rows {
            writer.write_record(row.iter().map(|cell| cell.display()))?;
        }
        writer
            .flush()
            .with_context(|| format!("flushing {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Cell;
    use tempfile::tempdir;

    #[test]
    fn csv_sink_writes_one_file_per_family_year() {
        let dir = tempdir().unwrap();
        let table = NormalizedTable {
            columns: vec!["industry".into(), "fiscal_year".into(), "計".into()],
            rows: vec![
                vec![
                    Cell::Text("製造業".into()),
                    Cell::Text("2013年度".into()),
                    Cell::Number(42.0),
                ],
                vec![
                    Cell::Text("製造業".into()),
                    Cell::Text("2014年度".into()),
                    Cell::Empty,
                ],
            ],
        };

        let mut sink = CsvSink::new(dir.path());
        sink.store(DatasetFamily::PatentCount, 2013, &table).unwrap();

        let written =
            fs::read_to_string(dir.path().join("patent_count").join("2013.csv")).unwrap();
        let mut lines = written.lines();
        assert_eq!(lines.next(), Some("industry,fiscal_year,計"));
        assert_eq!(lines.next(), Some("製造業,2013年度,42"));
        assert_eq!(lines.next(), Some("製造業,2014年度,"));
    }
}
