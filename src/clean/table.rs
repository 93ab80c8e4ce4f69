use crate::grid::Cell;

/// One normalized long-format table: a fixed ordered set of named columns and
/// the data rows under them. The first two columns are always the canonical
/// "industry" and "fiscal_year".
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl NormalizedTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
