pub mod load;

/// One spreadsheet cell after loading: nullable, text or number, nothing else.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    /// Blank means "carries no data": empty, or text that trims to nothing.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }

    /// Trimmed string form, used for header labels and token matching.
    /// Whole numbers print without the trailing `.0` a float would carry.
    pub fn display(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.trim().to_string(),
            Cell::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
        }
    }
}

/// A raw rectangular grid of cells, exactly as one sheet was exported.
/// Never mutated in place: every transformation produces a new grid.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawGrid {
    rows: Vec<Vec<Cell>>,
}

impl RawGrid {
    /// Builds a grid, padding short rows with empty cells so the rectangular
    /// invariant holds from the start.
    pub fn from_rows(mut rows: Vec<Vec<Cell>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, Cell::Empty);
        }
        RawGrid { rows }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Drops fully blank rows and fully blank columns, preserving the relative
    /// order of what remains. Profiles assume these trimmed coordinates, so
    /// this must run before any positional rule.
    pub fn trim(&self) -> RawGrid {
        let kept_rows: Vec<&Vec<Cell>> = self
            .rows
            .iter()
            .filter(|row| row.iter().any(|c| !c.is_blank()))
            .collect();

        let width = self.width();
        let kept_cols: Vec<usize> = (0..width)
            .filter(|&c| kept_rows.iter().any(|row| !row[c].is_blank()))
            .collect();

        let rows = kept_rows
            .into_iter()
            .map(|row| kept_cols.iter().map(|&c| row[c].clone()).collect())
            .collect();
        RawGrid { rows }
    }
}
