use serde::{Deserialize, Serialize};
use std::fmt;

/// The three statistical series this engine normalizes. A routing key threaded
/// through the pipeline, never mutable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetFamily {
    LaborHeadcount,
    RdExpense,
    PatentCount,
}

impl DatasetFamily {
    pub const ALL: [DatasetFamily; 3] = [
        DatasetFamily::LaborHeadcount,
        DatasetFamily::RdExpense,
        DatasetFamily::PatentCount,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetFamily::LaborHeadcount => "labor_headcount",
            DatasetFamily::RdExpense => "rd_expense",
            DatasetFamily::PatentCount => "patent_count",
        }
    }

    /// Substring of the published survey-table title that identifies this
    /// family in a downloaded file name.
    pub fn table_marker(&self) -> &'static str {
        match self {
            DatasetFamily::LaborHeadcount => "売上高経常利益率別常時従業者数",
            DatasetFamily::RdExpense => "研究開発",
            DatasetFamily::PatentCount => "特許",
        }
    }

    pub fn from_file_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| name.contains(f.table_marker()))
    }
}

impl fmt::Display for DatasetFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
