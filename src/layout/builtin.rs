//! Compiled-in layout profiles for the three survey families. One rule per
//! layout era; adding a newly published vintage is a data change here (or in
//! a JSON override), never a pipeline change.

use once_cell::sync::Lazy;
use std::collections::{BTreeMap, BTreeSet};

use super::profile::{
    default_sentinels, CategoryRelocation, LayoutProfile, RowFilter, YearPredicate, FISCAL_YEAR,
    INDUSTRY,
};
use super::registry::{LayoutRegistry, ProfileRule, ProfileSet};
use crate::family::DatasetFamily;

/// First survey year with published workbooks.
pub const FIRST_YEAR: u16 = 1992;
/// Most recent vintage the built-in rules cover.
pub const LAST_YEAR: u16 = 2023;

pub static REGISTRY: Lazy<LayoutRegistry> = Lazy::new(|| {
    let mut registry = LayoutRegistry::new();
    registry.insert(labor_headcount());
    registry.insert(rd_expense());
    registry.insert(patent_count());
    registry
});

fn relabels(pairs: &[(usize, &str)]) -> BTreeMap<usize, String> {
    pairs.iter().map(|&(pos, name)| (pos, name.to_string())).collect()
}

fn spans(pairs: &[(&str, usize)]) -> BTreeMap<String, usize> {
    pairs.iter().map(|&(label, n)| (label.to_string(), n)).collect()
}

fn years(list: &[u16]) -> YearPredicate {
    YearPredicate::Years(list.iter().copied().collect())
}

/// Classic pre-redesign shape: industry in column 0, fiscal year in column 1,
/// category label printed once per group and forward-filled.
fn classic(header_rows: Vec<usize>, data_start_row: usize, span_rules: BTreeMap<String, usize>) -> LayoutProfile {
    LayoutProfile {
        header_rows,
        data_start_row,
        relabels: relabels(&[(0, INDUSTRY), (1, FISCAL_YEAR)]),
        drop_columns: BTreeSet::new(),
        span_rules,
        forward_fill_column: Some(0),
        category_relocation: None,
        row_filter: RowFilter::RequireFiscalYear,
        sentinel_tokens: default_sentinels(),
    }
}

/// Post-2019 redesign: leading code/spacer columns, industry and fiscal year
/// relocated to columns 1 and 3, no forward fill needed.
fn redesigned() -> LayoutProfile {
    LayoutProfile {
        header_rows: vec![0, 1, 2],
        data_start_row: 5,
        relabels: relabels(&[(1, INDUSTRY), (3, FISCAL_YEAR)]),
        drop_columns: [0, 2].into_iter().collect(),
        span_rules: BTreeMap::new(),
        forward_fill_column: None,
        category_relocation: None,
        row_filter: RowFilter::RequireFiscalYear,
        sentinel_tokens: default_sentinels(),
    }
}

fn labor_spans() -> BTreeMap<String, usize> {
    spans(&[("売上高経常利益率", 8)])
}

fn labor_headcount() -> ProfileSet {
    // The 2004/05 workbooks fold the industry label into the fiscal-year
    // column; a category column is synthesized and populated by relocation.
    let folded = LayoutProfile {
        header_rows: vec![3, 4, 5, 6],
        data_start_row: 7,
        relabels: relabels(&[(0, INDUSTRY), (1, FISCAL_YEAR)]),
        drop_columns: BTreeSet::new(),
        span_rules: labor_spans(),
        forward_fill_column: Some(0),
        category_relocation: Some(CategoryRelocation {
            marker_column: 1,
            category_column: 0,
            marker_token: "年度".to_string(),
            synthesize_category_column: true,
        }),
        row_filter: RowFilter::RequireFiscalYear,
        sentinel_tokens: default_sentinels(),
    };

    let mut with_spacer = classic(vec![4, 5, 6], 7, labor_spans());
    with_spacer.drop_columns = [2].into_iter().collect();

    let mut v2007 = classic(vec![3, 4, 5], 6, labor_spans());
    v2007.drop_columns = [2].into_iter().collect();

    ProfileSet {
        family: DatasetFamily::LaborHeadcount,
        rules: vec![
            ProfileRule { when: years(&[2004, 2005]), profile: folded },
            ProfileRule { when: YearPredicate::Year(2007), profile: v2007 },
            ProfileRule {
                when: years(&[2009, 2011, 2012, 2013]),
                profile: classic(vec![2, 3, 4], 5, labor_spans()),
            },
            ProfileRule { when: years(&[2003, 2006, 2008]), profile: with_spacer },
            ProfileRule { when: YearPredicate::AtLeast(2020), profile: redesigned() },
            ProfileRule {
                when: YearPredicate::Below(2020),
                profile: classic(vec![4, 5, 6], 7, labor_spans()),
            },
        ],
    }
}

fn rd_expense() -> ProfileSet {
    ProfileSet {
        family: DatasetFamily::RdExpense,
        rules: vec![
            ProfileRule { when: YearPredicate::AtLeast(2020), profile: redesigned() },
            ProfileRule {
                when: YearPredicate::Below(2020),
                profile: classic(vec![2, 3, 4], 5, spans(&[("研究開発費", 3)])),
            },
        ],
    }
}

fn patent_count() -> ProfileSet {
    ProfileSet {
        family: DatasetFamily::PatentCount,
        rules: vec![
            ProfileRule { when: YearPredicate::AtLeast(2020), profile: redesigned() },
            ProfileRule {
                when: YearPredicate::Below(2020),
                profile: classic(vec![2, 3, 4], 5, spans(&[("特許権", 2)])),
            },
        ],
    }
}
