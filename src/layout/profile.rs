use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Canonical output column names, stable across every survey vintage.
pub const INDUSTRY: &str = "industry";
pub const FISCAL_YEAR: &str = "fiscal_year";

/// Declarative description of how one survey vintage's raw grid maps to
/// canonical columns. Profiles are selected by the registry and never mutated
/// at normalization time; all positions are trimmed-grid coordinates (after
/// category-column synthesis, where a profile uses it).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutProfile {
    /// Row indices whose cells are concatenated into column labels.
    pub header_rows: Vec<usize>,
    /// First row of actual data, after the header block and any subheader
    /// residue the layout carries between header and data.
    pub data_start_row: usize,
    /// Fixed column position → canonical name overrides.
    #[serde(default)]
    pub relabels: BTreeMap<usize, String>,
    /// Spacer/duplicate columns removed after relabeling and relocation.
    #[serde(default)]
    pub drop_columns: BTreeSet<usize>,
    /// Merged-header label → how many columns to its right inherit it.
    #[serde(default)]
    pub span_rules: BTreeMap<String, usize>,
    /// Column whose blanks are filled from the nearest preceding value.
    #[serde(default)]
    pub forward_fill_column: Option<usize>,
    /// Year-specific fix for layouts that fold the category label into the
    /// fiscal-year column.
    #[serde(default)]
    pub category_relocation: Option<CategoryRelocation>,
    #[serde(default)]
    pub row_filter: RowFilter,
    #[serde(default = "default_sentinels")]
    pub sentinel_tokens: BTreeSet<String>,
}

impl LayoutProfile {
    /// Highest column position this profile indexes into. Grid width is
    /// validated against it before any positional access, so misalignment
    /// surfaces as a malformed-sheet report instead of silent corruption.
    pub fn max_column_reference(&self) -> Option<usize> {
        let mut max: Option<usize> = None;
        let mut track = |v: usize| max = Some(max.map_or(v, |m| m.max(v)));
        for &pos in self.relabels.keys() {
            track(pos);
        }
        for &pos in &self.drop_columns {
            track(pos);
        }
        if let Some(pos) = self.forward_fill_column {
            track(pos);
        }
        if let Some(reloc) = &self.category_relocation {
            track(reloc.marker_column);
            track(reloc.category_column);
        }
        max
    }
}

/// Moves a category label that was printed in the fiscal-year column back into
/// the category column, for every row not carrying the fiscal-year marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRelocation {
    /// Column expected to carry the fiscal-year marker on true data rows.
    pub marker_column: usize,
    /// Column receiving the relocated category label.
    pub category_column: usize,
    /// Substring identifying a fiscal-year cell (年度 in every vintage so far).
    pub marker_token: String,
    /// Synthesize the category column as a new empty leading column before
    /// reconciliation (the raw layout has no category column at all).
    #[serde(default)]
    pub synthesize_category_column: bool,
}

/// Which data rows survive reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowFilter {
    /// Keep only rows whose fiscal-year column holds a parseable 4-digit year.
    #[default]
    RequireFiscalYear,
    KeepAll,
}

/// Missing-data placeholders the source uses interchangeably: half- and
/// full-width X, half- and full-width dash, ellipsis, asterisk runs.
pub fn default_sentinels() -> BTreeSet<String> {
    ["X", "x", "Ｘ", "ｘ", "-", "－", "…", "*", "**", "***"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Selects which years a profile rule covers. Explicit predicates (`Year`,
/// `Years`) outrank range predicates during resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YearPredicate {
    Year(u16),
    Years(BTreeSet<u16>),
    AtLeast(u16),
    Below(u16),
}

impl YearPredicate {
    pub fn matches(&self, year: u16) -> bool {
        match self {
            YearPredicate::Year(y) => *y == year,
            YearPredicate::Years(set) => set.contains(&year),
            YearPredicate::AtLeast(bound) => year >= *bound,
            YearPredicate::Below(bound) => year < *bound,
        }
    }

    pub fn is_explicit(&self) -> bool {
        matches!(self, YearPredicate::Year(_) | YearPredicate::Years(_))
    }

    /// The explicit years this predicate names, for ambiguity checking.
    pub fn explicit_years(&self) -> Vec<u16> {
        match self {
            YearPredicate::Year(y) => vec![*y],
            YearPredicate::Years(set) => set.iter().copied().collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicate_matching() {
        assert!(YearPredicate::Year(2007).matches(2007));
        assert!(!YearPredicate::Year(2007).matches(2008));
        let set = YearPredicate::Years([2009, 2011].into_iter().collect());
        assert!(set.matches(2011));
        assert!(!set.matches(2010));
        assert!(YearPredicate::AtLeast(2020).matches(2023));
        assert!(!YearPredicate::AtLeast(2020).matches(2019));
        assert!(YearPredicate::Below(2020).matches(1992));
        assert!(!YearPredicate::Below(2020).matches(2020));
    }

    #[test]
    fn max_column_reference_covers_every_positional_field() {
        let profile = LayoutProfile {
            header_rows: vec![0],
            data_start_row: 1,
            relabels: [(1, INDUSTRY.to_string())].into_iter().collect(),
            drop_columns: [4].into_iter().collect(),
            span_rules: BTreeMap::new(),
            forward_fill_column: Some(2),
            category_relocation: Some(CategoryRelocation {
                marker_column: 3,
                category_column: 0,
                marker_token: "年度".into(),
                synthesize_category_column: false,
            }),
            row_filter: RowFilter::RequireFiscalYear,
            sentinel_tokens: default_sentinels(),
        };
        assert_eq!(profile.max_column_reference(), Some(4));
    }
}
