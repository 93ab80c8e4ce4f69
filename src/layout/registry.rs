use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::profile::{LayoutProfile, YearPredicate};
use crate::error::NormalizeError;
use crate::family::DatasetFamily;

/// One entry in a family's ordered rule list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRule {
    pub when: YearPredicate,
    pub profile: LayoutProfile,
}

/// The ordered layout rules for one dataset family. Resolution is first-match,
/// with explicit year predicates consulted before range predicates: the survey
/// layout changed on discrete administrative boundaries, so odd years carry
/// pinpoint rules and the eras are covered by ranges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSet {
    pub family: DatasetFamily,
    pub rules: Vec<ProfileRule>,
}

impl ProfileSet {
    pub fn resolve(&self, year: u16) -> Option<&LayoutProfile> {
        let pass = |explicit: bool| {
            self.rules
                .iter()
                .filter(move |r| r.when.is_explicit() == explicit)
                .find(|r| r.when.matches(year))
                .map(|r| &r.profile)
        };
        pass(true).or_else(|| pass(false))
    }

    /// Configuration sanity check: no year may be claimed by two explicit
    /// predicates, otherwise resolution order would silently decide.
    pub fn check_unambiguous(&self) -> Result<(), String> {
        let mut claimed: BTreeMap<u16, usize> = BTreeMap::new();
        for (idx, rule) in self.rules.iter().enumerate() {
            for year in rule.when.explicit_years() {
                if let Some(prev) = claimed.insert(year, idx) {
                    return Err(format!(
                        "{}: year {} claimed by rules {} and {}",
                        self.family, year, prev, idx
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Maps (dataset family, year) to the layout profile describing that vintage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutRegistry {
    sets: BTreeMap<DatasetFamily, ProfileSet>,
}

impl LayoutRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, set: ProfileSet) {
        self.sets.insert(set.family, set);
    }

    pub fn family(&self, family: DatasetFamily) -> Option<&ProfileSet> {
        self.sets.get(&family)
    }

    pub fn resolve(
        &self,
        family: DatasetFamily,
        year: u16,
    ) -> Result<&LayoutProfile, NormalizeError> {
        self.sets
            .get(&family)
            .and_then(|set| set.resolve(year))
            .ok_or(NormalizeError::ProfileNotFound { family, year })
    }

    /// Profile sets are a versioned configuration artifact; a JSON document
    /// can replace the compiled-in defaults without touching pipeline logic.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::profile::{default_sentinels, RowFilter};
    use std::collections::BTreeMap;

    fn profile(data_start_row: usize) -> LayoutProfile {
        LayoutProfile {
            header_rows: vec![0],
            data_start_row,
            relabels: BTreeMap::new(),
            drop_columns: Default::default(),
            span_rules: BTreeMap::new(),
            forward_fill_column: None,
            category_relocation: None,
            row_filter: RowFilter::RequireFiscalYear,
            sentinel_tokens: default_sentinels(),
        }
    }

    fn toy_set() -> ProfileSet {
        ProfileSet {
            family: DatasetFamily::LaborHeadcount,
            // range rule listed first on purpose: explicit must still win
            rules: vec![
                ProfileRule {
                    when: YearPredicate::Below(2020),
                    profile: profile(1),
                },
                ProfileRule {
                    when: YearPredicate::Year(2005),
                    profile: profile(2),
                },
                ProfileRule {
                    when: YearPredicate::AtLeast(2020),
                    profile: profile(3),
                },
            ],
        }
    }

    #[test]
    fn explicit_rules_outrank_range_rules() {
        let set = toy_set();
        assert_eq!(set.resolve(2005).unwrap().data_start_row, 2);
        assert_eq!(set.resolve(2004).unwrap().data_start_row, 1);
        assert_eq!(set.resolve(2021).unwrap().data_start_row, 3);
    }

    #[test]
    fn missing_profile_is_reported() {
        let mut registry = LayoutRegistry::new();
        registry.insert(ProfileSet {
            family: DatasetFamily::RdExpense,
            rules: vec![ProfileRule {
                when: YearPredicate::AtLeast(2020),
                profile: profile(1),
            }],
        });
        let err = registry
            .resolve(DatasetFamily::RdExpense, 1999)
            .unwrap_err();
        match err {
            NormalizeError::ProfileNotFound { family, year } => {
                assert_eq!(family, DatasetFamily::RdExpense);
                assert_eq!(year, 1999);
            }
            other => panic!("expected ProfileNotFound, got {other}"),
        }
        // unknown family is the same configuration gap
        assert!(registry
            .resolve(DatasetFamily::PatentCount, 2020)
            .is_err());
    }

    #[test]
    fn double_claimed_explicit_year_is_rejected() {
        let mut set = toy_set();
        set.rules.push(ProfileRule {
            when: YearPredicate::Years([2005, 2006].into_iter().collect()),
            profile: profile(4),
        });
        assert!(set.check_unambiguous().is_err());
        assert!(toy_set().check_unambiguous().is_ok());
    }

    #[test]
    fn registry_round_trips_through_json() {
        let mut registry = LayoutRegistry::new();
        registry.insert(toy_set());
        let json = registry.to_json().unwrap();
        let parsed = LayoutRegistry::from_json(&json).unwrap();
        assert_eq!(parsed, registry);
    }
}
