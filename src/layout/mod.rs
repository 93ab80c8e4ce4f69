pub mod builtin;
pub mod profile;
pub mod registry;

pub use profile::{CategoryRelocation, LayoutProfile, RowFilter, YearPredicate};
pub use registry::{LayoutRegistry, ProfileRule, ProfileSet};
