pub mod clean;
pub mod error;
pub mod family;
pub mod grid;
pub mod intake;
pub mod layout;
pub mod sink;

pub use error::NormalizeError;
pub use family::DatasetFamily;

/// Bounds on a plausible survey fiscal year, shared by filename year
/// extraction and the fiscal-year row filter. The survey starts in 1992;
/// the window leaves headroom for future vintages.
pub const YEAR_MIN: u16 = 1990;
pub const YEAR_MAX: u16 = 2035;
