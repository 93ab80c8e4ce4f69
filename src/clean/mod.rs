pub mod header;
pub mod pipeline;
pub mod reconcile;
pub mod sentinel;
pub mod table;

pub use pipeline::{collect_tables, normalize_file, FamilyTables};
pub use table::NormalizedTable;
