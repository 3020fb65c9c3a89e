// ABOUTME: Building and tearing down the contents of a view schema
// ABOUTME: Exports the SQL script library, refresh and field counting

pub mod field_counts;
pub mod refresh;
pub mod scripts;

pub use field_counts::{field_counts, FIELD_COUNTS_TABLE};
pub use refresh::refresh_views;
pub use scripts::{documented_tables, Script, SCRIPTS};
