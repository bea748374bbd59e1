// CTB Battle Schema - Shared catalog definitions
// This crate holds the static enums and data records that the embedded RON
// catalogs are written in, so the catalog tables and the battle engine agree
// on one vocabulary.

// Re-export the main types
pub use catalog_ids::*;
pub use combat_types::*;
pub use status_data::*;
pub use unit_data::*;
pub use usable_data::*;

pub mod catalog_ids;
pub mod combat_types;
pub mod status_data;
pub mod unit_data;
pub mod usable_data;
