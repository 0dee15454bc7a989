//! QPlan Catalog - Base relation statistics

pub mod in_memory;
pub mod stats;
pub mod traits;

pub use in_memory::InMemoryCatalog;
pub use stats::{CatalogFile, ColumnStatistics, TableStatistics};
pub use traits::CatalogProvider;
