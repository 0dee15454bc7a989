//! Catalog traits

use crate::stats::TableStatistics;

/// Source of immutable base-relation statistics.
///
/// The planner only consults it when building `Scan` leaves.
pub trait CatalogProvider: Send + Sync {
    /// List tables, sorted by name
    fn tables(&self) -> Vec<String>;

    /// Check if table exists
    fn table_exists(&self, name: &str) -> bool;

    /// Get table statistics
    fn table_statistics(&self, name: &str) -> Option<TableStatistics>;

    /// Store table statistics, replacing any previous entry
    fn set_table_statistics(&self, name: &str, stats: TableStatistics);
}
