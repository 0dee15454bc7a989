//! Table and column statistics for cost-based optimization

use serde::{Deserialize, Serialize};

/// Statistics for a base table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableStatistics {
    /// Total number of rows in the table
    pub row_count: u64,
    /// Per-column statistics, in schema order
    #[serde(default)]
    pub column_statistics: Vec<ColumnStatistics>,
}

impl TableStatistics {
    pub fn new(row_count: u64) -> Self {
        Self {
            row_count,
            column_statistics: Vec::new(),
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnStatistics> {
        self.column_statistics.iter().find(|c| c.name == name)
    }
}

/// Statistics for a single column
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnStatistics {
    pub name: String,
    /// Number of distinct values (NDV)
    pub distinct_count: u64,
}

impl ColumnStatistics {
    pub fn new(name: impl Into<String>, distinct_count: u64) -> Self {
        Self {
            name: name.into(),
            distinct_count,
        }
    }
}

/// On-disk catalogue layout
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub tables: Vec<TableDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDefinition {
    pub name: String,
    pub row_count: u64,
    #[serde(default)]
    pub columns: Vec<ColumnStatistics>,
}
