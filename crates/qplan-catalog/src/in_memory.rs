//! In-memory catalog implementation

use crate::stats::{CatalogFile, ColumnStatistics, TableDefinition, TableStatistics};
use crate::traits::CatalogProvider;
use dashmap::DashMap;
use qplan_common::{QplanError, Result};

/// In-memory catalog implementation
pub struct InMemoryCatalog {
    statistics: DashMap<String, TableStatistics>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self {
            statistics: DashMap::new(),
        }
    }

    /// Register a relation with no columns yet
    pub fn create_relation(&self, name: &str, row_count: u64) -> Result<()> {
        if self.table_exists(name) {
            return Err(QplanError::AlreadyExists(format!("relation '{}'", name)));
        }
        self.set_table_statistics(name, TableStatistics::new(row_count));
        Ok(())
    }

    /// Append a column to an existing relation
    pub fn create_attribute(&self, table: &str, column: &str, distinct_count: u64) -> Result<()> {
        let mut entry = self
            .statistics
            .get_mut(table)
            .ok_or_else(|| QplanError::NotFound(format!("relation '{}'", table)))?;
        if entry.column(column).is_some() {
            return Err(QplanError::AlreadyExists(format!(
                "attribute '{}' in relation '{}'",
                column, table
            )));
        }
        entry
            .column_statistics
            .push(ColumnStatistics::new(column, distinct_count));
        Ok(())
    }

    pub fn drop_relation(&self, name: &str) -> Result<()> {
        self.statistics
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| QplanError::NotFound(format!("relation '{}'", name)))
    }

    /// Parse a catalogue in the TOML file format
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(content)
            .map_err(|e| QplanError::Catalog(format!("invalid catalogue: {}", e)))?;

        let catalog = Self::new();
        for table in file.tables {
            catalog.create_relation(&table.name, table.row_count)?;
            for column in table.columns {
                catalog.create_attribute(&table.name, &column.name, column.distinct_count)?;
            }
        }
        tracing::debug!("Loaded catalogue with {} relations", catalog.statistics.len());
        Ok(catalog)
    }

    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        let tables = self
            .tables()
            .into_iter()
            .filter_map(|name| {
                self.table_statistics(&name).map(|stats| TableDefinition {
                    name,
                    row_count: stats.row_count,
                    columns: stats.column_statistics,
                })
            })
            .collect();
        Ok(toml::to_string_pretty(&CatalogFile { tables })?)
    }
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogProvider for InMemoryCatalog {
    fn tables(&self) -> Vec<String> {
        let mut names: Vec<String> = self.statistics.iter().map(|r| r.key().clone()).collect();
        names.sort();
        names
    }

    fn table_exists(&self, name: &str) -> bool {
        self.statistics.contains_key(name)
    }

    fn table_statistics(&self, name: &str) -> Option<TableStatistics> {
        self.statistics.get(name).map(|s| s.value().clone())
    }

    fn set_table_statistics(&self, name: &str, stats: TableStatistics) {
        self.statistics.insert(name.to_string(), stats);
    }
}

#[cfg(test)]
mod tests {
    use crate::{CatalogProvider, InMemoryCatalog, TableStatistics};

    fn test_catalog() -> InMemoryCatalog {
        let catalog = InMemoryCatalog::new();
        catalog.create_relation("A", 100).unwrap();
        catalog.create_attribute("A", "a1", 100).unwrap();
        catalog.create_attribute("A", "a2", 15).unwrap();
        catalog
    }

    #[test]
    fn test_create_relation_and_attributes() {
        let catalog = test_catalog();
        assert!(catalog.table_exists("A"));

        let stats = catalog.table_statistics("A").unwrap();
        assert_eq!(stats.row_count, 100);
        let names: Vec<&str> = stats
            .column_statistics
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["a1", "a2"]);
        assert_eq!(stats.column("a2").unwrap().distinct_count, 15);
    }

    #[test]
    fn test_duplicates_are_rejected() {
        let catalog = test_catalog();
        assert!(catalog.create_relation("A", 5).is_err());
        assert!(catalog.create_attribute("A", "a1", 3).is_err());
        assert!(catalog.create_attribute("missing", "x", 3).is_err());
    }

    #[test]
    fn test_drop_relation() {
        let catalog = test_catalog();
        catalog.drop_relation("A").unwrap();
        assert!(!catalog.table_exists("A"));
        assert!(catalog.table_statistics("A").is_none());
        assert!(catalog.drop_relation("A").is_err());
    }

    #[test]
    fn test_tables_are_sorted() {
        let catalog = InMemoryCatalog::new();
        catalog.create_relation("WORKS_ON", 400).unwrap();
        catalog.create_relation("EMPLOYEE", 300).unwrap();
        catalog.create_relation("PROJECT", 200).unwrap();
        assert_eq!(catalog.tables(), vec!["EMPLOYEE", "PROJECT", "WORKS_ON"]);
    }

    #[test]
    fn test_set_table_statistics_replaces_entry() {
        let catalog = test_catalog();
        catalog.set_table_statistics(
            "A",
            TableStatistics {
                row_count: 7,
                ..Default::default()
            },
        );
        let stats = catalog.table_statistics("A").unwrap();
        assert_eq!(stats.row_count, 7);
        assert!(stats.column_statistics.is_empty());
    }

    #[test]
    fn test_load_from_toml() {
        let content = r#"
            [[tables]]
            name = "B"
            row_count = 150
            columns = [
                { name = "b1", distinct_count = 150 },
                { name = "b2", distinct_count = 100 },
                { name = "b3", distinct_count = 5 },
            ]

            [[tables]]
            name = "A"
            row_count = 100
            columns = [{ name = "a1", distinct_count = 100 }]
        "#;
        let catalog = InMemoryCatalog::from_toml_str(content).unwrap();
        assert_eq!(catalog.tables(), vec!["A", "B"]);

        let b = catalog.table_statistics("B").unwrap();
        assert_eq!(b.row_count, 150);
        assert_eq!(b.column_statistics[2].name, "b3");
        assert_eq!(b.column_statistics[2].distinct_count, 5);
    }

    #[test]
    fn test_load_rejects_duplicate_columns() {
        let content = r#"
            [[tables]]
            name = "A"
            row_count = 1
            columns = [
                { name = "a1", distinct_count = 1 },
                { name = "a1", distinct_count = 1 },
            ]
        "#;
        assert!(InMemoryCatalog::from_toml_str(content).is_err());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalogue.toml");

        let catalog = test_catalog();
        std::fs::write(&path, catalog.to_toml_string().unwrap()).unwrap();

        let loaded = InMemoryCatalog::load_from_file(&path).unwrap();
        assert_eq!(
            loaded.table_statistics("A"),
            catalog.table_statistics("A")
        );
    }
}
