//! Attributes and relation statistics

use qplan_catalog::TableStatistics;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A named column together with its estimated number of distinct values.
///
/// Equality and hashing use the name only: the lookup key of an attribute is
/// its name. A predicate's attribute reference (whose count is meaningless)
/// must match a schema's statistics-bearing attribute of the same name, so do
/// not switch this to structural equality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub distinct_count: u64,
}

impl Attribute {
    pub fn new(name: impl Into<String>, distinct_count: u64) -> Self {
        Self {
            name: name.into(),
            distinct_count,
        }
    }

    /// A reference to a column by name, carrying no statistics
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, 0)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Same column with a different distinct count
    pub fn with_distinct_count(&self, distinct_count: u64) -> Self {
        Self::new(self.name.clone(), distinct_count)
    }
}

impl PartialEq for Attribute {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Attribute {}

impl Hash for Attribute {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Statistics of a base table or of an operator's output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub tuple_count: u64,
    pub attributes: Vec<Attribute>,
}

impl Relation {
    pub fn new(tuple_count: u64, attributes: Vec<Attribute>) -> Self {
        Self {
            tuple_count,
            attributes,
        }
    }

    /// Look up an attribute by name
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Look up the statistics-bearing copy of `attr`
    pub fn find(&self, attr: &Attribute) -> Option<&Attribute> {
        self.attribute(&attr.name)
    }

    pub fn contains(&self, attr: &Attribute) -> bool {
        self.find(attr).is_some()
    }

    pub fn attribute_names(&self) -> Vec<&str> {
        self.attributes.iter().map(|a| a.name.as_str()).collect()
    }
}

impl From<&TableStatistics> for Relation {
    fn from(stats: &TableStatistics) -> Self {
        Relation {
            tuple_count: stats.row_count,
            attributes: stats
                .column_statistics
                .iter()
                .map(|c| Attribute::new(c.name.clone(), c.distinct_count))
                .collect(),
        }
    }
}
