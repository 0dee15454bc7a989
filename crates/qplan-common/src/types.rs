//! Common types used across crates

use serde::{Deserialize, Serialize};
use std::fmt;

/// The five operator variants of a query plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperatorKind {
    Scan,
    Select,
    Project,
    Product,
    Join,
}

impl OperatorKind {
    pub fn name(&self) -> &'static str {
        match self {
            OperatorKind::Scan => "Scan",
            OperatorKind::Select => "Select",
            OperatorKind::Project => "Project",
            OperatorKind::Product => "Product",
            OperatorKind::Join => "Join",
        }
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
