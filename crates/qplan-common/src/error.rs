//! QPlan Error types

use crate::types::OperatorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QplanError {
    /// A Select, Project or Join references a column missing from its input schema.
    #[error("Attribute resolution error: {operator} references unknown attribute '{attribute}'")]
    AttributeResolution {
        attribute: String,
        operator: OperatorKind,
    },

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("SQL parsing error: {0}")]
    SqlParse(String),

    #[error("Planning error: {0}")]
    Planner(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::ser::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl QplanError {
    pub fn attribute_resolution(attribute: impl Into<String>, operator: OperatorKind) -> Self {
        QplanError::AttributeResolution {
            attribute: attribute.into(),
            operator,
        }
    }
}

pub type Result<T> = std::result::Result<T, QplanError>;
