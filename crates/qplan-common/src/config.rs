//! QPlan Optimizer Configuration

use serde::{Deserialize, Serialize};

/// Switches for the individual rewrite steps of the optimizer.
///
/// Every combination yields a plan equivalent to the input; the defaults
/// enable the full pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Push single-relation predicates onto their base relation
    pub push_filters: bool,

    /// Restrict each base relation to the columns needed downstream
    pub prune_columns: bool,

    /// Cost the final relation on top of each candidate when one is left
    pub lookahead: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            push_filters: true,
            prune_columns: true,
            lookahead: true,
        }
    }
}

impl OptimizerConfig {
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Self, crate::QplanError> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::QplanError::Config(e.to_string()))
    }

    pub fn save_to_file(&self, path: impl AsRef<std::path::Path>) -> Result<(), crate::QplanError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
