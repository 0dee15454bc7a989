//! QPlan Common - Shared types, errors, and configuration

pub mod config;
pub mod error;
pub mod types;

pub use config::OptimizerConfig;
pub use error::{QplanError, Result};
pub use types::OperatorKind;
