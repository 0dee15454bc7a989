//! QPlan Predicates

use crate::relation::Attribute;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Equality predicate, either against a literal or between two columns
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Predicate {
    /// `attribute = "constant"`
    EqualsConstant { attribute: Attribute, constant: String },

    /// `left = right`, usable as an equi-join
    EqualsAttribute { left: Attribute, right: Attribute },
}

impl Predicate {
    pub fn equals_constant(attribute: impl Into<String>, constant: impl Into<String>) -> Self {
        Predicate::EqualsConstant {
            attribute: Attribute::named(attribute),
            constant: constant.into(),
        }
    }

    pub fn equals_attribute(left: impl Into<String>, right: impl Into<String>) -> Self {
        Predicate::EqualsAttribute {
            left: Attribute::named(left),
            right: Attribute::named(right),
        }
    }

    /// Attributes referenced by this predicate, left to right
    pub fn attributes(&self) -> Vec<&Attribute> {
        match self {
            Predicate::EqualsConstant { attribute, .. } => vec![attribute],
            Predicate::EqualsAttribute { left, right } => vec![left, right],
        }
    }

    pub fn is_equi_join(&self) -> bool {
        matches!(self, Predicate::EqualsAttribute { .. })
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::EqualsConstant {
                attribute,
                constant,
            } => write!(f, "{}=\"{}\"", attribute, constant),
            Predicate::EqualsAttribute { left, right } => write!(f, "{}={}", left, right),
        }
    }
}
