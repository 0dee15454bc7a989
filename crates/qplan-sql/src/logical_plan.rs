//! Logical Query Plan representation

use crate::expr::Predicate;
use crate::relation::{Attribute, Relation};
use qplan_common::OperatorKind;
use serde::{Deserialize, Serialize};

/// Logical Query Plan
///
/// Children are exclusively owned; a plan is always a tree. Canonical plans
/// produced by the parser use only `Scan`, `Select`, `Product` and `Project`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LogicalPlan {
    /// Scan a base table; `relation` holds the catalogue statistics
    Scan {
        table_name: String,
        relation: Relation,
    },

    /// Filter rows
    Select {
        input: Box<LogicalPlan>,
        predicate: Predicate,
    },

    /// Restrict to the listed columns, in list order
    Project {
        input: Box<LogicalPlan>,
        attributes: Vec<Attribute>,
    },

    /// Cartesian product
    Product {
        left: Box<LogicalPlan>,
        right: Box<LogicalPlan>,
    },

    /// Equality join
    Join {
        left: Box<LogicalPlan>,
        right: Box<LogicalPlan>,
        predicate: Predicate,
    },
}

impl LogicalPlan {
    pub fn scan(table_name: impl Into<String>, relation: Relation) -> Self {
        LogicalPlan::Scan {
            table_name: table_name.into(),
            relation,
        }
    }

    pub fn select(input: LogicalPlan, predicate: Predicate) -> Self {
        LogicalPlan::Select {
            input: Box::new(input),
            predicate,
        }
    }

    pub fn project(input: LogicalPlan, attributes: Vec<Attribute>) -> Self {
        LogicalPlan::Project {
            input: Box::new(input),
            attributes,
        }
    }

    pub fn product(left: LogicalPlan, right: LogicalPlan) -> Self {
        LogicalPlan::Product {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn join(left: LogicalPlan, right: LogicalPlan, predicate: Predicate) -> Self {
        LogicalPlan::Join {
            left: Box::new(left),
            right: Box::new(right),
            predicate,
        }
    }

    pub fn kind(&self) -> OperatorKind {
        match self {
            LogicalPlan::Scan { .. } => OperatorKind::Scan,
            LogicalPlan::Select { .. } => OperatorKind::Select,
            LogicalPlan::Project { .. } => OperatorKind::Project,
            LogicalPlan::Product { .. } => OperatorKind::Product,
            LogicalPlan::Join { .. } => OperatorKind::Join,
        }
    }

    /// Direct children, left to right
    pub fn inputs(&self) -> Vec<&LogicalPlan> {
        match self {
            LogicalPlan::Scan { .. } => vec![],
            LogicalPlan::Select { input, .. } | LogicalPlan::Project { input, .. } => {
                vec![input.as_ref()]
            }
            LogicalPlan::Product { left, right } | LogicalPlan::Join { left, right, .. } => {
                vec![left.as_ref(), right.as_ref()]
            }
        }
    }

    /// Get table references from this plan, left to right
    pub fn table_refs(&self) -> Vec<String> {
        match self {
            LogicalPlan::Scan { table_name, .. } => vec![table_name.clone()],
            _ => self
                .inputs()
                .into_iter()
                .flat_map(|input| input.table_refs())
                .collect(),
        }
    }

    pub fn count_kind(&self, kind: OperatorKind) -> usize {
        let own = usize::from(self.kind() == kind);
        own + self
            .inputs()
            .into_iter()
            .map(|input| input.count_kind(kind))
            .sum::<usize>()
    }
}
