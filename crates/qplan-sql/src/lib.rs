//! QPlan SQL - Plan data model and canonical plan construction

pub mod expr;
pub mod logical_plan;
pub mod parser;
pub mod planner;
pub mod relation;

pub use expr::Predicate;
pub use logical_plan::LogicalPlan;
pub use parser::SqlParser;
pub use planner::SqlPlanner;
pub use relation::{Attribute, Relation};
