//! QPlan Planner - Cardinality estimation and plan optimization

pub mod cbo;
pub mod explain;
pub mod optimizer;
pub mod predicate_pushdown;
pub mod stats_derivation;

pub use cbo::{JoinOrderer, PartialPlan};
pub use explain::{explain, explain_plan};
pub use optimizer::Optimizer;
pub use predicate_pushdown::{build_leaves, Leaf, PredicatePool, ScanRef};
pub use stats_derivation::{
    annotate, derive_node, derive_stats, AnnotatedPlan, JoinStatsDerivator,
    ProductStatsDerivator, ProjectStatsDerivator, ScanStatsDerivator, SelectStatsDerivator,
    StatsDerivator,
};
