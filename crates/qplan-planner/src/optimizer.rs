//! Optimizer
//!
//! Rebuilds a canonical plan so that filters sit directly on the scans they
//! restrict, unused columns are projected away early, and relations are
//! joined greedily in the order that keeps intermediate results smallest.

use crate::cbo::JoinOrderer;
use crate::predicate_pushdown::{build_leaves, PredicatePool};
use crate::stats_derivation::derive_stats;
use qplan_common::{OptimizerConfig, Result};
use qplan_sql::{Attribute, LogicalPlan};
use std::collections::HashSet;

/// Heuristic plus cost-based plan optimizer
#[derive(Debug, Clone, Default)]
pub struct Optimizer {
    config: OptimizerConfig,
}

impl Optimizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: OptimizerConfig) -> Self {
        Self { config }
    }

    /// Produce an equivalent plan with the same output attributes, in the
    /// same order. The input plan is not modified.
    pub fn optimize(&self, plan: &LogicalPlan) -> Result<LogicalPlan> {
        // an invalid input fails here rather than halfway through the rebuild
        let before = derive_stats(plan)?;

        let (top_projection, body) = match plan {
            LogicalPlan::Project { input, attributes } => (Some(attributes.as_slice()), input.as_ref()),
            other => (None, other),
        };

        let mut pool = PredicatePool::collect(body);
        tracing::debug!(
            relations = pool.scans.len(),
            joins = pool.join_predicates.len(),
            filters = pool.filter_predicates.len(),
            "collected predicates"
        );

        let leaves = build_leaves(&mut pool, top_projection, &self.config)?;
        let mut current = JoinOrderer::new(&self.config)
            .order(leaves, &mut pool.join_predicates)?
            .plan;

        // whatever could not be placed lower goes on top
        for predicate in pool
            .filter_predicates
            .drain(..)
            .chain(pool.join_predicates.drain(..))
        {
            current = LogicalPlan::select(current, predicate);
        }

        let optimized = restore_projection(current, top_projection);
        let after = derive_stats(&optimized)?;
        tracing::info!(
            before = before.tuple_count,
            after = after.tuple_count,
            "optimized plan"
        );
        Ok(optimized)
    }
}

/// Put the query's projection back on top, reusing a top-level Project that
/// already keeps the same attribute set.
fn restore_projection(plan: LogicalPlan, top_projection: Option<&[Attribute]>) -> LogicalPlan {
    let Some(top) = top_projection else {
        return plan;
    };

    match plan {
        LogicalPlan::Project { input, attributes } if same_attributes(&attributes, top) => {
            LogicalPlan::Project {
                input,
                attributes: top.to_vec(),
            }
        }
        other => LogicalPlan::project(other, top.to_vec()),
    }
}

fn same_attributes(a: &[Attribute], b: &[Attribute]) -> bool {
    a.iter().collect::<HashSet<_>>() == b.iter().collect::<HashSet<_>>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use qplan_common::{OperatorKind, QplanError};
    use qplan_sql::{Predicate, Relation};

    fn scan(name: &str, rows: u64, attrs: &[(&str, u64)]) -> LogicalPlan {
        LogicalPlan::scan(
            name,
            Relation::new(
                rows,
                attrs.iter().map(|(n, d)| Attribute::new(*n, *d)).collect(),
            ),
        )
    }

    #[test]
    fn test_single_relation() {
        let plan = LogicalPlan::project(
            LogicalPlan::select(
                scan("A", 100, &[("a1", 100), ("a2", 15)]),
                Predicate::equals_constant("a2", "3"),
            ),
            vec![Attribute::named("a1")],
        );
        let optimized = Optimizer::new().optimize(&plan).unwrap();
        assert_eq!(optimized.kind(), OperatorKind::Project);
        assert_eq!(derive_stats(&optimized).unwrap().tuple_count, 6);
        assert_eq!(
            derive_stats(&optimized).unwrap().attribute_names(),
            vec!["a1"]
        );
    }

    #[test]
    fn test_product_becomes_join() {
        let plan = LogicalPlan::project(
            LogicalPlan::select(
                LogicalPlan::product(
                    scan("A", 100, &[("a1", 100), ("a2", 15)]),
                    scan("B", 150, &[("b1", 150), ("b2", 100), ("b3", 5)]),
                ),
                Predicate::equals_attribute("a2", "b3"),
            ),
            vec![Attribute::named("b1"), Attribute::named("a2")],
        );
        let optimized = Optimizer::new().optimize(&plan).unwrap();
        assert_eq!(optimized.count_kind(OperatorKind::Product), 0);
        assert_eq!(optimized.count_kind(OperatorKind::Join), 1);

        let output = derive_stats(&optimized).unwrap();
        assert_eq!(output.attribute_names(), vec!["b1", "a2"]);
        assert_eq!(output.tuple_count, 1000);
    }

    #[test]
    fn test_top_project_is_reused_in_query_order() {
        let plan = LogicalPlan::project(
            scan("A", 10, &[("a1", 10), ("a2", 5), ("a3", 2)]),
            vec![Attribute::named("a2"), Attribute::named("a1")],
        );
        let optimized = Optimizer::new().optimize(&plan).unwrap();
        // the pruning projection is rewritten instead of stacked
        assert_eq!(optimized.count_kind(OperatorKind::Project), 1);
        assert_eq!(
            derive_stats(&optimized).unwrap().attribute_names(),
            vec!["a2", "a1"]
        );
    }

    #[test]
    fn test_star_query_has_no_projection() {
        let plan = LogicalPlan::select(
            LogicalPlan::product(scan("A", 10, &[("a", 10)]), scan("B", 20, &[("b", 20)])),
            Predicate::equals_attribute("a", "b"),
        );
        let optimized = Optimizer::new().optimize(&plan).unwrap();
        assert_eq!(optimized.kind(), OperatorKind::Join);
        assert_eq!(optimized.count_kind(OperatorKind::Project), 0);
    }

    #[test]
    fn test_disabled_rewrites_keep_predicates_on_top() {
        let config = OptimizerConfig {
            push_filters: false,
            prune_columns: false,
            lookahead: false,
        };
        let plan = LogicalPlan::select(
            scan("A", 10, &[("a1", 10), ("a2", 5)]),
            Predicate::equals_constant("a1", "x"),
        );
        let optimized = Optimizer::with_config(config).optimize(&plan).unwrap();
        assert_eq!(optimized, plan);
    }

    #[test]
    fn test_invalid_plan_is_rejected() {
        let plan = LogicalPlan::project(
            scan("A", 10, &[("a1", 10)]),
            vec![Attribute::named("a3")],
        );
        assert!(matches!(
            Optimizer::new().optimize(&plan),
            Err(QplanError::AttributeResolution { .. })
        ));
    }
}
