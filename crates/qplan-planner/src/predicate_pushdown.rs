//! Predicate pushdown and column pruning
//!
//! Flattens a canonical plan into its base relations and a pool of
//! predicates, then builds one leaf subplan per relation with every filter
//! it can evaluate pushed directly onto the scan and a pruning projection on
//! top.

use crate::stats_derivation::derive_stats;
use qplan_common::{OptimizerConfig, Result};
use qplan_sql::{Attribute, LogicalPlan, Predicate, Relation};
use std::collections::HashSet;

/// A base relation referenced by the plan
#[derive(Debug, Clone, Copy)]
pub struct ScanRef<'a> {
    pub table_name: &'a str,
    pub relation: &'a Relation,
}

/// Base relations and predicates extracted from a plan body
#[derive(Debug, Clone, Default)]
pub struct PredicatePool<'a> {
    /// Scans in left-to-right encounter order
    pub scans: Vec<ScanRef<'a>>,
    /// `attr = attr` candidates
    pub join_predicates: Vec<Predicate>,
    /// `attr = constant` candidates
    pub filter_predicates: Vec<Predicate>,
}

impl<'a> PredicatePool<'a> {
    /// Walk the plan top-down. Products and interior projections carry no
    /// information the rebuilt plan needs and are dropped; a Join is taken
    /// apart into its inputs plus an equi-join candidate.
    pub fn collect(plan: &'a LogicalPlan) -> Self {
        let mut pool = Self::default();
        pool.visit(plan);
        pool
    }

    fn visit(&mut self, plan: &'a LogicalPlan) {
        match plan {
            LogicalPlan::Scan {
                table_name,
                relation,
            } => self.scans.push(ScanRef {
                table_name,
                relation,
            }),
            LogicalPlan::Select { input, predicate } => {
                self.add_predicate(predicate.clone());
                self.visit(input);
            }
            LogicalPlan::Project { input, .. } => self.visit(input),
            LogicalPlan::Product { left, right } => {
                self.visit(left);
                self.visit(right);
            }
            LogicalPlan::Join {
                left,
                right,
                predicate,
            } => {
                self.add_predicate(predicate.clone());
                self.visit(left);
                self.visit(right);
            }
        }
    }

    fn add_predicate(&mut self, predicate: Predicate) {
        if predicate.is_equi_join() {
            self.join_predicates.push(predicate);
        } else {
            self.filter_predicates.push(predicate);
        }
    }

    /// Attributes still referenced by some pooled predicate or the final
    /// projection. `None` when every attribute must be kept.
    fn needed_attributes<'p>(&'p self, top_projection: Option<&'p [Attribute]>) -> Option<HashSet<&'p Attribute>> {
        let top = top_projection?;
        let mut needed: HashSet<&Attribute> = top.iter().collect();
        for predicate in self.join_predicates.iter().chain(self.filter_predicates.iter()) {
            needed.extend(predicate.attributes());
        }
        Some(needed)
    }
}

/// A base relation with its pushed-down filters and pruning projection
#[derive(Debug, Clone)]
pub struct Leaf {
    pub table_name: String,
    /// Tuple count of the unfiltered relation
    pub base_rows: u64,
    pub plan: LogicalPlan,
    pub output: Relation,
}

/// Build one leaf per scan, consuming the predicates that were pushed.
///
/// With `top_projection` absent (a `SELECT *` query) no column is pruned.
pub fn build_leaves(
    pool: &mut PredicatePool<'_>,
    top_projection: Option<&[Attribute]>,
    config: &OptimizerConfig,
) -> Result<Vec<Leaf>> {
    let scans = pool.scans.clone();
    let mut leaves = Vec::with_capacity(scans.len());

    for scan in scans {
        let relation = scan.relation;
        let mut plan = LogicalPlan::scan(scan.table_name, relation.clone());

        if config.push_filters {
            plan = push_local_predicates(plan, relation, &mut pool.filter_predicates);
            plan = push_local_predicates(plan, relation, &mut pool.join_predicates);
        }

        if config.prune_columns {
            if let Some(needed) = pool.needed_attributes(top_projection) {
                let kept: Vec<Attribute> = relation
                    .attributes
                    .iter()
                    .filter(|a| needed.contains(a))
                    .cloned()
                    .collect();
                if kept.len() < relation.attributes.len() {
                    plan = LogicalPlan::project(plan, kept);
                }
            }
        }

        let output = derive_stats(&plan)?;
        tracing::debug!(
            table = scan.table_name,
            rows = output.tuple_count,
            "built leaf"
        );
        leaves.push(Leaf {
            table_name: scan.table_name.to_string(),
            base_rows: relation.tuple_count,
            plan,
            output,
        });
    }

    Ok(leaves)
}

/// Wrap `plan` in a Select for every pooled predicate whose attributes all
/// belong to `relation`, in pool order.
fn push_local_predicates(
    mut plan: LogicalPlan,
    relation: &Relation,
    predicates: &mut Vec<Predicate>,
) -> LogicalPlan {
    let mut remaining = Vec::with_capacity(predicates.len());
    for predicate in predicates.drain(..) {
        if predicate.attributes().into_iter().all(|a| relation.contains(a)) {
            plan = LogicalPlan::select(plan, predicate);
        } else {
            remaining.push(predicate);
        }
    }
    *predicates = remaining;
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use qplan_common::OperatorKind;

    fn relation(rows: u64, attrs: &[(&str, u64)]) -> Relation {
        Relation::new(
            rows,
            attrs.iter().map(|(n, d)| Attribute::new(*n, *d)).collect(),
        )
    }

    fn canonical() -> LogicalPlan {
        LogicalPlan::select(
            LogicalPlan::select(
                LogicalPlan::product(
                    LogicalPlan::scan("A", relation(100, &[("a1", 100), ("a2", 15), ("a3", 4)])),
                    LogicalPlan::scan("B", relation(150, &[("b1", 150), ("b3", 5)])),
                ),
                Predicate::equals_constant("a1", "7"),
            ),
            Predicate::equals_attribute("a2", "b3"),
        )
    }

    #[test]
    fn test_collect_order() {
        let plan = canonical();
        let pool = PredicatePool::collect(&plan);
        let names: Vec<&str> = pool.scans.iter().map(|s| s.table_name).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(pool.join_predicates, vec![Predicate::equals_attribute("a2", "b3")]);
        assert_eq!(pool.filter_predicates, vec![Predicate::equals_constant("a1", "7")]);
    }

    #[test]
    fn test_collect_decomposes_join() {
        let plan = LogicalPlan::join(
            LogicalPlan::scan("A", relation(10, &[("a", 10)])),
            LogicalPlan::scan("B", relation(10, &[("b", 10)])),
            Predicate::equals_attribute("a", "b"),
        );
        let pool = PredicatePool::collect(&plan);
        assert_eq!(pool.scans.len(), 2);
        assert_eq!(pool.join_predicates.len(), 1);
    }

    #[test]
    fn test_filters_pushed_and_columns_pruned() {
        let plan = canonical();
        let mut pool = PredicatePool::collect(&plan);
        let top = vec![Attribute::named("b1")];
        let leaves = build_leaves(&mut pool, Some(top.as_slice()), &OptimizerConfig::default()).unwrap();

        assert!(pool.filter_predicates.is_empty());
        assert_eq!(pool.join_predicates.len(), 1);

        let a = &leaves[0];
        assert_eq!(a.base_rows, 100);
        assert_eq!(a.output.tuple_count, 1);
        // a1 was consumed by its filter, a3 is never referenced
        assert_eq!(a.output.attribute_names(), vec!["a2"]);
        assert_eq!(a.plan.count_kind(OperatorKind::Select), 1);

        let b = &leaves[1];
        assert_eq!(b.output.attribute_names(), vec!["b1", "b3"]);
        assert_eq!(b.plan.kind(), OperatorKind::Scan);
    }

    #[test]
    fn test_star_query_keeps_all_columns() {
        let plan = canonical();
        let mut pool = PredicatePool::collect(&plan);
        let leaves = build_leaves(&mut pool, None, &OptimizerConfig::default()).unwrap();
        assert_eq!(leaves[0].output.attribute_names(), vec!["a1", "a2", "a3"]);
    }

    #[test]
    fn test_intra_relation_equality_is_pushed() {
        let plan = LogicalPlan::select(
            LogicalPlan::scan("A", relation(100, &[("a1", 100), ("a2", 15)])),
            Predicate::equals_attribute("a1", "a2"),
        );
        let mut pool = PredicatePool::collect(&plan);
        let leaves = build_leaves(&mut pool, None, &OptimizerConfig::default()).unwrap();
        assert!(pool.join_predicates.is_empty());
        assert_eq!(leaves[0].output.tuple_count, 1);
    }

    #[test]
    fn test_pushdown_disabled() {
        let plan = canonical();
        let mut pool = PredicatePool::collect(&plan);
        let config = OptimizerConfig {
            push_filters: false,
            ..OptimizerConfig::default()
        };
        let top = vec![Attribute::named("b1")];
        let leaves = build_leaves(&mut pool, Some(top.as_slice()), &config).unwrap();
        assert_eq!(pool.filter_predicates.len(), 1);
        assert_eq!(leaves[0].output.tuple_count, 100);
        // still needed by the unpushed filter
        assert_eq!(leaves[0].output.attribute_names(), vec!["a1", "a2"]);
    }
}
