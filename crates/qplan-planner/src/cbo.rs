//! Cost-Based Optimizer (CBO)
//!
//! Greedy left-deep join ordering driven by the cardinality estimator.
//! Key features:
//! - Root chosen by smallest base relation
//! - Join preferred over Product whenever a predicate connects the two sides
//! - Optional one-step lookahead when exactly two relations remain

use crate::predicate_pushdown::Leaf;
use crate::stats_derivation::{
    JoinStatsDerivator, ProductStatsDerivator, SelectStatsDerivator, StatsDerivator,
};
use qplan_common::{OptimizerConfig, QplanError, Result};
use qplan_sql::{LogicalPlan, Predicate, Relation};
use std::cmp::Reverse;

// ============================================================================
// Partial plans and candidates
// ============================================================================

/// The left-deep tree built so far, with its estimated output
#[derive(Debug, Clone)]
pub struct PartialPlan {
    pub plan: LogicalPlan,
    pub output: Relation,
}

/// One way to extend the current tree by a remaining leaf
#[derive(Debug, Clone)]
struct Candidate {
    /// Index into the remaining leaves
    leaf: usize,
    /// Index into the equi-join pool, `None` for a Product
    predicate: Option<usize>,
    output: Relation,
    input_rows: u64,
    final_rows: u64,
}

impl Candidate {
    /// Fewest rows after the lookahead step, then the most rows eliminated,
    /// then the smallest immediate output.
    fn sort_key(&self) -> (u64, Reverse<u64>, u64) {
        (self.final_rows, Reverse(self.input_rows), self.output.tuple_count)
    }
}

/// First equi-join candidate with one attribute on each side, skipping `exclude`
fn find_join_predicate(
    left: &Relation,
    right: &Relation,
    predicates: &[Predicate],
    exclude: Option<usize>,
) -> Option<usize> {
    predicates.iter().enumerate().position(|(i, p)| {
        if Some(i) == exclude {
            return false;
        }
        match p {
            Predicate::EqualsAttribute { left: l, right: r } => {
                (left.contains(l) && right.contains(r)) || (left.contains(r) && right.contains(l))
            }
            Predicate::EqualsConstant { .. } => false,
        }
    })
}

fn combine(left: &Relation, right: &Relation, predicate: Option<&Predicate>) -> Result<Relation> {
    match predicate {
        Some(predicate) => JoinStatsDerivator { predicate }.derive(&[left, right]),
        None => ProductStatsDerivator.derive(&[left, right]),
    }
}

// ============================================================================
// Join Reordering (Greedy)
// ============================================================================

pub struct JoinOrderer<'a> {
    config: &'a OptimizerConfig,
}

impl<'a> JoinOrderer<'a> {
    pub fn new(config: &'a OptimizerConfig) -> Self {
        Self { config }
    }

    /// Assemble every leaf into one left-deep tree.
    ///
    /// Equi-join predicates used as join conditions, or applied once both of
    /// their attributes are inside the tree, are removed from `join_predicates`.
    pub fn order(&self, mut leaves: Vec<Leaf>, join_predicates: &mut Vec<Predicate>) -> Result<PartialPlan> {
        let root = leaves
            .iter()
            .enumerate()
            .min_by_key(|(_, leaf)| leaf.base_rows)
            .map(|(i, _)| i)
            .ok_or_else(|| QplanError::Planner("plan references no relation".to_string()))?;
        let root = leaves.remove(root);
        tracing::info!(table = %root.table_name, rows = root.base_rows, "chose root relation");

        let mut current = PartialPlan {
            plan: root.plan,
            output: root.output,
        };
        self.apply_resolved(&mut current, join_predicates)?;

        while !leaves.is_empty() {
            let best = self.choose_next(&current, &leaves, join_predicates)?;
            let leaf = leaves.remove(best.leaf);

            current.plan = match best.predicate.map(|i| join_predicates.remove(i)) {
                Some(predicate) => {
                    tracing::debug!(table = %leaf.table_name, %predicate, rows = best.output.tuple_count, "join");
                    LogicalPlan::join(current.plan, leaf.plan, predicate)
                }
                None => {
                    tracing::debug!(table = %leaf.table_name, rows = best.output.tuple_count, "product");
                    LogicalPlan::product(current.plan, leaf.plan)
                }
            };
            current.output = best.output;
            self.apply_resolved(&mut current, join_predicates)?;
        }

        Ok(current)
    }

    fn choose_next(
        &self,
        current: &PartialPlan,
        leaves: &[Leaf],
        join_predicates: &[Predicate],
    ) -> Result<Candidate> {
        let lookahead = self.config.lookahead && leaves.len() == 2;
        let mut best: Option<Candidate> = None;

        for (index, leaf) in leaves.iter().enumerate() {
            let predicate = find_join_predicate(&current.output, &leaf.output, join_predicates, None);
            let output = combine(
                &current.output,
                &leaf.output,
                predicate.map(|i| &join_predicates[i]),
            )?;

            let final_rows = if lookahead {
                let last = &leaves[1 - index];
                let next = find_join_predicate(&output, &last.output, join_predicates, predicate);
                combine(&output, &last.output, next.map(|i| &join_predicates[i]))?.tuple_count
            } else {
                output.tuple_count
            };

            let candidate = Candidate {
                leaf: index,
                predicate,
                input_rows: current.output.tuple_count.saturating_mul(leaf.output.tuple_count),
                final_rows,
                output,
            };
            tracing::trace!(
                table = %leaf.table_name,
                final_rows = candidate.final_rows,
                input_rows = candidate.input_rows,
                rows = candidate.output.tuple_count,
                "candidate"
            );

            // strict: the earliest leaf wins ties
            if best
                .as_ref()
                .map_or(true, |b| candidate.sort_key() < b.sort_key())
            {
                best = Some(candidate);
            }
        }

        best.ok_or_else(|| QplanError::Planner("no relation left to join".to_string()))
    }

    /// Apply every pooled equi-join predicate whose attributes are both
    /// inside the tree as a Select on top of it.
    fn apply_resolved(&self, current: &mut PartialPlan, join_predicates: &mut Vec<Predicate>) -> Result<()> {
        if !self.config.push_filters {
            return Ok(());
        }

        let mut remaining = Vec::with_capacity(join_predicates.len());
        for predicate in join_predicates.drain(..) {
            if predicate
                .attributes()
                .into_iter()
                .all(|a| current.output.contains(a))
            {
                current.output = SelectStatsDerivator {
                    predicate: &predicate,
                }
                .derive(&[&current.output])?;
                current.plan = LogicalPlan::select(current.plan.clone(), predicate);
            } else {
                remaining.push(predicate);
            }
        }
        *join_predicates = remaining;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qplan_common::OperatorKind;
    use qplan_sql::Attribute;

    fn leaf(name: &str, rows: u64, attrs: &[(&str, u64)]) -> Leaf {
        let relation = Relation::new(
            rows,
            attrs.iter().map(|(n, d)| Attribute::new(*n, *d)).collect(),
        );
        Leaf {
            table_name: name.to_string(),
            base_rows: rows,
            plan: LogicalPlan::scan(name, relation.clone()),
            output: relation,
        }
    }

    #[test]
    fn test_root_is_smallest_relation() {
        let config = OptimizerConfig::default();
        let leaves = vec![
            leaf("A", 50, &[("a", 50)]),
            leaf("B", 10, &[("b", 10)]),
            leaf("C", 10, &[("c", 10)]),
        ];
        let mut preds = vec![];
        let result = JoinOrderer::new(&config).order(leaves, &mut preds).unwrap();
        // B ties with C on size but comes first
        assert_eq!(result.plan.table_refs()[0], "B");
        assert_eq!(result.output.tuple_count, 5000);
    }

    #[test]
    fn test_join_preferred_over_product() {
        let config = OptimizerConfig::default();
        let leaves = vec![
            leaf("A", 10, &[("a", 10)]),
            leaf("B", 1000, &[("b", 2)]),
            leaf("C", 20, &[("c", 20)]),
        ];
        let mut preds = vec![Predicate::equals_attribute("b", "a")];
        let result = JoinOrderer::new(&config).order(leaves, &mut preds).unwrap();
        assert!(preds.is_empty());
        assert_eq!(result.plan.count_kind(OperatorKind::Join), 1);
        assert_eq!(result.plan.count_kind(OperatorKind::Product), 1);
    }

    #[test]
    fn test_tie_break_prefers_larger_input() {
        let config = OptimizerConfig {
            lookahead: false,
            ..OptimizerConfig::default()
        };
        // both candidates produce 10 rows; B eliminates more
        let leaves = vec![
            leaf("A", 10, &[("a", 10)]),
            leaf("C", 10, &[("c", 10)]),
            leaf("B", 100, &[("b", 100)]),
        ];
        let mut preds = vec![Predicate::equals_attribute("a", "c"), Predicate::equals_attribute("a", "b")];
        let result = JoinOrderer::new(&config).order(leaves, &mut preds).unwrap();
        assert_eq!(result.plan.table_refs(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_lookahead_changes_order() {
        // Y is the cheapest next step but forces a bad final join; X is not
        let leaves = || {
            vec![
                leaf("R", 2, &[("r", 2)]),
                leaf("X", 1000, &[("x", 2), ("x2", 1000)]),
                leaf("Y", 5, &[("y", 5)]),
            ]
        };
        let preds = || {
            vec![
                Predicate::equals_attribute("r", "x"),
                Predicate::equals_attribute("x2", "y"),
            ]
        };

        let greedy = OptimizerConfig {
            lookahead: false,
            ..OptimizerConfig::default()
        };
        let mut pool = preds();
        let result = JoinOrderer::new(&greedy).order(leaves(), &mut pool).unwrap();
        assert_eq!(result.plan.table_refs(), vec!["R", "Y", "X"]);
        assert_eq!(result.plan.count_kind(OperatorKind::Product), 1);

        let lookahead = OptimizerConfig::default();
        let mut pool = preds();
        let result = JoinOrderer::new(&lookahead).order(leaves(), &mut pool).unwrap();
        assert_eq!(result.plan.table_refs(), vec!["R", "X", "Y"]);
        assert_eq!(result.plan.count_kind(OperatorKind::Product), 0);
        assert_eq!(result.output.tuple_count, 5);
    }

    #[test]
    fn test_resolved_predicate_applied_above_join() {
        let config = OptimizerConfig::default();
        let leaves = vec![
            leaf("A", 10, &[("a1", 10), ("a2", 10)]),
            leaf("B", 100, &[("b1", 100), ("b2", 100)]),
        ];
        let mut preds = vec![
            Predicate::equals_attribute("a1", "b1"),
            Predicate::equals_attribute("a2", "b2"),
        ];
        let result = JoinOrderer::new(&config).order(leaves, &mut preds).unwrap();
        assert!(preds.is_empty());
        assert_eq!(result.plan.kind(), OperatorKind::Select);
        assert_eq!(result.plan.count_kind(OperatorKind::Join), 1);
    }

    #[test]
    fn test_empty_input() {
        let config = OptimizerConfig::default();
        let mut preds = vec![];
        assert!(JoinOrderer::new(&config).order(vec![], &mut preds).is_err());
    }
}
