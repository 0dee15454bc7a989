//! Statistics Derivation Module
//!
//! Derives the output statistics (tuple count and per-attribute distinct
//! counts) of every operator bottom-up from its inputs' statistics. The plan
//! itself is never modified: results are returned either as the root's
//! `Relation` or as an `AnnotatedPlan` mirroring the tree.
//!
//! Missing attributes are the only failure and surface as
//! `QplanError::AttributeResolution`.

use qplan_common::{OperatorKind, QplanError, Result};
use qplan_sql::{Attribute, LogicalPlan, Predicate, Relation};

/// Trait for deriving statistics for a logical plan node
pub trait StatsDerivator {
    fn derive(&self, input_stats: &[&Relation]) -> Result<Relation>;
}

/// Derivator for Scan: the catalogue statistics, copied verbatim
pub struct ScanStatsDerivator<'a> {
    pub relation: &'a Relation,
}

impl<'a> StatsDerivator for ScanStatsDerivator<'a> {
    fn derive(&self, _input_stats: &[&Relation]) -> Result<Relation> {
        Ok(self.relation.clone())
    }
}

/// Derivator for Project
pub struct ProjectStatsDerivator<'a> {
    pub attributes: &'a [Attribute],
}

impl<'a> StatsDerivator for ProjectStatsDerivator<'a> {
    fn derive(&self, input_stats: &[&Relation]) -> Result<Relation> {
        let input = unary_input(input_stats, OperatorKind::Project)?;
        let tuple_count = input.tuple_count;

        let attributes = self
            .attributes
            .iter()
            .map(|attr| {
                let found = resolve(input, attr, OperatorKind::Project)?;
                Ok(found.with_distinct_count(found.distinct_count.min(tuple_count)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Relation::new(tuple_count, attributes))
    }
}

/// Derivator for Select
pub struct SelectStatsDerivator<'a> {
    pub predicate: &'a Predicate,
}

impl<'a> StatsDerivator for SelectStatsDerivator<'a> {
    fn derive(&self, input_stats: &[&Relation]) -> Result<Relation> {
        let input = unary_input(input_stats, OperatorKind::Select)?;

        match self.predicate {
            Predicate::EqualsConstant { attribute, .. } => {
                let selected = resolve(input, attribute, OperatorKind::Select)?;
                let tuple_count = divide_rows(input.tuple_count, selected.distinct_count);

                let attributes = input
                    .attributes
                    .iter()
                    .map(|a| {
                        if a == attribute {
                            // a single value survives an equality filter
                            a.with_distinct_count(1)
                        } else {
                            a.with_distinct_count(a.distinct_count.min(tuple_count))
                        }
                    })
                    .collect();

                Ok(Relation::new(tuple_count, attributes))
            }
            Predicate::EqualsAttribute { left, right } => {
                let d1 = resolve(input, left, OperatorKind::Select)?.distinct_count;
                let d2 = resolve(input, right, OperatorKind::Select)?.distinct_count;
                let tuple_count = divide_rows(input.tuple_count, d1.max(d2));
                let joined = d1.min(d2).min(tuple_count);

                let attributes = input
                    .attributes
                    .iter()
                    .map(|a| {
                        if a == left || a == right {
                            a.with_distinct_count(joined)
                        } else {
                            a.with_distinct_count(a.distinct_count.min(tuple_count))
                        }
                    })
                    .collect();

                Ok(Relation::new(tuple_count, attributes))
            }
        }
    }
}

/// Derivator for Product
pub struct ProductStatsDerivator;

impl StatsDerivator for ProductStatsDerivator {
    fn derive(&self, input_stats: &[&Relation]) -> Result<Relation> {
        let (left, right) = binary_inputs(input_stats, OperatorKind::Product)?;
        let tuple_count = left.tuple_count.saturating_mul(right.tuple_count);

        let attributes = left
            .attributes
            .iter()
            .chain(right.attributes.iter())
            .map(|a| a.with_distinct_count(a.distinct_count.min(tuple_count)))
            .collect();

        Ok(Relation::new(tuple_count, attributes))
    }
}

/// Derivator for Join
///
/// The predicate must be an `EqualsAttribute`; the optimizer only ever builds
/// joins from equi-join candidates. Any other predicate is a construction
/// error reported as `InvalidArgument`, never an estimation result.
pub struct JoinStatsDerivator<'a> {
    pub predicate: &'a Predicate,
}

impl<'a> StatsDerivator for JoinStatsDerivator<'a> {
    fn derive(&self, input_stats: &[&Relation]) -> Result<Relation> {
        let (left, right) = binary_inputs(input_stats, OperatorKind::Join)?;
        let Predicate::EqualsAttribute {
            left: attr1,
            right: attr2,
        } = self.predicate
        else {
            return Err(QplanError::InvalidArgument(format!(
                "join predicate '{}' must compare two attributes",
                self.predicate
            )));
        };

        let (left_key, right_key) = resolve_join_keys(left, right, attr1, attr2)?;
        let (d_left, d_right) = (left_key.distinct_count, right_key.distinct_count);

        let cross = left.tuple_count.saturating_mul(right.tuple_count);
        let tuple_count = divide_rows(cross, d_left.max(d_right));
        let joined = d_left.min(d_right).min(tuple_count);

        let clamp = |a: &Attribute, key: &Attribute| {
            if a == key {
                a.with_distinct_count(joined)
            } else {
                a.with_distinct_count(a.distinct_count.min(tuple_count))
            }
        };
        let mut attributes: Vec<Attribute> =
            left.attributes.iter().map(|a| clamp(a, left_key)).collect();
        attributes.extend(right.attributes.iter().map(|a| clamp(a, right_key)));

        Ok(Relation::new(tuple_count, attributes))
    }
}

// Helpers

/// `max(1, rows / divisor)` with the divisor floored to 1.
///
/// The clamp does not distinguish an estimate that rounded down to zero from a
/// genuinely empty input.
fn divide_rows(rows: u64, divisor: u64) -> u64 {
    (rows / divisor.max(1)).max(1)
}

fn resolve<'r>(input: &'r Relation, attr: &Attribute, operator: OperatorKind) -> Result<&'r Attribute> {
    input
        .find(attr)
        .ok_or_else(|| QplanError::attribute_resolution(attr.name(), operator))
}

/// Match the predicate's operands to the join inputs, trying the swapped
/// orientation when the direct one does not resolve on both sides.
fn resolve_join_keys<'r>(
    left: &'r Relation,
    right: &'r Relation,
    attr1: &Attribute,
    attr2: &Attribute,
) -> Result<(&'r Attribute, &'r Attribute)> {
    if let (Some(l), Some(r)) = (left.find(attr1), right.find(attr2)) {
        return Ok((l, r));
    }
    if let (Some(l), Some(r)) = (left.find(attr2), right.find(attr1)) {
        return Ok((l, r));
    }
    // Prefer an attribute found nowhere; otherwise both sit on one side and
    // the other side lacks its operand.
    let missing = [attr1, attr2]
        .into_iter()
        .find(|a| !left.contains(a) && !right.contains(a))
        .unwrap_or(if left.contains(attr1) { attr2 } else { attr1 });
    Err(QplanError::attribute_resolution(missing.name(), OperatorKind::Join))
}

fn unary_input<'r>(input_stats: &[&'r Relation], operator: OperatorKind) -> Result<&'r Relation> {
    match input_stats {
        [input] => Ok(*input),
        _ => Err(QplanError::InvalidArgument(format!(
            "{} expects one input, got {}",
            operator,
            input_stats.len()
        ))),
    }
}

fn binary_inputs<'r>(
    input_stats: &[&'r Relation],
    operator: OperatorKind,
) -> Result<(&'r Relation, &'r Relation)> {
    match input_stats {
        [left, right] => Ok((*left, *right)),
        _ => Err(QplanError::InvalidArgument(format!(
            "{} expects two inputs, got {}",
            operator,
            input_stats.len()
        ))),
    }
}

/// Derive one node's statistics from its children's already-derived ones
pub fn derive_node(plan: &LogicalPlan, input_stats: &[&Relation]) -> Result<Relation> {
    match plan {
        LogicalPlan::Scan { relation, .. } => ScanStatsDerivator { relation }.derive(input_stats),
        LogicalPlan::Select { predicate, .. } => {
            SelectStatsDerivator { predicate }.derive(input_stats)
        }
        LogicalPlan::Project { attributes, .. } => {
            ProjectStatsDerivator { attributes }.derive(input_stats)
        }
        LogicalPlan::Product { .. } => ProductStatsDerivator.derive(input_stats),
        LogicalPlan::Join { predicate, .. } => JoinStatsDerivator { predicate }.derive(input_stats),
    }
}

/// Recursively derive the output statistics of a LogicalPlan
pub fn derive_stats(plan: &LogicalPlan) -> Result<Relation> {
    let inputs = plan
        .inputs()
        .into_iter()
        .map(derive_stats)
        .collect::<Result<Vec<_>>>()?;
    let input_stats: Vec<&Relation> = inputs.iter().collect();
    derive_node(plan, &input_stats)
}

/// A plan node paired with its derived output statistics
#[derive(Debug, Clone)]
pub struct AnnotatedPlan<'a> {
    pub plan: &'a LogicalPlan,
    pub output: Relation,
    pub inputs: Vec<AnnotatedPlan<'a>>,
}

impl<'a> AnnotatedPlan<'a> {
    pub fn kind(&self) -> OperatorKind {
        self.plan.kind()
    }

    /// Nodes in pre-order
    pub fn nodes(&self) -> Vec<&AnnotatedPlan<'a>> {
        let mut out = vec![self];
        for input in &self.inputs {
            out.extend(input.nodes());
        }
        out
    }
}

/// Derive statistics for every node of `plan`
pub fn annotate(plan: &LogicalPlan) -> Result<AnnotatedPlan<'_>> {
    let inputs = plan
        .inputs()
        .into_iter()
        .map(annotate)
        .collect::<Result<Vec<_>>>()?;
    let input_stats: Vec<&Relation> = inputs.iter().map(|a| &a.output).collect();
    let output = derive_node(plan, &input_stats)?;
    Ok(AnnotatedPlan {
        plan,
        output,
        inputs,
    })
}
