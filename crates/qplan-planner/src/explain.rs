//! Plan inspection
//!
//! Renders a plan as an indented tree, one operator per line, with the
//! estimated tuple count and distinct counts of each node's output.

use crate::stats_derivation::{annotate, AnnotatedPlan};
use qplan_common::Result;
use qplan_sql::{LogicalPlan, Relation};
use std::fmt;

/// Render an annotated plan
pub fn explain(annotated: &AnnotatedPlan<'_>) -> String {
    annotated.to_string()
}

/// Estimate `plan` and render it
pub fn explain_plan(plan: &LogicalPlan) -> Result<String> {
    Ok(explain(&annotate(plan)?))
}

fn operator_label(plan: &LogicalPlan) -> String {
    match plan {
        LogicalPlan::Scan { table_name, .. } => format!("Scan {}", table_name),
        LogicalPlan::Select { predicate, .. } => format!("Select [{}]", predicate),
        LogicalPlan::Project { attributes, .. } => {
            let names: Vec<&str> = attributes.iter().map(|a| a.name()).collect();
            format!("Project [{}]", names.join(", "))
        }
        LogicalPlan::Product { .. } => "Product".to_string(),
        LogicalPlan::Join { predicate, .. } => format!("Join [{}]", predicate),
    }
}

fn statistics_label(output: &Relation) -> String {
    let distinct: Vec<String> = output
        .attributes
        .iter()
        .map(|a| format!("{}={}", a.name(), a.distinct_count))
        .collect();
    format!("rows={}; {}", output.tuple_count, distinct.join(", "))
}

fn write_node(f: &mut fmt::Formatter<'_>, node: &AnnotatedPlan<'_>, depth: usize) -> fmt::Result {
    writeln!(
        f,
        "{:indent$}{}  ({})",
        "",
        operator_label(node.plan),
        statistics_label(&node.output),
        indent = depth * 2
    )?;
    for input in &node.inputs {
        write_node(f, input, depth + 1)?;
    }
    Ok(())
}

impl fmt::Display for AnnotatedPlan<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_node(f, self, 0)
    }
}
