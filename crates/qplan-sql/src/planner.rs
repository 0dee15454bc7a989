//! SQL to canonical LogicalPlan planner
//!
//! Only conjunctive equality queries are accepted:
//! `SELECT cols | * FROM t1, t2, ... [WHERE p1 AND p2 ...]`. The output is the
//! canonical shape the optimizer expects: a left-deep chain of products in
//! FROM order, one `Select` per conjunct (first conjunct innermost) and a top
//! `Project` unless the projection is `*`.

use crate::expr::Predicate;
use crate::relation::{Attribute, Relation};
use crate::{LogicalPlan, SqlParser};
use qplan_catalog::CatalogProvider;
use qplan_common::{QplanError, Result};
use sqlparser::ast::{
    BinaryOperator, Expr as SqlExpr, GroupByExpr, Query, Select, SelectItem, SetExpr, Statement,
    TableFactor, Value,
};
use std::collections::HashSet;
use std::sync::Arc;

/// SQL Planner producing canonical plans
pub struct SqlPlanner {
    catalog: Arc<dyn CatalogProvider>,
}

/// One side of an equality
enum Operand {
    Column(String),
    Constant(String),
}

impl SqlPlanner {
    pub fn new(catalog: Arc<dyn CatalogProvider>) -> Self {
        Self { catalog }
    }

    pub fn plan(&self, sql: &str) -> Result<LogicalPlan> {
        let statement = SqlParser::parse_statement(sql)?;
        match &statement {
            Statement::Query(q) => self.query_to_plan(q),
            _ => Err(QplanError::Planner("Only SELECT supported".to_string())),
        }
    }

    fn query_to_plan(&self, query: &Query) -> Result<LogicalPlan> {
        if query.with.is_some() {
            return Err(QplanError::Planner("WITH is not supported".to_string()));
        }
        if query.order_by.is_some() {
            return Err(QplanError::Planner("ORDER BY is not supported".to_string()));
        }
        if query.limit.is_some() || query.offset.is_some() || query.fetch.is_some() {
            return Err(QplanError::Planner(
                "LIMIT, OFFSET and FETCH are not supported".to_string(),
            ));
        }
        match query.body.as_ref() {
            SetExpr::Select(select) => self.select_to_plan(select),
            _ => Err(QplanError::Planner("Only SELECT supported".to_string())),
        }
    }

    fn select_to_plan(&self, select: &Select) -> Result<LogicalPlan> {
        if select.distinct.is_some() || select.having.is_some() {
            return Err(QplanError::Planner(
                "DISTINCT and HAVING are not supported".to_string(),
            ));
        }
        let grouped = match &select.group_by {
            GroupByExpr::All(_) => true,
            GroupByExpr::Expressions(exprs, _) => !exprs.is_empty(),
        };
        if grouped {
            return Err(QplanError::Planner("GROUP BY is not supported".to_string()));
        }
        if select.from.is_empty() {
            return Err(QplanError::Planner("FROM clause is required".to_string()));
        }

        let mut plan: Option<LogicalPlan> = None;
        let mut seen = HashSet::new();
        for table in &select.from {
            if !table.joins.is_empty() {
                return Err(QplanError::Planner(
                    "explicit JOIN is not supported, list relations in FROM".to_string(),
                ));
            }
            let scan = self.plan_table(&table.relation)?;
            // attribute names are global, a second scan would duplicate them
            if let LogicalPlan::Scan { table_name, .. } = &scan {
                if !seen.insert(table_name.clone()) {
                    return Err(QplanError::Planner(format!(
                        "relation '{}' appears more than once in FROM",
                        table_name
                    )));
                }
            }
            plan = Some(match plan {
                None => scan,
                Some(left) => LogicalPlan::product(left, scan),
            });
        }
        let mut plan = plan.ok_or_else(|| QplanError::Planner("FROM clause is required".to_string()))?;

        let mut conjuncts = Vec::new();
        if let Some(selection) = &select.selection {
            split_conjunction(selection, &mut conjuncts);
        }
        for conjunct in &conjuncts {
            plan = LogicalPlan::select(plan, to_predicate(conjunct)?);
        }
        tracing::debug!(
            relations = seen.len(),
            conjuncts = conjuncts.len(),
            "planned canonical query"
        );

        match projection_attributes(&select.projection)? {
            Some(attributes) => Ok(LogicalPlan::project(plan, attributes)),
            None => Ok(plan),
        }
    }

    fn plan_table(&self, factor: &TableFactor) -> Result<LogicalPlan> {
        let name = match factor {
            TableFactor::Table { name, .. } => name
                .0
                .last()
                .map(|ident| ident.value.clone())
                .ok_or_else(|| QplanError::Planner("empty table name".to_string()))?,
            _ => {
                return Err(QplanError::Planner(
                    "only base tables are supported in FROM".to_string(),
                ))
            }
        };
        let stats = self
            .catalog
            .table_statistics(&name)
            .ok_or_else(|| QplanError::NotFound(format!("relation '{}'", name)))?;
        Ok(LogicalPlan::scan(name, Relation::from(&stats)))
    }
}

fn split_conjunction<'a>(expr: &'a SqlExpr, out: &mut Vec<&'a SqlExpr>) {
    match expr {
        SqlExpr::BinaryOp {
            left,
            op: BinaryOperator::And,
            right,
        } => {
            split_conjunction(left, out);
            split_conjunction(right, out);
        }
        SqlExpr::Nested(inner) => split_conjunction(inner, out),
        _ => out.push(expr),
    }
}

fn to_predicate(expr: &SqlExpr) -> Result<Predicate> {
    match expr {
        SqlExpr::BinaryOp {
            left,
            op: BinaryOperator::Eq,
            right,
        } => match (to_operand(left)?, to_operand(right)?) {
            (Operand::Column(l), Operand::Column(r)) => Ok(Predicate::equals_attribute(l, r)),
            (Operand::Column(c), Operand::Constant(v)) | (Operand::Constant(v), Operand::Column(c)) => {
                Ok(Predicate::equals_constant(c, v))
            }
            (Operand::Constant(_), Operand::Constant(_)) => Err(QplanError::Planner(format!(
                "predicate '{}' does not reference a column",
                expr
            ))),
        },
        SqlExpr::Nested(inner) => to_predicate(inner),
        _ => Err(QplanError::Planner(format!(
            "only equality predicates joined by AND are supported, got '{}'",
            expr
        ))),
    }
}

fn to_operand(expr: &SqlExpr) -> Result<Operand> {
    match expr {
        SqlExpr::Identifier(ident) => Ok(Operand::Column(ident.value.clone())),
        // Attribute names are global, the qualifier only documents the source
        SqlExpr::CompoundIdentifier(idents) => idents
            .last()
            .map(|ident| Operand::Column(ident.value.clone()))
            .ok_or_else(|| QplanError::Planner("empty column reference".to_string())),
        SqlExpr::Value(value) => match value {
            Value::Number(n, _) => Ok(Operand::Constant(n.clone())),
            Value::SingleQuotedString(s) => Ok(Operand::Constant(s.clone())),
            Value::Boolean(b) => Ok(Operand::Constant(b.to_string())),
            other => Err(QplanError::Planner(format!("unsupported literal '{}'", other))),
        },
        SqlExpr::Nested(inner) => to_operand(inner),
        other => Err(QplanError::Planner(format!(
            "unsupported operand '{}'",
            other
        ))),
    }
}

/// `None` for a star query
fn projection_attributes(items: &[SelectItem]) -> Result<Option<Vec<Attribute>>> {
    if let [SelectItem::Wildcard(_)] = items {
        return Ok(None);
    }
    let mut attributes = Vec::with_capacity(items.len());
    for item in items {
        match item {
            SelectItem::UnnamedExpr(expr) => match to_operand(expr)? {
                Operand::Column(name) => {
                    let attr = Attribute::named(name);
                    if !attributes.contains(&attr) {
                        attributes.push(attr);
                    }
                }
                Operand::Constant(_) => {
                    return Err(QplanError::Planner(
                        "constant projections are not supported".to_string(),
                    ))
                }
            },
            _ => {
                return Err(QplanError::Planner(
                    "projection must be '*' or a list of columns".to_string(),
                ))
            }
        }
    }
    Ok(Some(attributes))
}
