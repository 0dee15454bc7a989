//! SQL Parser wrapper

use qplan_common::{QplanError, Result};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

/// SQL Parser wrapper
pub struct SqlParser;

impl SqlParser {
    /// Parse SQL into AST
    pub fn parse(sql: &str) -> Result<Vec<sqlparser::ast::Statement>> {
        let dialect = GenericDialect {};
        Parser::parse_sql(&dialect, sql).map_err(|e| QplanError::SqlParse(e.to_string()))
    }

    /// Parse exactly one SQL statement
    pub fn parse_statement(sql: &str) -> Result<sqlparser::ast::Statement> {
        let mut statements = Self::parse(sql)?;
        match statements.len() {
            0 => Err(QplanError::SqlParse("Empty SQL".to_string())),
            1 => Ok(statements.remove(0)),
            n => Err(QplanError::SqlParse(format!(
                "expected a single statement, found {}",
                n
            ))),
        }
    }
}
