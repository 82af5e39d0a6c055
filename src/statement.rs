//! Parameterized INSERT statements.
//!
//! Identifiers (table and column names) are the only text spliced into the
//! SQL and must already have passed [`crate::ident`] validation. Values are
//! always bound positionally.

use std::fmt;

use itertools::Itertools;
use postgres::types::ToSql;

use crate::data::Value;

/// One column of a rendered row: its name, the cast applied to its
/// placeholder (custom types and `numeric`), and the bound value.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundColumn {
    pub name: String,
    pub cast: Option<String>,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    table: String,
    columns: Vec<String>,
    casts: Vec<Option<String>>,
    params: Vec<Value>,
    sql: String,
}

impl InsertStatement {
    pub fn new(table: &str, bound: Vec<BoundColumn>) -> Self {
        let mut columns = Vec::with_capacity(bound.len());
        let mut casts = Vec::with_capacity(bound.len());
        let mut params = Vec::with_capacity(bound.len());
        for column in bound {
            columns.push(column.name);
            casts.push(column.cast);
            params.push(column.value);
        }
        let placeholders = casts
            .iter()
            .enumerate()
            .map(|(idx, cast)| placeholder(idx + 1, cast.as_deref()))
            .join(", ");
        let sql = format!(
            "INSERT INTO {table} ({}) VALUES ({placeholders})",
            columns.iter().join(", ")
        );
        InsertStatement {
            table: table.to_string(),
            columns,
            casts,
            params,
            sql,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn param(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|name| name == column)
            .map(|idx| &self.params[idx])
    }

    pub fn param_refs(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params
            .iter()
            .map(|value| value as &(dyn ToSql + Sync))
            .collect()
    }

    /// The statement with values spelled as escaped literals, for display
    /// only. Execution always goes through [`InsertStatement::sql`].
    pub fn preview(&self) -> String {
        let values = self
            .params
            .iter()
            .zip(&self.casts)
            .map(|(value, cast)| match cast {
                Some(ty) if !value.is_null() => format!("{}::{ty}", value.to_sql_literal()),
                _ => value.to_sql_literal(),
            })
            .join(", ");
        format!(
            "INSERT INTO {} ({}) VALUES ({values});",
            self.table,
            self.columns.iter().join(", ")
        )
    }
}

impl fmt::Display for InsertStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.preview())
    }
}

fn placeholder(position: usize, cast: Option<&str>) -> String {
    match cast {
        // Bind as text so the server performs the conversion.
        Some(ty) => format!("${position}::text::{ty}"),
        None => format!("${position}"),
    }
}
