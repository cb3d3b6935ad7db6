// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! SQL statements and wire batch encoding.
//!
//! A batch is sent as a JSON array with one element per statement. A plain
//! statement encodes as a bare SQL string; a parameterized statement as
//! `[sql, arg1, arg2, ...]`; a statement that captures `RETURNING` rows as
//! `[true, sql, arg1, ...]`. Positional arguments pass through as
//! `serde_json::Value`, so 64-bit integers keep their full precision.

use serde_json::Value;

use crate::client::Operation;
use crate::error::{Error, Result};

/// A single SQL statement with positional arguments.
///
/// `Statement` converts from `&str` and `String`, so plain SQL can be
/// submitted without ceremony:
///
/// ```rust
/// use replisql_client::statement::Statement;
///
/// let plain: Statement = "SELECT 1".into();
/// assert_eq!(plain.sql(), "SELECT 1");
///
/// let bound = Statement::new("INSERT INTO crew (id, name) VALUES (?, ?)")
///     .bind(1)
///     .bind("Dax");
/// assert_eq!(bound.arguments().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Statement {
    sql: String,
    arguments: Vec<Value>,
    returning: bool,
}

impl Statement {
    /// A statement with no arguments.
    pub fn new(sql: impl Into<String>) -> Self {
        Statement {
            sql: sql.into(),
            arguments: Vec::new(),
            returning: false,
        }
    }

    /// Append one positional argument.
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.arguments.push(value.into());
        self
    }

    /// Mark this statement as capturing rows produced by a `RETURNING`
    /// clause. Only legal on the unified endpoint; see
    /// [`RepliSqlClient::request`](crate::client::RepliSqlClient).
    pub fn returning(mut self, returning: bool) -> Self {
        self.returning = returning;
        self
    }

    /// The SQL text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The positional arguments, in bind order.
    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }

    /// Whether the returning flag is set.
    pub fn wants_returning(&self) -> bool {
        self.returning
    }
}

impl From<&str> for Statement {
    fn from(sql: &str) -> Self {
        Statement::new(sql)
    }
}

impl From<String> for Statement {
    fn from(sql: String) -> Self {
        Statement::new(sql)
    }
}

/// Encode a batch into its wire body for the given operation.
///
/// # Errors
///
/// Returns [`Error::Validation`] when a statement sets the returning flag
/// but the operation is not the unified read/write endpoint.
pub(crate) fn encode_batch(statements: &[Statement], op: Operation) -> Result<Value> {
    let mut body = Vec::with_capacity(statements.len());
    for statement in statements {
        if statement.returning && !op.supports_returning() {
            return Err(Error::Validation(format!(
                "RETURNING capture is only available on the unified endpoint (statement: {})",
                statement.sql
            )));
        }
        if statement.arguments.is_empty() && !statement.returning {
            body.push(Value::String(statement.sql.clone()));
        } else {
            let mut parts = Vec::with_capacity(1 + statement.arguments.len());
            if statement.returning {
                parts.push(Value::Bool(true));
            }
            parts.push(Value::String(statement.sql.clone()));
            parts.extend(statement.arguments.iter().cloned());
            body.push(Value::Array(parts));
        }
    }
    Ok(Value::Array(body))
}
