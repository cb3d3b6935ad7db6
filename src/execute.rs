// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! Write batch execution against `POST /db/execute`.
//!
//! DDL and DML (CREATE, INSERT, UPDATE, DELETE, ...) go through
//! [`RepliSqlClient::execute`]. Queued writes trade durability guarantees
//! for throughput: the store acknowledges with a sequence number before the
//! batch is applied.

use serde_json::Value;
use tracing::debug;

use crate::client::{Operation, RepliSqlClient};
use crate::error::{Error, Result};
use crate::response::WriteOutcome;
use crate::statement::Statement;

impl RepliSqlClient {
    /// Execute a batch of write statements in one round trip.
    ///
    /// Returns one [`WriteOutcome`] per statement, in submission order. If
    /// any statement fails, the call returns [`Error::Statements`] carrying
    /// the complete outcome array.
    pub async fn execute<S>(&self, statements: Vec<S>) -> Result<Vec<WriteOutcome>>
    where
        S: Into<Statement>,
    {
        let statements: Vec<Statement> = statements.into_iter().map(Into::into).collect();
        debug!(client = %self.id(), statements = statements.len(), "execute batch");
        let outcomes = self.run_batch(Operation::Execute, &statements).await?;
        outcomes
            .into_iter()
            .map(|outcome| {
                outcome.as_write().copied().ok_or_else(|| {
                    Error::Decode("non-write result on the execute endpoint".into())
                })
            })
            .collect()
    }

    /// Execute a single write statement.
    pub async fn execute_one(&self, statement: impl Into<Statement>) -> Result<WriteOutcome> {
        let mut results = self.execute(vec![statement.into()]).await?;
        results
            .pop()
            .ok_or_else(|| Error::Decode("empty results for a one-statement batch".into()))
    }

    /// Queue a batch of write statements for asynchronous application and
    /// return the store's sequence number for the queued batch.
    pub async fn queue<S>(&self, statements: Vec<S>) -> Result<i64>
    where
        S: Into<Statement>,
    {
        self.ensure_open()?;
        let statements: Vec<Statement> = statements.into_iter().map(Into::into).collect();
        debug!(client = %self.id(), statements = statements.len(), "queued write batch");
        let body = crate::statement::encode_batch(&statements, Operation::Queue)?;
        let raw = self.dispatch(Operation::Queue, Some(&body)).await?;
        let doc: Value = serde_json::from_slice(&raw)
            .map_err(|e| Error::Decode(format!("response body is not valid JSON: {e}")))?;
        doc.get("sequence_number")
            .and_then(Value::as_i64)
            .ok_or_else(|| Error::Decode("queued write response has no sequence_number".into()))
    }
}
