// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! Read-only batch execution against `POST /db/query`.

use tracing::debug;

use crate::client::{Operation, RepliSqlClient};
use crate::error::{Error, Result};
use crate::rows::QueryRows;
use crate::statement::Statement;

impl RepliSqlClient {
    /// Execute a batch of read-only statements in one round trip.
    ///
    /// Returns one [`QueryRows`] per statement, in submission order. If any
    /// statement fails, the call returns [`Error::Statements`]; the failure
    /// value still carries the complete outcome array, so sibling results
    /// remain reachable.
    pub async fn query<S>(&self, statements: Vec<S>) -> Result<Vec<QueryRows>>
    where
        S: Into<Statement>,
    {
        let statements: Vec<Statement> = statements.into_iter().map(Into::into).collect();
        debug!(client = %self.id(), statements = statements.len(), "query batch");
        let outcomes = self.run_batch(Operation::Query, &statements).await?;
        outcomes
            .into_iter()
            .map(|outcome| {
                outcome
                    .into_query()
                    .ok_or_else(|| Error::Decode("non-query result on the query endpoint".into()))
            })
            .collect()
    }

    /// Execute a single read-only statement.
    pub async fn query_one(&self, statement: impl Into<Statement>) -> Result<QueryRows> {
        let mut results = self.query(vec![statement.into()]).await?;
        results
            .pop()
            .ok_or_else(|| Error::Decode("empty results for a one-statement batch".into()))
    }
}
