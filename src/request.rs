// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! The unified read/write endpoint, `POST /db/request`.
//!
//! Unlike the dedicated query and execute endpoints, a unified batch may
//! mix reads and writes, so results come back as the full [`Outcome`]
//! union. This is also the only endpoint where a statement may set the
//! returning flag to capture rows produced by a `RETURNING` clause.

use tracing::debug;

use crate::client::{Operation, RepliSqlClient};
use crate::error::Result;
use crate::response::Outcome;
use crate::statement::Statement;

impl RepliSqlClient {
    /// Execute a mixed read/write batch in one round trip.
    ///
    /// Returns one [`Outcome`] per statement, in submission order; match on
    /// the union to tell rowsets from write counters. If any statement
    /// fails, the call returns
    /// [`Error::Statements`](crate::error::Error::Statements) carrying the
    /// complete outcome array, so the statements that succeeded remain
    /// reachable.
    ///
    /// ```rust,no_run
    /// use replisql_client::response::Outcome;
    /// use replisql_client::statement::Statement;
    ///
    /// # async fn demo(client: &replisql_client::client::RepliSqlClient)
    /// # -> replisql_client::error::Result<()> {
    /// let outcomes = client
    ///     .request(vec![
    ///         Statement::new("INSERT INTO crew (name) VALUES (?) RETURNING id")
    ///             .bind("Kira")
    ///             .returning(true),
    ///         Statement::new("SELECT COUNT(*) FROM crew"),
    ///     ])
    ///     .await?;
    /// for outcome in &outcomes {
    ///     match outcome {
    ///         Outcome::Query(rows) => println!("{} rows", rows.num_rows()),
    ///         Outcome::Write(write) => println!("{} affected", write.rows_affected),
    ///         Outcome::Error(error) => println!("failed: {error}"),
    ///     }
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn request<S>(&self, statements: Vec<S>) -> Result<Vec<Outcome>>
    where
        S: Into<Statement>,
    {
        let statements: Vec<Statement> = statements.into_iter().map(Into::into).collect();
        debug!(client = %self.id(), statements = statements.len(), "unified batch");
        self.run_batch(Operation::Request, &statements).await
    }
}
