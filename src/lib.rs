// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! # RepliSQL Client SDK
//!
//! A Rust client library for RepliSQL, a distributed, Raft-replicated SQL
//! store reachable over HTTP. The SDK locates the current cluster leader,
//! fails over across peers transparently when nodes die or leadership moves,
//! and maps the store's loosely-typed JSON results onto strongly-typed
//! Rust values through a forward-only row cursor.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use replisql_client::client::RepliSqlClient;
//!
//! #[tokio::main]
//! async fn main() -> replisql_client::error::Result<()> {
//!     let client = RepliSqlClient::connect("http://localhost:4001").await?;
//!
//!     client.execute_one("CREATE TABLE crew (id INTEGER, name TEXT)").await?;
//!
//!     let mut rows = client.query_one("SELECT id, name FROM crew").await?;
//!     while rows.next() {
//!         let (id, name): (i64, String) = rows.scan()?;
//!         println!("{id}: {name}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`client`] — Connection configuration, the request dispatcher, and the
//!   peer failover engine.
//! - [`config`] — Connection-string parsing and connection defaults.
//! - [`consistency`] — Read-consistency levels carried on the wire.
//! - [`cluster`] — Peer directory and topology discovery.
//! - [`statement`] — SQL statements, positional arguments, and batch encoding.
//! - [`response`] — Batch response decoding and the per-statement outcome
//!   union.
//! - [`rows`] — The forward-only row cursor and type-directed scanning.
//! - [`query`] — Read-only batch execution.
//! - [`execute`] — Write batch execution and queued writes.
//! - [`request`] — The unified read/write endpoint.
//! - [`error`] — Error types and the crate-level `Result` alias.

pub mod client;
pub mod cluster;
pub mod config;
pub mod consistency;
pub mod error;
pub mod execute;
pub mod query;
pub mod request;
pub mod response;
pub mod rows;
pub mod statement;
