// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! Error types for the RepliSQL client SDK.
//!
//! All fallible operations in this crate return [`Result<T>`], an alias for
//! `std::result::Result<T, Error>`. Aggregate failures stay inspectable:
//! [`DispatchTrail`] records why every peer was rejected during a dispatch,
//! and [`StatementFailures`] carries the complete per-statement outcome
//! array so callers can see which statements succeeded despite the batch
//! failing as a whole.

use std::fmt;

use thiserror::Error;

use crate::response::{Outcome, StatementError};

/// Comprehensive error type for RepliSQL client operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The client has been closed. Closing is terminal; no operation
    /// resurrects a closed client.
    #[error("connection is closed")]
    Closed,

    /// Topology discovery could not resolve a cluster leader.
    #[error("cluster discovery failed: {0}")]
    Discovery(String),

    /// Every peer in the directory failed. The trail lists one entry per
    /// peer with the reason it was rejected.
    #[error("{0}")]
    Exhausted(DispatchTrail),

    /// The store rejected the whole batch. No per-statement outcomes exist.
    #[error("batch rejected by the cluster: {0}")]
    Batch(String),

    /// One or more statements in the batch failed. Sibling outcomes remain
    /// valid and are carried inside the failure value.
    #[error(transparent)]
    Statements(StatementFailures),

    /// The response envelope was malformed or had an unexpected shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// Client-side validation failed before any request was sent.
    #[error("validation error: {0}")]
    Validation(String),

    /// A row value could not be coerced into the requested destination kind.
    #[error("cannot scan column {column} into {expected}: found {found}")]
    ScanMismatch {
        /// The column whose value was rejected.
        column: String,
        /// The destination kind that was requested.
        expected: &'static str,
        /// A short description of the source value.
        found: String,
    },

    /// The row cursor was used out of order: access before the first
    /// advance, or a destination count that does not match the column count.
    #[error("cursor error: {0}")]
    Cursor(String),

    /// An HTTP transport error outside the peer-failover loop, e.g. while
    /// building the underlying client.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Crate-level result alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

// ---------------------------------------------------------------------------
// DispatchTrail
// ---------------------------------------------------------------------------

/// One rejected attempt against a single peer.
#[derive(Debug, Clone)]
pub struct TrailEntry {
    /// The peer URL the attempt targeted, with any password redacted.
    pub peer: String,
    /// Why the attempt failed (transport error, HTTP status, bad redirect).
    pub reason: String,
}

/// The diagnostic trail accumulated while walking the peer directory.
///
/// Rendered as one readable line per peer. Redirect follows are recorded as
/// informational entries but do not by themselves mean a peer failed.
#[derive(Debug, Clone, Default)]
pub struct DispatchTrail {
    entries: Vec<TrailEntry>,
}

impl DispatchTrail {
    pub(crate) fn record(&mut self, peer: String, reason: String) {
        self.entries.push(TrailEntry { peer, reason });
    }

    /// All recorded entries, in the order the attempts were made.
    pub fn entries(&self) -> &[TrailEntry] {
        &self.entries
    }
}

impl fmt::Display for DispatchTrail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tried all cluster peers unsuccessfully:")?;
        for (index, entry) in self.entries.iter().enumerate() {
            write!(f, "\n  peer #{index} {}: {}", entry.peer, entry.reason)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// StatementFailures
// ---------------------------------------------------------------------------

/// The joined error produced when at least one statement in a batch failed.
///
/// Owns the complete per-statement [`Outcome`] array in submission order,
/// so callers can enumerate failing statements by index and still reach the
/// sibling results that succeeded.
#[derive(Debug)]
pub struct StatementFailures {
    /// One outcome per submitted statement, positionally aligned.
    pub outcomes: Vec<Outcome>,
}

impl StatementFailures {
    /// Iterate over the failed statements as `(index, error)` pairs.
    pub fn errors(&self) -> impl Iterator<Item = (usize, &StatementError)> {
        self.outcomes
            .iter()
            .enumerate()
            .filter_map(|(index, outcome)| match outcome {
                Outcome::Error(error) => Some((index, error)),
                _ => None,
            })
    }

    /// True if any failed statement satisfies `predicate`.
    pub fn any(&self, predicate: impl Fn(&StatementError) -> bool) -> bool {
        self.errors().any(|(_, error)| predicate(error))
    }
}

impl fmt::Display for StatementFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} statements failed",
            self.errors().count(),
            self.outcomes.len()
        )?;
        for (index, error) in self.errors() {
            write!(f, "\n  statement #{index}: {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for StatementFailures {}
