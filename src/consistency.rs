// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! Read-consistency levels.
//!
//! The level only affects the `level=` query parameter sent to the store;
//! it never changes client-side behavior.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// The read-freshness mode requested from the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsistencyLevel {
    /// No consistency guarantee; the receiving node answers from its own
    /// copy of the data.
    None,
    /// Reads are serviced by the leader, without a Raft round-trip.
    #[default]
    Weak,
    /// Reads reflect all writes committed before the read was received.
    Linearizable,
    /// Reads go through the Raft log and reflect every committed write.
    Strong,
}

impl ConsistencyLevel {
    /// The wire spelling used in the `level=` query parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            ConsistencyLevel::None => "none",
            ConsistencyLevel::Weak => "weak",
            ConsistencyLevel::Linearizable => "linearizable",
            ConsistencyLevel::Strong => "strong",
        }
    }
}

impl fmt::Display for ConsistencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConsistencyLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(ConsistencyLevel::None),
            "weak" => Ok(ConsistencyLevel::Weak),
            "linearizable" => Ok(ConsistencyLevel::Linearizable),
            "strong" => Ok(ConsistencyLevel::Strong),
            other => Err(Error::Validation(format!(
                "unknown consistency level: {other}"
            ))),
        }
    }
}
