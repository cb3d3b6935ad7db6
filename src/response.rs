// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! Batch response decoding.
//!
//! A batch response envelope is `{"results": [...], "time": <float>}`. The
//! decoder separates a whole-batch `error` field (fatal, no outcomes) from
//! per-statement errors, and emits exactly one [`Outcome`] per submitted
//! statement, in submission order. Outcome classification is structural:
//! an `error` field makes an error outcome, a `columns` or `values` field
//! makes a query outcome, anything else is a write outcome whose optional
//! fields default to zero.
//!
//! Numbers are read through `serde_json::Number`, which keeps integral and
//! fractional values apart; 64-bit row ids never round-trip through a
//! float.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::rows::QueryRows;

// ---------------------------------------------------------------------------
// Outcome union
// ---------------------------------------------------------------------------

/// The error reported by the store for one statement in a batch.
#[derive(Debug, Clone, Serialize)]
pub struct StatementError {
    /// The store's error text, verbatim.
    pub message: String,
}

impl fmt::Display for StatementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for StatementError {}

/// The result of one write statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct WriteOutcome {
    /// Row id generated by the statement, zero when the store sent none.
    pub last_insert_id: i64,
    /// Rows changed by the statement, zero when the store sent none.
    pub rows_affected: i64,
    /// Server-side execution time in seconds, zero when absent.
    pub time: f64,
}

/// The per-statement result union.
///
/// Every consumption site matches exhaustively; there are no optional
/// fields to probe.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// The statement failed; siblings in the same batch are unaffected.
    Error(StatementError),
    /// The statement changed rows (or was DDL).
    Write(WriteOutcome),
    /// The statement produced a rowset.
    Query(QueryRows),
}

impl Outcome {
    /// The rowset, if this is a query outcome.
    pub fn as_query(&self) -> Option<&QueryRows> {
        match self {
            Outcome::Query(rows) => Some(rows),
            _ => None,
        }
    }

    /// The write counters, if this is a write outcome.
    pub fn as_write(&self) -> Option<&WriteOutcome> {
        match self {
            Outcome::Write(write) => Some(write),
            _ => None,
        }
    }

    /// The statement error, if this statement failed.
    pub fn as_error(&self) -> Option<&StatementError> {
        match self {
            Outcome::Error(error) => Some(error),
            _ => None,
        }
    }

    /// Consume the outcome into its rowset, if it is one.
    pub fn into_query(self) -> Option<QueryRows> {
        match self {
            Outcome::Query(rows) => Some(rows),
            _ => None,
        }
    }

    /// True for [`Outcome::Error`].
    pub fn is_error(&self) -> bool {
        matches!(self, Outcome::Error(_))
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode a batch response body into one outcome per submitted statement.
///
/// # Errors
///
/// - [`Error::Batch`] when the envelope carries a whole-batch error; no
///   outcomes are produced.
/// - [`Error::Decode`] for malformed JSON, a missing `results` array, a
///   result count that differs from `expected`, or a malformed result
///   element.
pub(crate) fn decode_batch(body: &[u8], expected: usize) -> Result<Vec<Outcome>> {
    let doc: Value = serde_json::from_slice(body)
        .map_err(|e| Error::Decode(format!("response body is not valid JSON: {e}")))?;
    let envelope = doc
        .as_object()
        .ok_or_else(|| Error::Decode("response body is not a JSON object".into()))?;

    if let Some(message) = envelope.get("error").and_then(Value::as_str) {
        if !message.is_empty() {
            return Err(Error::Batch(message.to_owned()));
        }
    }

    let results = envelope
        .get("results")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::Decode("results key is missing from response".into()))?;

    if results.len() != expected {
        return Err(Error::Decode(format!(
            "submitted {expected} statements but the response contains {} results",
            results.len()
        )));
    }

    results.iter().map(outcome_from_wire).collect()
}

fn outcome_from_wire(entry: &Value) -> Result<Outcome> {
    let fields = entry
        .as_object()
        .ok_or_else(|| Error::Decode("per-statement result is not a JSON object".into()))?;

    if let Some(message) = fields.get("error").and_then(Value::as_str) {
        return Ok(Outcome::Error(StatementError {
            message: message.to_owned(),
        }));
    }

    if fields.contains_key("columns") || fields.contains_key("values") {
        return Ok(Outcome::Query(QueryRows::from_wire(fields)?));
    }

    // optional fields default to zero, never inferred
    Ok(Outcome::Write(WriteOutcome {
        last_insert_id: fields
            .get("last_insert_id")
            .and_then(Value::as_i64)
            .unwrap_or(0),
        rows_affected: fields
            .get("rows_affected")
            .and_then(Value::as_i64)
            .unwrap_or(0),
        time: fields.get("time").and_then(Value::as_f64).unwrap_or(0.0),
    }))
}
