// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! The forward-only row cursor and type-directed scanning.
//!
//! [`QueryRows`] iterates over one statement's rowset. The cursor starts
//! before the first row, advances with [`QueryRows::next`], and never
//! rewinds; a fresh query is the only way to restart iteration. Row access
//! is type-directed: [`QueryRows::scan`] coerces the current row into a
//! tuple of destination types, [`QueryRows::get`] reads a single column,
//! and [`QueryRows::map`] produces a column-name keyed view.
//!
//! Null handling is explicit: a JSON null scans into `Option::None` for
//! any nullable destination rather than failing. Coercions accept values
//! that are directly compatible or losslessly convertible (numbers carried
//! as strings, Unix epochs, date/time strings, textual booleans) and
//! reject everything else with a mismatch error naming the column.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// CellValue
// ---------------------------------------------------------------------------

/// A single cell as produced by [`QueryRows::map`].
///
/// The timestamp variant comes from a best-effort heuristic: a column whose
/// declared type contains a `date` or `time` substring is opportunistically
/// parsed. The declared types are whatever the schema author wrote, so the
/// heuristic can misfire; use [`QueryRows::raw_row`] to read the wire value
/// untransformed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CellValue {
    /// SQL NULL.
    Null,
    /// An integral number.
    Integer(i64),
    /// A fractional number.
    Float(f64),
    /// A text value.
    Text(String),
    /// A boolean value.
    Bool(bool),
    /// A value parsed by the date/time column heuristic.
    Timestamp(DateTime<Utc>),
}

fn cell_from_json(value: &Value) -> Result<CellValue> {
    match value {
        Value::Null => Ok(CellValue::Null),
        Value::Bool(b) => Ok(CellValue::Bool(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(CellValue::Integer(i))
            } else if let Some(f) = n.as_f64() {
                Ok(CellValue::Float(f))
            } else {
                Err(Error::Decode(format!("integer out of range: {n}")))
            }
        }
        Value::String(s) => Ok(CellValue::Text(s.clone())),
        Value::Array(_) | Value::Object(_) => Err(Error::Decode(
            "row values cannot be JSON arrays or objects".into(),
        )),
    }
}

// ---------------------------------------------------------------------------
// QueryRows
// ---------------------------------------------------------------------------

/// The rowset produced by one query statement, with a forward-only cursor.
#[derive(Debug, Clone)]
pub struct QueryRows {
    columns: Vec<String>,
    types: Vec<String>,
    values: Vec<Vec<Value>>,
    time: f64,
    cursor: Option<usize>,
}

impl QueryRows {
    /// Build a rowset from one per-statement wire object.
    pub(crate) fn from_wire(fields: &Map<String, Value>) -> Result<Self> {
        let columns: Vec<String> = match fields.get("columns") {
            None => Vec::new(),
            Some(value) => value
                .as_array()
                .ok_or_else(|| Error::Decode("columns is not an array".into()))?
                .iter()
                .map(|column| {
                    column
                        .as_str()
                        .map(str::to_owned)
                        .ok_or_else(|| Error::Decode("column name is not a string".into()))
                })
                .collect::<Result<_>>()?,
        };

        // declared types can be null for expression columns
        let mut types: Vec<String> = fields
            .get("types")
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .map(|t| t.as_str().unwrap_or_default().to_owned())
                    .collect()
            })
            .unwrap_or_default();
        types.resize(columns.len(), String::new());

        let values: Vec<Vec<Value>> = match fields.get("values") {
            None | Some(Value::Null) => Vec::new(),
            Some(value) => {
                let rows = value
                    .as_array()
                    .ok_or_else(|| Error::Decode("values is not an array".into()))?;
                rows.iter()
                    .map(|row| {
                        let cells = row
                            .as_array()
                            .ok_or_else(|| Error::Decode("row is not an array".into()))?;
                        if cells.len() != columns.len() {
                            return Err(Error::Decode(format!(
                                "row has {} values but {} columns were declared",
                                cells.len(),
                                columns.len()
                            )));
                        }
                        Ok(cells.clone())
                    })
                    .collect::<Result<_>>()?
            }
        };

        Ok(QueryRows {
            columns,
            types,
            values,
            time: fields.get("time").and_then(Value::as_f64).unwrap_or(0.0),
            cursor: None,
        })
    }

    /// Column names, in declaration order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Declared column types, as reported by the store. The store echoes
    /// whatever the schema author wrote, so these are hints, not truth.
    pub fn types(&self) -> &[String] {
        &self.types
    }

    /// Total number of rows in the set.
    pub fn num_rows(&self) -> usize {
        self.values.len()
    }

    /// The current row index, or `None` before the first [`next`](Self::next).
    pub fn row_number(&self) -> Option<usize> {
        self.cursor
    }

    /// Server-side execution time for this statement, in seconds.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Advance to the next row. Returns `false` once the set is exhausted.
    /// The cursor only moves forward; re-issue the query to iterate again.
    pub fn next(&mut self) -> bool {
        let next = match self.cursor {
            None => 0,
            Some(index) => index + 1,
        };
        if next < self.values.len() {
            self.cursor = Some(next);
            true
        } else {
            false
        }
    }

    fn current(&self) -> Result<&[Value]> {
        match self.cursor {
            Some(index) => Ok(&self.values[index]),
            None => Err(Error::Cursor(
                "next() must be called before the row can be read".into(),
            )),
        }
    }

    /// The current row's wire values, untransformed. This is the escape
    /// hatch around the date/time heuristic applied by [`map`](Self::map).
    pub fn raw_row(&self) -> Result<&[Value]> {
        self.current()
    }

    /// The current row as a column-name keyed map.
    ///
    /// Columns whose declared type contains a `date` or `time` substring
    /// (case-insensitive) are parsed into [`CellValue::Timestamp`]. This is
    /// best-effort wire compatibility, not a contract; see
    /// [`raw_row`](Self::raw_row) for the untouched values.
    pub fn map(&self) -> Result<HashMap<String, CellValue>> {
        let row = self.current()?;
        let mut mapped = HashMap::with_capacity(self.columns.len());
        for (index, column) in self.columns.iter().enumerate() {
            let value = &row[index];
            let declared = self.types[index].to_ascii_lowercase();
            let cell = if declared.contains("date") || declared.contains("time") {
                match value {
                    Value::Null => CellValue::Null,
                    other => CellValue::Timestamp(parse_timestamp(other).ok_or_else(|| {
                        Error::ScanMismatch {
                            column: column.clone(),
                            expected: "timestamp",
                            found: describe(other),
                        }
                    })?),
                }
            } else {
                cell_from_json(value)?
            };
            mapped.insert(column.clone(), cell);
        }
        Ok(mapped)
    }

    /// Read a single column of the current row into `T`.
    pub fn get<T: FromSqlValue>(&self, index: usize) -> Result<T> {
        let row = self.current()?;
        if index >= self.columns.len() {
            return Err(Error::Cursor(format!(
                "column index {index} out of range for {} columns",
                self.columns.len()
            )));
        }
        scan_slot(&self.columns, row, index)
    }

    /// Read a single column of the current row by name.
    pub fn get_by_name<T: FromSqlValue>(&self, column: &str) -> Result<T> {
        let index = self
            .columns
            .iter()
            .position(|candidate| candidate == column)
            .ok_or_else(|| Error::Cursor(format!("no column named {column}")))?;
        self.get(index)
    }

    /// Coerce the current row into a tuple of destination types.
    ///
    /// Fails with a cursor error before any conversion if the tuple arity
    /// does not equal the column count.
    ///
    /// ```rust,no_run
    /// # fn demo(rows: &mut replisql_client::rows::QueryRows) -> replisql_client::error::Result<()> {
    /// while rows.next() {
    ///     let (id, name, joined): (i64, String, Option<chrono::DateTime<chrono::Utc>>) =
    ///         rows.scan()?;
    ///     println!("{id} {name} {joined:?}");
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn scan<T: FromRow>(&self) -> Result<T> {
        let row = self.current()?;
        if T::WIDTH != self.columns.len() {
            return Err(Error::Cursor(format!(
                "expected {} destination values but the row has {} columns",
                T::WIDTH,
                self.columns.len()
            )));
        }
        T::from_row(&self.columns, row)
    }
}

// ---------------------------------------------------------------------------
// Coercion
// ---------------------------------------------------------------------------

/// A destination kind one column value can be coerced into.
pub trait FromSqlValue: Sized {
    /// The kind name used in mismatch errors.
    fn kind() -> &'static str;

    /// Coerce a wire value, or `None` when the value is incompatible or the
    /// conversion would lose information.
    fn from_sql_value(value: &Value) -> Option<Self>;
}

impl FromSqlValue for i64 {
    fn kind() -> &'static str {
        "integer"
    }

    fn from_sql_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(i)
                } else if let Some(u) = n.as_u64() {
                    i64::try_from(u).ok()
                } else {
                    integral_f64_to_i64(n.as_f64()?)
                }
            }
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl FromSqlValue for i32 {
    fn kind() -> &'static str {
        "32-bit integer"
    }

    fn from_sql_value(value: &Value) -> Option<Self> {
        i64::from_sql_value(value).and_then(|wide| i32::try_from(wide).ok())
    }
}

impl FromSqlValue for f64 {
    fn kind() -> &'static str {
        "float"
    }

    fn from_sql_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl FromSqlValue for String {
    fn kind() -> &'static str {
        "string"
    }

    fn from_sql_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FromSqlValue for bool {
    fn kind() -> &'static str {
        "boolean"
    }

    fn from_sql_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => match n.as_i64().or_else(|| integral_f64_to_i64(n.as_f64()?)) {
                Some(0) => Some(false),
                Some(1) => Some(true),
                _ => None,
            },
            Value::String(s) => match s.trim() {
                "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
                "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

impl FromSqlValue for Vec<u8> {
    fn kind() -> &'static str {
        "byte sequence"
    }

    fn from_sql_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s.clone().into_bytes()),
            _ => None,
        }
    }
}

impl FromSqlValue for DateTime<Utc> {
    fn kind() -> &'static str {
        "timestamp"
    }

    fn from_sql_value(value: &Value) -> Option<Self> {
        parse_timestamp(value)
    }
}

impl<T: FromSqlValue> FromSqlValue for Option<T> {
    fn kind() -> &'static str {
        T::kind()
    }

    fn from_sql_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            other => T::from_sql_value(other).map(Some),
        }
    }
}

/// Parse a timestamp from the wire forms the store emits: a space-separated
/// date/time string, an RFC 3339 string, or a Unix epoch number.
fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
            .ok()
            .map(|naive| naive.and_utc())
            .or_else(|| {
                DateTime::parse_from_rfc3339(s)
                    .ok()
                    .map(|t| t.with_timezone(&Utc))
            }),
        Value::Number(n) => {
            let seconds = n.as_i64().or_else(|| integral_f64_to_i64(n.as_f64()?.trunc()))?;
            DateTime::from_timestamp(seconds, 0)
        }
        _ => None,
    }
}

fn integral_f64_to_i64(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".into(),
        Value::Bool(b) => format!("boolean {b}"),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) => format!("string {s:?}"),
        Value::Array(_) => "a JSON array".into(),
        Value::Object(_) => "a JSON object".into(),
    }
}

fn scan_slot<T: FromSqlValue>(columns: &[String], row: &[Value], index: usize) -> Result<T> {
    let value = &row[index];
    T::from_sql_value(value).ok_or_else(|| Error::ScanMismatch {
        column: columns
            .get(index)
            .cloned()
            .unwrap_or_else(|| index.to_string()),
        expected: T::kind(),
        found: describe(value),
    })
}

/// A full-row destination: a tuple whose arity must match the column count.
pub trait FromRow: Sized {
    /// Number of destination slots this type consumes.
    const WIDTH: usize;

    /// Coerce a complete row. `row` is guaranteed to hold `WIDTH` values.
    fn from_row(columns: &[String], row: &[Value]) -> Result<Self>;
}

macro_rules! impl_from_row {
    ($width:expr; $( $ty:ident : $idx:tt ),+) => {
        impl<$($ty: FromSqlValue),+> FromRow for ($($ty,)+) {
            const WIDTH: usize = $width;

            fn from_row(columns: &[String], row: &[Value]) -> Result<Self> {
                Ok(($( scan_slot::<$ty>(columns, row, $idx)?, )+))
            }
        }
    };
}

impl_from_row!(1; A:0);
impl_from_row!(2; A:0, B:1);
impl_from_row!(3; A:0, B:1, C:2);
impl_from_row!(4; A:0, B:1, C:2, D:3);
impl_from_row!(5; A:0, B:1, C:2, D:3, E:4);
impl_from_row!(6; A:0, B:1, C:2, D:3, E:4, F:5);
impl_from_row!(7; A:0, B:1, C:2, D:3, E:4, F:5, G:6);
impl_from_row!(8; A:0, B:1, C:2, D:3, E:4, F:5, G:6, H:7);

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn rows_from(doc: Value) -> QueryRows {
        QueryRows::from_wire(doc.as_object().unwrap()).unwrap()
    }

    fn crew_rows() -> QueryRows {
        rows_from(json!({
            "columns": ["id", "name"],
            "types": ["integer", "text"],
            "values": [[1, "Romulan"], [2, "Vulcan"], [3, "Klingon"]],
            "time": 0.0015
        }))
    }

    #[test]
    fn test_next_walks_forward_then_stops() {
        let mut rows = crew_rows();
        assert_eq!(rows.row_number(), None);
        assert!(rows.next());
        assert!(rows.next());
        assert!(rows.next());
        assert!(!rows.next());
        // the cursor stays on the last row after exhaustion
        assert_eq!(rows.row_number(), Some(2));
    }

    #[test]
    fn test_access_before_next_is_an_error() {
        let rows = crew_rows();
        assert!(matches!(rows.map(), Err(Error::Cursor(_))));
        assert!(matches!(rows.scan::<(i64, String)>(), Err(Error::Cursor(_))));
        assert!(matches!(rows.raw_row(), Err(Error::Cursor(_))));
    }

    #[test]
    fn test_scan_tuple() {
        let mut rows = crew_rows();
        rows.next();
        let (id, name): (i64, String) = rows.scan().unwrap();
        assert_eq!(id, 1);
        assert_eq!(name, "Romulan");
    }

    #[test]
    fn test_scan_arity_mismatch_fails_up_front() {
        let mut rows = crew_rows();
        rows.next();
        assert!(matches!(rows.scan::<(i64,)>(), Err(Error::Cursor(_))));
        assert!(matches!(
            rows.scan::<(i64, String, bool)>(),
            Err(Error::Cursor(_))
        ));
    }

    #[test]
    fn test_map_is_idempotent() {
        let mut rows = crew_rows();
        rows.next();
        let first = rows.map().unwrap();
        let second = rows.map().unwrap();
        assert_eq!(first, second);
        assert_eq!(first["id"], CellValue::Integer(1));
        assert_eq!(first["name"], CellValue::Text("Romulan".into()));
    }

    #[test]
    fn test_null_scans_into_unset_option() {
        let mut rows = rows_from(json!({
            "columns": ["id", "name"],
            "types": ["integer", "text"],
            "values": [[null, "Hulk"]]
        }));
        rows.next();
        let (id, name): (Option<i64>, Option<String>) = rows.scan().unwrap();
        assert!(id.is_none());
        assert_eq!(id.unwrap_or_default(), 0);
        assert_eq!(name.as_deref(), Some("Hulk"));
    }

    #[test]
    fn test_null_into_non_nullable_is_a_mismatch() {
        let mut rows = rows_from(json!({
            "columns": ["id"],
            "types": ["integer"],
            "values": [[null]]
        }));
        rows.next();
        assert!(matches!(
            rows.scan::<(i64,)>(),
            Err(Error::ScanMismatch { .. })
        ));
    }

    #[test]
    fn test_numeric_as_string_coercions() {
        let mut rows = rows_from(json!({
            "columns": ["n", "f", "b"],
            "types": ["text", "text", "text"],
            "values": [["42", "2.5", "true"]]
        }));
        rows.next();
        let (n, f, b): (i64, f64, bool) = rows.scan().unwrap();
        assert_eq!(n, 42);
        assert_eq!(f, 2.5);
        assert!(b);
    }

    #[test]
    fn test_integral_float_accepted_fractional_rejected() {
        let mut rows = rows_from(json!({
            "columns": ["n"],
            "types": ["number"],
            "values": [[2.0]]
        }));
        rows.next();
        let (n,): (i64,) = rows.scan().unwrap();
        assert_eq!(n, 2);

        let mut rows = rows_from(json!({
            "columns": ["n"],
            "types": ["number"],
            "values": [[1.5]]
        }));
        rows.next();
        let error = rows.scan::<(i64,)>().unwrap_err();
        assert!(matches!(error, Error::ScanMismatch { .. }));
        assert!(error.to_string().contains("column n"));
    }

    #[test]
    fn test_narrowing_out_of_range_rejected() {
        let mut rows = rows_from(json!({
            "columns": ["n"],
            "types": ["integer"],
            "values": [[1_099_511_627_776_i64]]
        }));
        rows.next();
        assert!(rows.scan::<(i32,)>().is_err());
        let (wide,): (i64,) = rows.scan().unwrap();
        assert_eq!(wide, 1_099_511_627_776);
    }

    #[test]
    fn test_bool_textual_and_numeric_forms() {
        for (wire, expected) in [
            (json!("1"), true),
            (json!("0"), false),
            (json!("t"), true),
            (json!("FALSE"), false),
            (json!(1), true),
            (json!(0), false),
        ] {
            assert_eq!(bool::from_sql_value(&wire), Some(expected));
        }
        assert_eq!(bool::from_sql_value(&json!("yes")), None);
        assert_eq!(bool::from_sql_value(&json!(2)), None);
    }

    #[test]
    fn test_bytes_from_text() {
        let mut rows = rows_from(json!({
            "columns": ["blob"],
            "types": ["blob"],
            "values": [["abc"]]
        }));
        rows.next();
        let (bytes,): (Vec<u8>,) = rows.scan().unwrap();
        assert_eq!(bytes, b"abc");
    }

    #[test]
    fn test_timestamp_wire_forms() {
        let expected = Utc.with_ymd_and_hms(2023, 5, 1, 10, 30, 0).unwrap();
        for wire in [
            json!("2023-05-01 10:30:00"),
            json!("2023-05-01T10:30:00Z"),
            json!(expected.timestamp()),
        ] {
            assert_eq!(DateTime::<Utc>::from_sql_value(&wire), Some(expected));
        }
        assert_eq!(DateTime::<Utc>::from_sql_value(&json!("yesterday")), None);
    }

    #[test]
    fn test_map_parses_datetime_typed_columns() {
        let mut rows = rows_from(json!({
            "columns": ["ts", "label"],
            "types": ["datetime", "text"],
            "values": [["2023-05-01 10:30:00", "launch"]]
        }));
        rows.next();
        let mapped = rows.map().unwrap();
        let expected = Utc.with_ymd_and_hms(2023, 5, 1, 10, 30, 0).unwrap();
        assert_eq!(mapped["ts"], CellValue::Timestamp(expected));
        assert_eq!(mapped["label"], CellValue::Text("launch".into()));

        // the raw row still shows the untouched wire value
        assert_eq!(rows.raw_row().unwrap()[0], json!("2023-05-01 10:30:00"));
    }

    #[test]
    fn test_map_keeps_null_in_datetime_columns() {
        let mut rows = rows_from(json!({
            "columns": ["ts"],
            "types": ["timestamp"],
            "values": [[null]]
        }));
        rows.next();
        assert_eq!(rows.map().unwrap()["ts"], CellValue::Null);
    }

    #[test]
    fn test_get_by_index_and_name() {
        let mut rows = crew_rows();
        rows.next();
        rows.next();
        let id: i64 = rows.get(0).unwrap();
        let name: String = rows.get_by_name("name").unwrap();
        assert_eq!(id, 2);
        assert_eq!(name, "Vulcan");
        assert!(rows.get::<i64>(9).is_err());
        assert!(rows.get_by_name::<i64>("rank").is_err());
    }

    #[test]
    fn test_empty_rowset() {
        let mut rows = rows_from(json!({
            "columns": ["id"],
            "types": ["integer"]
        }));
        assert_eq!(rows.num_rows(), 0);
        assert!(!rows.next());
    }

    #[test]
    fn test_row_width_mismatch_rejected_at_decode() {
        let doc = json!({
            "columns": ["id", "name"],
            "types": ["integer", "text"],
            "values": [[1]]
        });
        assert!(QueryRows::from_wire(doc.as_object().unwrap()).is_err());
    }
}
