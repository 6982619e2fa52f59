// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Default conversion between [`Value`] and JSON.
//!
//! These rules apply to every key without a converter of its own.
//!
//! Outbound ([`encode`]):
//!
//! 1. Values with a client-side representation are substituted first
//!    (timestamps, dates and times become ISO 8601 strings).
//! 2. `Null` becomes JSON null and booleans stay booleans.
//! 3. Opaque JSON payloads pass through and sequences become arrays.
//! 4. Everything else is written in its string form, so `Int(5)` is `"5"`.
//!
//! Inbound ([`decode`]) picks the narrowest safe conversion to a requested
//! [`ValueKind`], and turns arrays into the requested [`SequenceKind`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone, Utc};
use serde_json::{Number, Value as JsonValue};

use crate::error::ConversionError;
use crate::value::{SequenceKind, Value, ValueKind};

/// Formats a timestamp as RFC 3339 in UTC with a `Z` suffix.
#[must_use]
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Formats a date as `YYYY-MM-DD`.
#[must_use]
pub fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Formats a time as `HH:MM:SS`, with fractional seconds when present.
#[must_use]
pub fn format_time(time: &NaiveTime) -> String {
    time.format("%H:%M:%S%.f").to_string()
}

/// Encodes a value with the default rules.
///
/// # Example
///
/// ```rust
/// use serde_json::json;
/// use understory_json_item::{Value, codec};
///
/// assert_eq!(codec::encode(&Value::Null), json!(null));
/// assert_eq!(codec::encode(&Value::Bool(true)), json!(true));
/// assert_eq!(codec::encode(&Value::Int(5)), json!("5"));
/// ```
#[must_use]
pub fn encode(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Json(json) => json.clone(),
        Value::List(elements) | Value::Set(elements) => {
            JsonValue::Array(elements.iter().map(encode).collect())
        }
        Value::Int(i) => JsonValue::String(i.to_string()),
        Value::Float(f) => JsonValue::String(f.to_string()),
        Value::String(s) => JsonValue::String(s.clone()),
        Value::Timestamp(ts) => JsonValue::String(format_timestamp(ts)),
        Value::Date(date) => JsonValue::String(format_date(date)),
        Value::Time(time) => JsonValue::String(format_time(time)),
    }
}

/// Decodes a JSON value into the requested kind.
///
/// Null always decodes to [`Value::Null`]. Arrays decode element-wise into
/// `sequence`, except for [`ValueKind::Json`], which keeps any payload opaque.
///
/// # Errors
///
/// Returns [`ConversionError`] when the JSON cannot be represented as `kind`.
pub fn decode(
    json: &JsonValue,
    kind: ValueKind,
    sequence: SequenceKind,
) -> Result<Value, ConversionError> {
    match json {
        JsonValue::Null => Ok(Value::Null),
        _ if kind == ValueKind::Json => Ok(Value::Json(json.clone())),
        JsonValue::Array(items) => {
            let elements = items
                .iter()
                .map(|item| decode(item, kind, sequence))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::sequence(sequence, elements))
        }
        _ => decode_scalar(json, kind),
    }
}

fn decode_scalar(json: &JsonValue, kind: ValueKind) -> Result<Value, ConversionError> {
    match (kind, json) {
        (ValueKind::Any, JsonValue::Bool(b)) => Ok(Value::Bool(*b)),
        (ValueKind::Any, JsonValue::Number(n)) => Ok(number_value(n)),
        (ValueKind::Any, JsonValue::String(s)) => Ok(Value::String(s.clone())),
        (ValueKind::Any, JsonValue::Object(_)) => Ok(Value::Json(json.clone())),

        (ValueKind::Bool, JsonValue::Bool(b)) => Ok(Value::Bool(*b)),
        (ValueKind::Bool, JsonValue::String(s)) => match s.trim() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(parse_error(kind, s)),
        },

        (ValueKind::Int, JsonValue::Number(n)) => integral(n)
            .map(Value::Int)
            .ok_or_else(|| parse_error(kind, &n.to_string())),
        (ValueKind::Int, JsonValue::String(s)) => s
            .trim()
            .parse()
            .map(Value::Int)
            .map_err(|_| parse_error(kind, s)),

        (ValueKind::Float, JsonValue::Number(n)) => n
            .as_f64()
            .map(Value::Float)
            .ok_or_else(|| parse_error(kind, &n.to_string())),
        (ValueKind::Float, JsonValue::String(s)) => s
            .trim()
            .parse()
            .map(Value::Float)
            .map_err(|_| parse_error(kind, s)),

        (ValueKind::String, JsonValue::String(s)) => Ok(Value::String(s.clone())),
        (ValueKind::String, JsonValue::Number(n)) => Ok(Value::String(n.to_string())),
        (ValueKind::String, JsonValue::Bool(b)) => Ok(Value::String(b.to_string())),

        (ValueKind::Timestamp, JsonValue::String(s)) => parse_timestamp(s)
            .map(Value::Timestamp)
            .ok_or_else(|| parse_error(kind, s)),
        (ValueKind::Timestamp, JsonValue::Number(n)) => n
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .map(Value::Timestamp)
            .ok_or_else(|| parse_error(kind, &n.to_string())),

        (ValueKind::Date, JsonValue::String(s)) => parse_date(s)
            .map(Value::Date)
            .ok_or_else(|| parse_error(kind, s)),

        (ValueKind::Time, JsonValue::String(s)) => parse_time(s)
            .map(Value::Time)
            .ok_or_else(|| parse_error(kind, s)),

        (_, other) => Err(ConversionError::TypeMismatch {
            expected: kind.name(),
            found: json_kind_name(other),
        }),
    }
}

fn number_value(n: &Number) -> Value {
    match n.as_i64() {
        Some(i) => Value::Int(i),
        None => n.as_f64().map_or(Value::Null, Value::Float),
    }
}

/// Accepts integers, and floats without a fractional part.
fn integral(n: &Number) -> Option<i64> {
    // 2^63, the first float past `i64::MAX`.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;

    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    let f = n.as_f64()?;
    if f.fract() != 0.0 || !(-LIMIT..LIMIT).contains(&f) {
        return None;
    }
    #[expect(
        clippy::cast_possible_truncation,
        reason = "checked to be integral and in range"
    )]
    let i = f as i64;
    Some(i)
}

/// Parses RFC 3339, a naive date-time (taken as UTC), or a bare date
/// (midnight UTC).
#[must_use]
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .map(|date| Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)))
}

/// Parses a bare date, or the date part of a timestamp.
#[must_use]
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .ok()
        .or_else(|| parse_timestamp(text).map(|ts| ts.date_naive()))
}

/// Parses `HH:MM:SS` (optionally fractional) or `HH:MM`.
#[must_use]
pub fn parse_time(text: &str) -> Option<NaiveTime> {
    let text = text.trim();
    ["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"]
        .into_iter()
        .find_map(|format| NaiveTime::parse_from_str(text, format).ok())
}

fn parse_error(kind: ValueKind, input: &str) -> ConversionError {
    ConversionError::Parse {
        expected: kind.name(),
        input: input.to_owned(),
    }
}

/// Returns a short name for a JSON value's shape.
#[must_use]
pub fn json_kind_name(json: &JsonValue) -> &'static str {
    match json {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
