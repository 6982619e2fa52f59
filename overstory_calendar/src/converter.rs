// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Wire converters for calendar properties.

use chrono::{DateTime, NaiveTime};
use serde_json::Value as JsonValue;
use understory_json_item::{ConversionError, JsonConverter, Value, codec};

/// Converts entry start and end times.
///
/// Timed values travel as RFC 3339 timestamps and all-day values as bare
/// dates. Inbound strings containing a `T` are read as timestamps, other
/// strings as dates, and numbers as epoch milliseconds.
#[derive(Copy, Clone, Debug, Default)]
pub struct EntryTimeConverter;

impl JsonConverter for EntryTimeConverter {
    fn to_json(&self, value: &Value) -> JsonValue {
        codec::encode(value)
    }

    fn from_json(&self, json: &JsonValue) -> Result<Value, ConversionError> {
        match json {
            JsonValue::Null => Ok(Value::Null),
            JsonValue::String(text) if text.contains('T') => codec::parse_timestamp(text)
                .map(Value::Timestamp)
                .ok_or_else(|| parse_error("timestamp", text)),
            JsonValue::String(text) => codec::parse_date(text)
                .map(Value::Date)
                .ok_or_else(|| parse_error("date", text)),
            JsonValue::Number(n) => n
                .as_i64()
                .and_then(DateTime::from_timestamp_millis)
                .map(Value::Timestamp)
                .ok_or_else(|| parse_error("timestamp", &n.to_string())),
            other => Err(ConversionError::TypeMismatch {
                expected: "timestamp or date",
                found: codec::json_kind_name(other),
            }),
        }
    }
}

/// Converts wall-clock times to `HH:MM`, dropping seconds.
#[derive(Copy, Clone, Debug, Default)]
pub struct HourMinuteConverter;

impl HourMinuteConverter {
    /// Formats a time the way this converter writes it.
    #[must_use]
    pub fn format(time: &NaiveTime) -> String {
        time.format("%H:%M").to_string()
    }
}

impl JsonConverter for HourMinuteConverter {
    fn to_json(&self, value: &Value) -> JsonValue {
        match value {
            Value::Time(time) => JsonValue::String(Self::format(time)),
            other => codec::encode(other),
        }
    }

    fn from_json(&self, json: &JsonValue) -> Result<Value, ConversionError> {
        match json {
            JsonValue::Null => Ok(Value::Null),
            JsonValue::String(text) => codec::parse_time(text)
                .map(Value::Time)
                .ok_or_else(|| parse_error("time", text)),
            other => Err(ConversionError::TypeMismatch {
                expected: "time",
                found: codec::json_kind_name(other),
            }),
        }
    }
}

fn parse_error(expected: &'static str, input: &str) -> ConversionError {
    ConversionError::Parse {
        expected,
        input: input.to_owned(),
    }
}
