// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pluggable value converters.
//!
//! A key may carry a whole-value converter, used in both directions, or an
//! element converter, applied to each element of a list or set on the
//! outbound path only. Keys without either fall back to [`crate::codec`].

use serde_json::{Number, Value as JsonValue};

use crate::codec;
use crate::error::ConversionError;
use crate::value::{SequenceKind, Value, ValueKind};

/// Converts property values to and from their wire form.
///
/// Converters are stateless and shared between every key that refers to them,
/// so they are usually declared as `static` items.
///
/// # Example
///
/// ```rust
/// use serde_json::{Value as JsonValue, json};
/// use understory_json_item::{ConversionError, JsonConverter, Value};
///
/// struct Upper;
///
/// impl JsonConverter for Upper {
///     fn to_json(&self, value: &Value) -> JsonValue {
///         value.as_str().map_or(JsonValue::Null, |s| s.to_uppercase().into())
///     }
///
///     fn from_json(&self, json: &JsonValue) -> Result<Value, ConversionError> {
///         Ok(json.as_str().map_or(Value::Null, |s| s.to_lowercase().into()))
///     }
/// }
///
/// assert_eq!(Upper.to_json(&Value::from("abc")), json!("ABC"));
/// ```
pub trait JsonConverter: Send + Sync {
    /// Converts a stored value into its wire form.
    fn to_json(&self, value: &Value) -> JsonValue;

    /// Converts a wire value back into a stored value.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError`] when `json` cannot be interpreted.
    fn from_json(&self, json: &JsonValue) -> Result<Value, ConversionError>;
}

/// Writes numeric values as JSON numbers instead of their string form.
///
/// Sequences are written element-wise, so this also serves as an element
/// converter for lists of numbers.
#[derive(Copy, Clone, Debug, Default)]
pub struct NumberConverter;

impl JsonConverter for NumberConverter {
    fn to_json(&self, value: &Value) -> JsonValue {
        match value {
            Value::Int(i) => JsonValue::Number((*i).into()),
            Value::Float(f) => Number::from_f64(*f).map_or(JsonValue::Null, JsonValue::Number),
            Value::List(elements) | Value::Set(elements) => {
                JsonValue::Array(elements.iter().map(|e| self.to_json(e)).collect())
            }
            other => codec::encode(other),
        }
    }

    fn from_json(&self, json: &JsonValue) -> Result<Value, ConversionError> {
        codec::decode(json, ValueKind::Any, SequenceKind::List)
    }
}
