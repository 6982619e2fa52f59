// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tagged property values.
//!
//! This module provides [`Value`], the closed set of shapes a property can
//! hold, and [`PropertyValue`] for mapping Rust types onto it.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use serde_json::Value as JsonValue;

use crate::codec;
use crate::error::ConversionError;

/// A stored property value.
///
/// Values are owned, so cloning a [`Value`] always produces an independent
/// deep copy, sequences included.
///
/// # Example
///
/// ```rust
/// use understory_json_item::{SequenceKind, Value};
///
/// let tags = Value::sequence(
///     SequenceKind::Set,
///     vec![Value::from("a"), Value::from("b"), Value::from("a")],
/// );
/// assert_eq!(tags.elements().map(<[Value]>::len), Some(2));
///
/// // Set equality ignores order.
/// let reordered = Value::Set(vec![Value::from("b"), Value::from("a")]);
/// assert_eq!(tags, reordered);
/// ```
#[derive(Clone, Debug, Default)]
pub enum Value {
    /// An explicit null. A key holding `Null` is still present.
    #[default]
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A floating point number.
    Float(f64),
    /// A string.
    String(String),
    /// An instant in UTC.
    Timestamp(DateTime<Utc>),
    /// A calendar date without time.
    Date(NaiveDate),
    /// A wall-clock time without date.
    Time(NaiveTime),
    /// An opaque JSON payload, passed through untouched.
    Json(JsonValue),
    /// An ordered sequence.
    List(Vec<Self>),
    /// An insertion-ordered sequence without duplicates.
    Set(Vec<Self>),
}

impl Value {
    /// Builds a sequence of the given container kind.
    ///
    /// [`SequenceKind::Set`] drops repeated elements, keeping the first.
    #[must_use]
    pub fn sequence(kind: SequenceKind, elements: Vec<Self>) -> Self {
        match kind {
            SequenceKind::List => Self::List(elements),
            SequenceKind::Set => {
                let mut unique: Vec<Self> = Vec::with_capacity(elements.len());
                for element in elements {
                    if !unique.contains(&element) {
                        unique.push(element);
                    }
                }
                Self::Set(unique)
            }
        }
    }

    /// Converts a sequence into the given container kind.
    ///
    /// Sets are always rebuilt, so repeated elements are dropped even when
    /// the value already is a set. Non-sequence values are returned unchanged.
    #[must_use]
    pub fn into_sequence(self, kind: SequenceKind) -> Self {
        match (self, kind) {
            (Self::List(elements) | Self::Set(elements), SequenceKind::Set) => {
                Self::sequence(kind, elements)
            }
            (Self::Set(elements), SequenceKind::List) => Self::List(elements),
            (other, _) => other,
        }
    }

    /// Returns the elements of a list or set.
    #[must_use]
    pub fn elements(&self) -> Option<&[Self]> {
        match self {
            Self::List(elements) | Self::Set(elements) => Some(elements),
            _ => None,
        }
    }

    /// Returns `true` for [`Value::Null`].
    #[must_use]
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the string content of a [`Value::String`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the content of a [`Value::Bool`].
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the content of a [`Value::Int`].
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the representation the client side understands, if this value
    /// has one that differs from its plain string form.
    ///
    /// Temporal values are rendered as ISO 8601 strings.
    #[must_use]
    pub fn client_side_value(&self) -> Option<String> {
        match self {
            Self::Timestamp(ts) => Some(codec::format_timestamp(ts)),
            Self::Date(date) => Some(codec::format_date(date)),
            Self::Time(time) => Some(codec::format_time(time)),
            _ => None,
        }
    }

    /// Returns a short name for this value's shape, used in error messages.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Timestamp(_) => "timestamp",
            Self::Date(_) => "date",
            Self::Time(_) => "time",
            Self::Json(_) => "json",
            Self::List(_) => "list",
            Self::Set(_) => "set",
        }
    }

    fn mismatch(&self, expected: &'static str) -> ConversionError {
        ConversionError::TypeMismatch {
            expected,
            found: self.kind_name(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            // NaN equals NaN, so storing it again is not a change.
            (Self::Float(a), Self::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Timestamp(a), Self::Timestamp(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::Time(a), Self::Time(b)) => a == b,
            (Self::Json(a), Self::Json(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Set(a), Self::Set(b)) => {
                a.iter().all(|x| b.contains(x)) && b.iter().all(|x| a.contains(x))
            }
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<NaiveTime> for Value {
    fn from(value: NaiveTime) -> Self {
        Self::Time(value)
    }
}

impl From<JsonValue> for Value {
    fn from(value: JsonValue) -> Self {
        Self::Json(value)
    }
}

/// The scalar shape a wire value is decoded into.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Whatever the JSON shape suggests.
    #[default]
    Any,
    /// [`Value::Bool`].
    Bool,
    /// [`Value::Int`].
    Int,
    /// [`Value::Float`].
    Float,
    /// [`Value::String`].
    String,
    /// [`Value::Timestamp`].
    Timestamp,
    /// [`Value::Date`].
    Date,
    /// [`Value::Time`].
    Time,
    /// [`Value::Json`]; the payload is kept as is, arrays included.
    Json,
}

impl ValueKind {
    /// Returns a short name for this kind, used in error messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
            Self::Timestamp => "timestamp",
            Self::Date => "date",
            Self::Time => "time",
            Self::Json => "json",
        }
    }
}

/// The container incoming JSON arrays are decoded into.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum SequenceKind {
    /// [`Value::List`].
    #[default]
    List,
    /// [`Value::Set`].
    Set,
}

/// A Rust type that can be stored in a property bag.
///
/// The associated constants describe how incoming wire data for a key of this
/// type is decoded when the key has no converter of its own.
pub trait PropertyValue: Sized {
    /// The scalar kind (for sequences, the element kind).
    const KIND: ValueKind;

    /// The container kind, for sequence types.
    const SEQUENCE: Option<SequenceKind> = None;

    /// Converts into the stored representation.
    fn into_value(self) -> Value;

    /// Reads back from the stored representation.
    fn from_value(value: &Value) -> Result<Self, ConversionError>;
}

/// An enumeration with a fixed wire string per variant.
///
/// Implementors typically forward [`PropertyValue`] to
/// [`client_side_into_value`] and [`client_side_from_value`].
pub trait ClientSideValue: Copy + 'static {
    /// Every variant, used for the reverse lookup.
    const VARIANTS: &'static [Self];

    /// The string the client side expects for this variant.
    fn client_side_value(&self) -> &'static str;

    /// Looks a variant up by its client-side string.
    fn from_client_side_value(value: &str) -> Option<Self> {
        Self::VARIANTS
            .iter()
            .copied()
            .find(|variant| variant.client_side_value() == value)
    }
}

/// Stores a [`ClientSideValue`] by its client-side string.
pub fn client_side_into_value<T: ClientSideValue>(value: T) -> Value {
    Value::String(value.client_side_value().to_owned())
}

/// Reads a [`ClientSideValue`] from its client-side string.
pub fn client_side_from_value<T: ClientSideValue>(value: &Value) -> Result<T, ConversionError> {
    let text = value.as_str().ok_or_else(|| value.mismatch("string"))?;
    T::from_client_side_value(text).ok_or_else(|| ConversionError::Parse {
        expected: core::any::type_name::<T>(),
        input: text.to_owned(),
    })
}

impl PropertyValue for Value {
    const KIND: ValueKind = ValueKind::Any;

    fn into_value(self) -> Value {
        self
    }

    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        Ok(value.clone())
    }
}

impl PropertyValue for bool {
    const KIND: ValueKind = ValueKind::Bool;

    fn into_value(self) -> Value {
        Value::Bool(self)
    }

    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        value.as_bool().ok_or_else(|| value.mismatch("bool"))
    }
}

impl PropertyValue for i64 {
    const KIND: ValueKind = ValueKind::Int;

    fn into_value(self) -> Value {
        Value::Int(self)
    }

    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        value.as_i64().ok_or_else(|| value.mismatch("int"))
    }
}

impl PropertyValue for i32 {
    const KIND: ValueKind = ValueKind::Int;

    fn into_value(self) -> Value {
        Value::Int(self.into())
    }

    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        let wide = value.as_i64().ok_or_else(|| value.mismatch("int"))?;
        Self::try_from(wide).map_err(|_| ConversionError::Parse {
            expected: "i32",
            input: wide.to_string(),
        })
    }
}

impl PropertyValue for f64 {
    const KIND: ValueKind = ValueKind::Float;

    fn into_value(self) -> Value {
        Value::Float(self)
    }

    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Float(f) => Ok(*f),
            Value::Int(i) => Ok(*i as Self),
            other => Err(other.mismatch("float")),
        }
    }
}

impl PropertyValue for String {
    const KIND: ValueKind = ValueKind::String;

    fn into_value(self) -> Value {
        Value::String(self)
    }

    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        value
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| value.mismatch("string"))
    }
}

impl PropertyValue for DateTime<Utc> {
    const KIND: ValueKind = ValueKind::Timestamp;

    fn into_value(self) -> Value {
        Value::Timestamp(self)
    }

    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Timestamp(ts) => Ok(*ts),
            other => Err(other.mismatch("timestamp")),
        }
    }
}

impl PropertyValue for NaiveDate {
    const KIND: ValueKind = ValueKind::Date;

    fn into_value(self) -> Value {
        Value::Date(self)
    }

    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Date(date) => Ok(*date),
            Value::Timestamp(ts) => Ok(ts.date_naive()),
            other => Err(other.mismatch("date")),
        }
    }
}

impl PropertyValue for NaiveTime {
    const KIND: ValueKind = ValueKind::Time;

    fn into_value(self) -> Value {
        Value::Time(self)
    }

    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Time(time) => Ok(*time),
            other => Err(other.mismatch("time")),
        }
    }
}

impl PropertyValue for JsonValue {
    const KIND: ValueKind = ValueKind::Json;

    fn into_value(self) -> Value {
        Value::Json(self)
    }

    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Json(json) => Ok(json.clone()),
            other => Ok(codec::encode(other)),
        }
    }
}

/// Weekdays are stored as their index counted from Sunday (`0..=6`), the
/// numbering used by browser calendars.
impl PropertyValue for Weekday {
    const KIND: ValueKind = ValueKind::Int;

    fn into_value(self) -> Value {
        Value::Int(self.num_days_from_sunday().into())
    }

    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Int(0) => Ok(Self::Sun),
            Value::Int(1) => Ok(Self::Mon),
            Value::Int(2) => Ok(Self::Tue),
            Value::Int(3) => Ok(Self::Wed),
            Value::Int(4) => Ok(Self::Thu),
            Value::Int(5) => Ok(Self::Fri),
            Value::Int(6) => Ok(Self::Sat),
            Value::Int(other) => Err(ConversionError::Parse {
                expected: "weekday",
                input: other.to_string(),
            }),
            Value::String(name) => name.parse().map_err(|_| ConversionError::Parse {
                expected: "weekday",
                input: name.clone(),
            }),
            other => Err(other.mismatch("weekday")),
        }
    }
}

impl<T: PropertyValue> PropertyValue for Option<T> {
    const KIND: ValueKind = T::KIND;
    const SEQUENCE: Option<SequenceKind> = T::SEQUENCE;

    fn into_value(self) -> Value {
        self.map_or(Value::Null, T::into_value)
    }

    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: PropertyValue> PropertyValue for Vec<T> {
    const KIND: ValueKind = T::KIND;
    const SEQUENCE: Option<SequenceKind> = Some(SequenceKind::List);

    fn into_value(self) -> Value {
        Value::List(self.into_iter().map(T::into_value).collect())
    }

    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        value
            .elements()
            .ok_or_else(|| value.mismatch("list"))?
            .iter()
            .map(T::from_value)
            .collect()
    }
}

impl<T: PropertyValue + Ord> PropertyValue for BTreeSet<T> {
    const KIND: ValueKind = T::KIND;
    const SEQUENCE: Option<SequenceKind> = Some(SequenceKind::Set);

    fn into_value(self) -> Value {
        Value::Set(self.into_iter().map(T::into_value).collect())
    }

    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        value
            .elements()
            .ok_or_else(|| value.mismatch("set"))?
            .iter()
            .map(T::from_value)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    enum Shade {
        Light,
        Dark,
    }

    impl ClientSideValue for Shade {
        const VARIANTS: &'static [Self] = &[Self::Light, Self::Dark];

        fn client_side_value(&self) -> &'static str {
            match self {
                Self::Light => "light",
                Self::Dark => "dark",
            }
        }
    }

    #[test]
    fn set_sequence_drops_duplicates_in_order() {
        let set = Value::sequence(
            SequenceKind::Set,
            vec![Value::Int(3), Value::Int(1), Value::Int(3)],
        );
        assert_eq!(set.elements(), Some(&[Value::Int(3), Value::Int(1)][..]));
    }

    #[test]
    fn list_equality_is_ordered_set_equality_is_not() {
        let a = vec![Value::Int(1), Value::Int(2)];
        let b = vec![Value::Int(2), Value::Int(1)];
        assert_ne!(Value::List(a.clone()), Value::List(b.clone()));
        assert_eq!(Value::Set(a), Value::Set(b));
    }

    #[test]
    fn set_equality_is_symmetric() {
        let repeated = Value::Set(vec![Value::from("a"), Value::from("a")]);
        let distinct = Value::Set(vec![Value::from("a"), Value::from("b")]);
        assert_ne!(repeated, distinct);
        assert_ne!(distinct, repeated);
        assert_eq!(repeated, Value::Set(vec![Value::from("a")]));
    }

    #[test]
    fn into_sequence_deduplicates_existing_sets() {
        let repeated = Value::Set(vec![Value::Int(1), Value::Int(1), Value::Int(2)]);
        assert_eq!(
            repeated.into_sequence(SequenceKind::Set).elements(),
            Some(&[Value::Int(1), Value::Int(2)][..])
        );
    }

    #[test]
    fn nan_equals_nan() {
        assert_eq!(Value::Float(f64::NAN), Value::Float(f64::NAN));
        assert_ne!(Value::Float(f64::NAN), Value::Float(1.0));
        assert_eq!(Value::Float(0.0), Value::Float(-0.0));
    }

    #[test]
    fn list_and_set_are_distinct() {
        let items = vec![Value::Int(1)];
        assert_ne!(Value::List(items.clone()), Value::Set(items));
    }

    #[test]
    fn into_sequence_converts_containers() {
        let list = Value::List(vec![Value::from("a"), Value::from("a")]);
        let set = list.into_sequence(SequenceKind::Set);
        assert_eq!(set, Value::Set(vec![Value::from("a")]));
        assert!(matches!(set.into_sequence(SequenceKind::List), Value::List(_)));
        assert_eq!(Value::Int(1).into_sequence(SequenceKind::Set), Value::Int(1));
    }

    #[test]
    fn option_maps_null() {
        assert_eq!(None::<String>.into_value(), Value::Null);
        assert_eq!(Option::<String>::from_value(&Value::Null), Ok(None));
        assert_eq!(
            Option::<i64>::from_value(&Value::Int(4)),
            Ok(Some(4))
        );
    }

    #[test]
    fn weekday_counts_from_sunday() {
        assert_eq!(Weekday::Sun.into_value(), Value::Int(0));
        assert_eq!(Weekday::Sat.into_value(), Value::Int(6));
        assert_eq!(Weekday::from_value(&Value::Int(1)), Ok(Weekday::Mon));
        assert_eq!(Weekday::from_value(&Value::from("Tue")), Ok(Weekday::Tue));
        assert!(Weekday::from_value(&Value::Int(7)).is_err());
    }

    #[test]
    fn vec_reads_lists_and_sets() {
        let set = Value::Set(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(Vec::<i64>::from_value(&set), Ok(vec![1, 2]));
        assert!(Vec::<i64>::from_value(&Value::Int(1)).is_err());
    }

    #[test]
    fn i32_rejects_out_of_range() {
        assert_eq!(i32::from_value(&Value::Int(7)), Ok(7));
        assert!(i32::from_value(&Value::Int(i64::MAX)).is_err());
    }

    #[test]
    fn client_side_values_round_trip() {
        assert_eq!(client_side_into_value(Shade::Dark), Value::from("dark"));
        assert_eq!(
            client_side_from_value::<Shade>(&Value::from("light")),
            Ok(Shade::Light)
        );
        assert!(client_side_from_value::<Shade>(&Value::from("dim")).is_err());
        assert!(client_side_from_value::<Shade>(&Value::Int(1)).is_err());
    }

    #[test]
    fn temporal_values_have_client_side_form() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(
            Value::Date(date).client_side_value().as_deref(),
            Some("2024-03-09")
        );
        assert_eq!(Value::Int(1).client_side_value(), None);
    }
}
