// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Key declarations.
//!
//! This module provides [`Key<T>`], a typed key built at compile time, and
//! [`KeyDescriptor`], its type-erased runtime form stored in a
//! [`KeyRegistry`](crate::KeyRegistry).

use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;

use serde_json::Value as JsonValue;

use crate::codec;
use crate::converter::JsonConverter;
use crate::error::{ConversionError, KeyError};
use crate::value::{PropertyValue, SequenceKind, Value, ValueKind};

bitflags::bitflags! {
    /// Per-key behavior flags.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct KeyFlags: u8 {
        /// Incoming data from the remote peer may overwrite this property.
        const UPDATE_ALLOWED = 0b0000_0001;
        /// The property is expected to never hold null. Informational only.
        const NON_NULL       = 0b0000_0010;
    }
}

impl Default for KeyFlags {
    fn default() -> Self {
        Self::UPDATE_ALLOWED
    }
}

/// A typed property key.
///
/// Keys are usually declared as `static` items and grouped into key sets
/// (`&[&dyn ErasedKey]`) that a [`KeyRegistry`](crate::KeyRegistry) is
/// assembled from. All builder methods are `const`, so an invalid key such as
/// one with a blank name fails to compile.
///
/// # Example
///
/// ```rust
/// use understory_json_item::Key;
///
/// static TITLE: Key<String> = Key::new("title");
/// static ALL_DAY: Key<bool> = Key::new("allDay").default_value(|| false);
/// static ID: Key<String> = Key::new("id").update_allowed(false);
///
/// assert_eq!(TITLE.name(), "title");
/// assert!(!ID.is_update_allowed());
/// assert_eq!(ALL_DAY.default(), Some(false));
/// ```
pub struct Key<T> {
    name: &'static str,
    default: Option<fn() -> T>,
    converter: Option<&'static dyn JsonConverter>,
    element_converter: Option<&'static dyn JsonConverter>,
    flags: KeyFlags,
    sequence: Option<SequenceKind>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: PropertyValue> Key<T> {
    /// Creates a key that allows updates and has no default or converter.
    ///
    /// Sequence types use the container kind of `T`.
    ///
    /// # Panics
    ///
    /// Panics if `name` is empty or only whitespace. In a `static` or `const`
    /// initializer this is a compile error.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        assert!(!is_blank(name), "key name must not be blank");
        Self {
            name,
            default: None,
            converter: None,
            element_converter: None,
            flags: KeyFlags::UPDATE_ALLOWED,
            sequence: T::SEQUENCE,
            _marker: PhantomData,
        }
    }
}

impl<T> Key<T> {
    /// Sets the default value, produced fresh on every read.
    #[must_use]
    pub const fn default_value(self, default: fn() -> T) -> Self {
        Self {
            default: Some(default),
            ..self
        }
    }

    /// Sets the converter used for the whole value in both directions.
    #[must_use]
    pub const fn converter(self, converter: &'static dyn JsonConverter) -> Self {
        Self {
            converter: Some(converter),
            ..self
        }
    }

    /// Sets the converter applied to each element of a list or set on output.
    ///
    /// Ignored when a whole-value converter is present.
    #[must_use]
    pub const fn element_converter(self, converter: &'static dyn JsonConverter) -> Self {
        Self {
            element_converter: Some(converter),
            ..self
        }
    }

    /// Sets whether data from the remote peer may overwrite this property.
    #[must_use]
    pub const fn update_allowed(self, allowed: bool) -> Self {
        let flags = if allowed {
            self.flags.union(KeyFlags::UPDATE_ALLOWED)
        } else {
            self.flags.difference(KeyFlags::UPDATE_ALLOWED)
        };
        Self { flags, ..self }
    }

    /// Marks the property as never null.
    #[must_use]
    pub const fn non_null(self) -> Self {
        Self {
            flags: self.flags.union(KeyFlags::NON_NULL),
            ..self
        }
    }

    /// Sets the container incoming arrays are decoded into.
    #[must_use]
    pub const fn sequence(self, sequence: SequenceKind) -> Self {
        Self {
            sequence: Some(sequence),
            ..self
        }
    }

    /// Returns the key name.
    #[must_use]
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the key flags.
    #[must_use]
    #[inline]
    pub const fn flags(&self) -> KeyFlags {
        self.flags
    }

    /// Returns whether data from the remote peer may overwrite this property.
    #[must_use]
    #[inline]
    pub const fn is_update_allowed(&self) -> bool {
        self.flags.contains(KeyFlags::UPDATE_ALLOWED)
    }

    /// Returns whether the property is marked as never null.
    #[must_use]
    #[inline]
    pub const fn is_non_null(&self) -> bool {
        self.flags.contains(KeyFlags::NON_NULL)
    }

    /// Returns a fresh copy of the default value, if any.
    #[must_use]
    pub fn default(&self) -> Option<T> {
        self.default.map(|make| make())
    }
}

impl<T> Copy for Key<T> {}

impl<T> Clone for Key<T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> PartialEq for Key<T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl<T> Eq for Key<T> {}

impl<T> Hash for Key<T> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl<T> fmt::Debug for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key")
            .field("name", &self.name)
            .field("type", &core::any::type_name::<T>())
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

/// The runtime description of a key.
///
/// Equality and hashing consider the name only, so two descriptors with the
/// same name are the same key even if their other attributes differ.
#[derive(Clone)]
pub struct KeyDescriptor {
    name: &'static str,
    default: Option<Value>,
    converter: Option<&'static dyn JsonConverter>,
    element_converter: Option<&'static dyn JsonConverter>,
    flags: KeyFlags,
    kind: ValueKind,
    sequence: Option<SequenceKind>,
}

impl KeyDescriptor {
    /// Creates a descriptor decoding into `kind`, allowing updates.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::BlankName`] if `name` is empty or only whitespace.
    pub fn new(name: &'static str, kind: ValueKind) -> Result<Self, KeyError> {
        let descriptor = Self::unchecked(name, kind);
        descriptor.validate()?;
        Ok(descriptor)
    }

    pub(crate) fn unchecked(name: &'static str, kind: ValueKind) -> Self {
        Self {
            name,
            default: None,
            converter: None,
            element_converter: None,
            flags: KeyFlags::default(),
            kind,
            sequence: None,
        }
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Sets the whole-value converter.
    #[must_use]
    pub fn with_converter(mut self, converter: &'static dyn JsonConverter) -> Self {
        self.converter = Some(converter);
        self
    }

    /// Sets the element converter.
    #[must_use]
    pub fn with_element_converter(mut self, converter: &'static dyn JsonConverter) -> Self {
        self.element_converter = Some(converter);
        self
    }

    /// Sets whether data from the remote peer may overwrite this property.
    #[must_use]
    pub fn with_update_allowed(mut self, allowed: bool) -> Self {
        self.flags.set(KeyFlags::UPDATE_ALLOWED, allowed);
        self
    }

    /// Marks the property as never null.
    #[must_use]
    pub fn with_non_null(mut self) -> Self {
        self.flags.insert(KeyFlags::NON_NULL);
        self
    }

    /// Sets the container incoming arrays are decoded into.
    #[must_use]
    pub fn with_sequence(mut self, sequence: SequenceKind) -> Self {
        self.sequence = Some(sequence);
        self
    }

    /// Checks that the name is not blank.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::BlankName`] if it is.
    pub fn validate(&self) -> Result<(), KeyError> {
        if self.name.trim().is_empty() {
            Err(KeyError::BlankName)
        } else {
            Ok(())
        }
    }

    /// Returns the key name.
    #[must_use]
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the default value, if any.
    #[must_use]
    #[inline]
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Returns `true` if the key has a default other than null.
    #[must_use]
    pub fn has_non_null_default(&self) -> bool {
        self.default.as_ref().is_some_and(|d| !d.is_null())
    }

    /// Returns the key flags.
    #[must_use]
    #[inline]
    pub fn flags(&self) -> KeyFlags {
        self.flags
    }

    /// Returns whether data from the remote peer may overwrite this property.
    #[must_use]
    #[inline]
    pub fn is_update_allowed(&self) -> bool {
        self.flags.contains(KeyFlags::UPDATE_ALLOWED)
    }

    /// Returns whether the property is marked as never null.
    #[must_use]
    #[inline]
    pub fn is_non_null(&self) -> bool {
        self.flags.contains(KeyFlags::NON_NULL)
    }

    /// Returns the scalar kind incoming values are decoded into.
    #[must_use]
    #[inline]
    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Returns the container incoming arrays are decoded into.
    #[must_use]
    #[inline]
    pub fn sequence(&self) -> Option<SequenceKind> {
        self.sequence
    }

    /// Returns `true` if a whole-value converter is set.
    #[must_use]
    pub fn has_converter(&self) -> bool {
        self.converter.is_some()
    }

    /// Returns `true` if an element converter is set.
    #[must_use]
    pub fn has_element_converter(&self) -> bool {
        self.element_converter.is_some()
    }

    /// Converts a stored value to its wire form.
    ///
    /// Uses the whole-value converter, else the element converter for lists
    /// and sets, else [`codec::encode`].
    #[must_use]
    pub fn to_json(&self, value: &Value) -> JsonValue {
        if let Some(converter) = self.converter {
            return converter.to_json(value);
        }
        if let (Some(converter), Some(elements)) = (self.element_converter, value.elements()) {
            return JsonValue::Array(elements.iter().map(|e| converter.to_json(e)).collect());
        }
        codec::encode(value)
    }

    /// Converts a wire value to a stored value.
    ///
    /// Uses the whole-value converter, else [`codec::decode`] with this key's
    /// kind and container.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError`] when `json` cannot be interpreted.
    pub fn from_json(&self, json: &JsonValue) -> Result<Value, ConversionError> {
        let value = match self.converter {
            Some(converter) => converter.from_json(json)?,
            None => codec::decode(json, self.kind, self.sequence.unwrap_or_default())?,
        };
        Ok(self.normalize(value))
    }

    /// Puts sequences into this key's container kind.
    #[must_use]
    pub fn normalize(&self, value: Value) -> Value {
        match self.sequence {
            Some(kind) => value.into_sequence(kind),
            None => value,
        }
    }
}

impl PartialEq for KeyDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for KeyDescriptor {}

impl Hash for KeyDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Debug for KeyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("sequence", &self.sequence)
            .field("flags", &self.flags)
            .field("default", &self.default)
            .field("converter", &self.converter.is_some())
            .field("element_converter", &self.element_converter.is_some())
            .finish()
    }
}

/// A key of any value type.
///
/// This is what key sets hold, so that keys of different types can be listed
/// together.
pub trait ErasedKey: Sync {
    /// Returns the key name.
    fn name(&self) -> &'static str;

    /// Returns the runtime description of this key.
    fn descriptor(&self) -> KeyDescriptor;
}

impl<T: PropertyValue> ErasedKey for Key<T> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn descriptor(&self) -> KeyDescriptor {
        KeyDescriptor {
            name: self.name,
            default: self.default.map(|make| make().into_value()),
            converter: self.converter,
            element_converter: self.element_converter,
            flags: self.flags,
            kind: T::KIND,
            sequence: self.sequence,
        }
    }
}

impl ErasedKey for KeyDescriptor {
    fn name(&self) -> &'static str {
        self.name
    }

    fn descriptor(&self) -> KeyDescriptor {
        self.clone()
    }
}

/// A statically declared list of keys.
pub type KeySet = &'static [&'static dyn ErasedKey];

const fn is_blank(name: &str) -> bool {
    let bytes = name.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if !bytes[i].is_ascii_whitespace() {
            return false;
        }
        i += 1;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::NumberConverter;
    use serde_json::json;
    use std::collections::BTreeSet;

    static TITLE: Key<String> = Key::new("title");
    static ID: Key<String> = Key::new("id").update_allowed(false).non_null();
    static COUNT: Key<i64> = Key::new("count").default_value(|| 3);
    static TAGS: Key<BTreeSet<String>> = Key::new("tags");
    static DAYS: Key<Vec<i64>> = Key::new("days")
        .sequence(SequenceKind::Set)
        .element_converter(&NumberConverter);

    #[test]
    fn builder_sets_flags() {
        assert!(TITLE.is_update_allowed());
        assert!(!TITLE.is_non_null());
        assert!(!ID.is_update_allowed());
        assert!(ID.is_non_null());
        assert!(Key::<String>::new("x").update_allowed(false).update_allowed(true).is_update_allowed());
    }

    #[test]
    fn sequence_kind_comes_from_the_value_type() {
        assert_eq!(TAGS.descriptor().sequence(), Some(SequenceKind::Set));
        assert_eq!(TITLE.descriptor().sequence(), None);
        assert_eq!(DAYS.descriptor().sequence(), Some(SequenceKind::Set));
    }

    #[test]
    fn defaults_are_fresh_and_erased() {
        assert_eq!(COUNT.default(), Some(3));
        assert_eq!(TITLE.default(), None);
        let descriptor = COUNT.descriptor();
        assert_eq!(descriptor.default_value(), Some(&Value::Int(3)));
        assert!(descriptor.has_non_null_default());
        assert_eq!(descriptor.kind(), ValueKind::Int);
    }

    #[test]
    fn descriptor_equality_is_by_name() {
        let plain = KeyDescriptor::new("x", ValueKind::String).unwrap();
        let converted = KeyDescriptor::new("x", ValueKind::Int)
            .unwrap()
            .with_converter(&NumberConverter);
        assert_eq!(plain, converted);
        assert_ne!(plain, KeyDescriptor::new("y", ValueKind::String).unwrap());
    }

    #[test]
    fn blank_descriptor_names_are_rejected() {
        assert_eq!(
            KeyDescriptor::new("", ValueKind::Any).unwrap_err(),
            KeyError::BlankName
        );
        assert_eq!(
            KeyDescriptor::new("  \t", ValueKind::Any).unwrap_err(),
            KeyError::BlankName
        );
    }

    #[test]
    #[should_panic(expected = "must not be blank")]
    fn blank_key_names_panic() {
        let _ = Key::<String>::new(" ");
    }

    #[test]
    fn element_converter_applies_to_sequences_only() {
        let days = DAYS.descriptor();
        let value = Value::Set(vec![Value::Int(1), Value::Int(3)]);
        assert_eq!(days.to_json(&value), json!([1, 3]));
        assert_eq!(days.to_json(&Value::Int(1)), json!("1"));
    }

    #[test]
    fn whole_value_converter_wins() {
        let descriptor = KeyDescriptor::new("n", ValueKind::Int)
            .unwrap()
            .with_converter(&NumberConverter)
            .with_element_converter(&NumberConverter);
        assert_eq!(descriptor.to_json(&Value::Int(4)), json!(4));
        assert_eq!(TITLE.descriptor().to_json(&Value::Int(4)), json!("4"));
    }

    #[test]
    fn from_json_uses_kind_and_container() {
        let tags = TAGS.descriptor();
        assert_eq!(
            tags.from_json(&json!(["a", "b", "a"])),
            Ok(Value::Set(vec![Value::from("a"), Value::from("b")]))
        );
        assert_eq!(COUNT.descriptor().from_json(&json!("12")), Ok(Value::Int(12)));
        assert!(COUNT.descriptor().from_json(&json!("twelve")).is_err());
    }

    #[test]
    fn descriptor_debug_names_the_key() {
        let debug = format!("{:?}", TITLE.descriptor());
        assert!(debug.contains("KeyDescriptor"));
        assert!(debug.contains("title"));
    }
}
