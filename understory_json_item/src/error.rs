// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types for keys, registries, items and conversions.

use serde_json::Value as JsonValue;
use thiserror::Error;

/// A value could not be converted to or from its wire form.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConversionError {
    /// The value has a different shape than the target kind accepts.
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        /// Name of the requested kind.
        expected: &'static str,
        /// Name of the kind that was found.
        found: &'static str,
    },

    /// The value has the right shape but its text could not be parsed.
    #[error("cannot parse {input:?} as {expected}")]
    Parse {
        /// Name of the requested kind.
        expected: &'static str,
        /// The offending input.
        input: String,
    },
}

/// A key descriptor is malformed.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    /// Key names must contain at least one non-whitespace character.
    #[error("key name must not be blank")]
    BlankName,
}

/// A key registry could not be assembled.
///
/// These indicate a defect in the declaring type, never a data error.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// More than one key shares a name.
    #[error("duplicate keys in {type_name}: {}", names.join(", "))]
    DuplicateKeys {
        /// The type whose registry failed.
        type_name: &'static str,
        /// Every name that appeared more than once, in first-seen order.
        names: Vec<String>,
    },

    /// A key has an empty or blank name.
    #[error("blank key name in {type_name}")]
    BlankName {
        /// The type whose registry failed.
        type_name: &'static str,
    },

    /// The designated identity key is not part of the key set.
    #[error("identity key {id_key:?} is not registered for {type_name}")]
    MissingIdKey {
        /// The type whose registry failed.
        type_name: &'static str,
        /// Name of the missing identity key.
        id_key: &'static str,
    },

    /// The key set exceeds the addressable key count.
    #[error("too many keys in {type_name} (max {})", u16::MAX)]
    TooManyKeys {
        /// The type whose registry failed.
        type_name: &'static str,
    },
}

/// An item operation was rejected.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ItemError {
    /// The incoming object does not describe this item.
    #[error("identity mismatch: expected {expected}, found {found}")]
    IdMismatch {
        /// This item's identity on the wire.
        expected: JsonValue,
        /// The identity carried by the incoming object (null when absent).
        found: JsonValue,
    },

    /// An incoming property could not be decoded.
    #[error("cannot decode property {key:?}: {source}")]
    Conversion {
        /// The key whose value failed to decode.
        key: &'static str,
        /// The underlying conversion failure.
        #[source]
        source: ConversionError,
    },

    /// Incoming data must be a JSON object.
    #[error("expected a JSON object")]
    NotAnObject,
}

/// A bean property access was rejected.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BeanError {
    /// The property has an accessor but no mutator.
    #[error("property {0:?} has no mutator")]
    NotSupported(&'static str),

    /// No property with this name was harvested.
    #[error("unknown property {0:?}")]
    UnknownProperty(String),

    /// The value could not be converted to the property's type.
    #[error("cannot convert value for {property:?}: {source}")]
    Conversion {
        /// The property being written.
        property: &'static str,
        /// The underlying conversion failure.
        #[source]
        source: ConversionError,
    },
}
