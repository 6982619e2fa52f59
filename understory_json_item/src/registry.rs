// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-type key registries.
//!
//! This module provides [`KeyRegistry`], the validated set of keys of one item
//! type, and [`KeyRegistryBuilder`] for assembling it from key sets.

use std::sync::OnceLock;

use hashbrown::HashMap;

use crate::error::RegistryError;
use crate::key::{ErasedKey, KeyDescriptor};

/// A key's position within its [`KeyRegistry`].
///
/// Ids follow declaration order, so sorting by id reproduces the registry's
/// iteration order.
///
/// # Example
///
/// ```rust
/// use understory_json_item::KeyId;
///
/// let id = KeyId::new(3);
/// assert_eq!(id.index(), 3);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyId(u16);

impl KeyId {
    /// Creates a key id from an index.
    #[must_use]
    #[inline]
    pub const fn new(index: u16) -> Self {
        Self(index)
    }

    /// Returns the underlying index.
    #[must_use]
    #[inline]
    pub const fn index(self) -> u16 {
        self.0
    }
}

/// The validated keys of one item type.
///
/// A registry is a flat merge of the type's own key set and any included key
/// sets. No two keys share a name, and one key is the identity key.
///
/// Registries are built once per type, usually through
/// [`KeyRegistry::init_once`], and shared read-only by every item of that
/// type.
///
/// # Example
///
/// ```rust
/// use understory_json_item::{Key, KeyRegistry, KeySet};
///
/// static ID: Key<String> = Key::new("id").update_allowed(false);
/// static TITLE: Key<String> = Key::new("title");
/// static COLOR: Key<String> = Key::new("color");
///
/// static OWN: KeySet = &[&ID, &TITLE];
/// static STYLE: KeySet = &[&COLOR];
///
/// let registry = KeyRegistry::builder("Note", ID.name())
///     .keys(OWN)
///     .include(STYLE)
///     .build()
///     .unwrap();
///
/// let names: Vec<_> = registry.iter().map(|(_, key)| key.name()).collect();
/// assert_eq!(names, ["id", "title", "color"]);
/// assert_eq!(registry.id_key().name(), "id");
/// ```
pub struct KeyRegistry {
    type_name: &'static str,
    keys: Vec<KeyDescriptor>,
    by_name: HashMap<&'static str, KeyId>,
    id_key: KeyId,
}

impl KeyRegistry {
    /// Starts a registry for `type_name` whose identity key is named `id_key`.
    #[must_use]
    pub fn builder(type_name: &'static str, id_key: &'static str) -> KeyRegistryBuilder {
        KeyRegistryBuilder {
            type_name,
            id_key,
            keys: Vec::new(),
        }
    }

    /// Builds a registry into `cell` on first use and returns it.
    ///
    /// Concurrent callers block until the first one finishes, so validation
    /// happens before any item of the type exists.
    ///
    /// # Panics
    ///
    /// Panics if `build` fails. A failing registry is a defect in the type
    /// declaring it.
    pub fn init_once(
        cell: &'static OnceLock<Self>,
        build: impl FnOnce() -> Result<Self, RegistryError>,
    ) -> &'static Self {
        cell.get_or_init(|| match build() {
            Ok(registry) => registry,
            Err(err) => panic!("invalid key registry: {err}"),
        })
    }

    /// Returns the name of the type this registry describes.
    #[must_use]
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the number of keys.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if there are no keys.
    ///
    /// Always `false` for a built registry, since the identity key exists.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Looks up a key id by name.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<KeyId> {
        self.by_name.get(name).copied()
    }

    /// Looks up a key by name.
    #[must_use]
    pub fn key(&self, name: &str) -> Option<&KeyDescriptor> {
        self.by_name(name).and_then(|id| self.get(id))
    }

    /// Returns the key with the given id.
    #[must_use]
    pub fn get(&self, id: KeyId) -> Option<&KeyDescriptor> {
        self.keys.get(usize::from(id.index()))
    }

    /// Returns `true` if a key with this name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Returns the identity key.
    #[must_use]
    pub fn id_key(&self) -> &KeyDescriptor {
        &self.keys[usize::from(self.id_key.index())]
    }

    /// Returns the id of the identity key.
    #[must_use]
    #[inline]
    pub fn id_key_id(&self) -> KeyId {
        self.id_key
    }

    /// Returns every key in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (KeyId, &KeyDescriptor)> {
        self.keys.iter().enumerate().map(|(i, key)| {
            #[expect(clippy::cast_possible_truncation, reason = "len checked at build")]
            (KeyId::new(i as u16), key)
        })
    }

    /// Returns every key name in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.keys.iter().map(KeyDescriptor::name)
    }
}

impl core::fmt::Debug for KeyRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("KeyRegistry")
            .field("type_name", &self.type_name)
            .field("id_key", &self.id_key().name())
            .field("keys", &self.names().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// Assembles a [`KeyRegistry`].
///
/// Keys are kept in the order they are added. Validation is deferred to
/// [`build`](Self::build) so that every problem is reported at once.
#[must_use]
pub struct KeyRegistryBuilder {
    type_name: &'static str,
    id_key: &'static str,
    keys: Vec<KeyDescriptor>,
}

impl KeyRegistryBuilder {
    /// Adds the type's own key set.
    pub fn keys(mut self, keys: &[&dyn ErasedKey]) -> Self {
        self.keys.extend(keys.iter().map(|key| key.descriptor()));
        self
    }

    /// Adds a key set shared with other types.
    pub fn include(self, keys: &[&dyn ErasedKey]) -> Self {
        self.keys(keys)
    }

    /// Adds a single key.
    pub fn key(mut self, key: &dyn ErasedKey) -> Self {
        self.keys.push(key.descriptor());
        self
    }

    /// Adds runtime-built descriptors.
    pub fn descriptors(mut self, descriptors: impl IntoIterator<Item = KeyDescriptor>) -> Self {
        self.keys.extend(descriptors);
        self
    }

    /// Validates the collected keys and builds the registry.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::BlankName`] if a key name is blank.
    /// - [`RegistryError::DuplicateKeys`] listing every name used more than
    ///   once, in first-seen order.
    /// - [`RegistryError::TooManyKeys`] if the keys do not fit a [`KeyId`].
    /// - [`RegistryError::MissingIdKey`] if the identity key is not among the
    ///   keys.
    pub fn build(self) -> Result<KeyRegistry, RegistryError> {
        let Self {
            type_name,
            id_key,
            keys,
        } = self;

        if keys.iter().any(|key| key.validate().is_err()) {
            return Err(RegistryError::BlankName { type_name });
        }

        let mut counts: HashMap<&'static str, usize> = HashMap::with_capacity(keys.len());
        let mut duplicates = Vec::new();
        for key in &keys {
            let count = counts.entry(key.name()).or_insert(0);
            *count += 1;
            if *count == 2 {
                duplicates.push(key.name().to_owned());
            }
        }
        if !duplicates.is_empty() {
            return Err(RegistryError::DuplicateKeys {
                type_name,
                names: duplicates,
            });
        }

        if keys.len() > usize::from(u16::MAX) {
            return Err(RegistryError::TooManyKeys { type_name });
        }

        let by_name: HashMap<_, _> = keys
            .iter()
            .enumerate()
            .map(|(i, key)| {
                #[expect(clippy::cast_possible_truncation, reason = "checked above")]
                (key.name(), KeyId::new(i as u16))
            })
            .collect();

        let id = by_name
            .get(id_key)
            .copied()
            .ok_or(RegistryError::MissingIdKey { type_name, id_key })?;

        tracing::debug!(type_name, keys = keys.len(), id_key, "built key registry");

        Ok(KeyRegistry {
            type_name,
            keys,
            by_name,
            id_key: id,
        })
    }
}

impl core::fmt::Debug for KeyRegistryBuilder {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("KeyRegistryBuilder")
            .field("type_name", &self.type_name)
            .field("id_key", &self.id_key)
            .field("count", &self.keys.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::NumberConverter;
    use crate::key::{Key, KeySet};
    use crate::value::ValueKind;

    static ID: Key<String> = Key::new("id").update_allowed(false);
    static TITLE: Key<String> = Key::new("title");
    static X: Key<String> = Key::new("x");
    static OTHER_X: Key<i64> = Key::new("x").converter(&NumberConverter);
    static Y: Key<String> = Key::new("y");

    static BASE: KeySet = &[&ID, &TITLE];

    #[test]
    fn merges_own_and_included_sets_in_order() {
        let registry = KeyRegistry::builder("T", "id")
            .keys(BASE)
            .include(&[&X])
            .key(&Y)
            .build()
            .unwrap();

        assert_eq!(registry.len(), 4);
        assert!(!registry.is_empty());
        assert_eq!(registry.names().collect::<Vec<_>>(), ["id", "title", "x", "y"]);
        assert_eq!(registry.by_name("x"), Some(KeyId::new(2)));
        assert_eq!(registry.by_name("z"), None);
        assert!(registry.contains("title"));
        assert_eq!(registry.id_key_id(), KeyId::new(0));
        assert_eq!(registry.key("y").map(KeyDescriptor::name), Some("y"));
    }

    #[test]
    fn duplicate_names_fail_even_with_different_attributes() {
        let err = KeyRegistry::builder("T", "id")
            .keys(BASE)
            .keys(&[&X, &Y])
            .include(&[&OTHER_X])
            .build()
            .unwrap_err();

        assert_eq!(
            err,
            RegistryError::DuplicateKeys {
                type_name: "T",
                names: vec!["x".into()],
            }
        );
        assert!(err.to_string().contains('x'));
    }

    #[test]
    fn every_duplicate_is_listed_once() {
        let err = KeyRegistry::builder("T", "id")
            .keys(&[&ID, &X, &Y, &X, &Y, &X])
            .build()
            .unwrap_err();

        assert_eq!(
            err,
            RegistryError::DuplicateKeys {
                type_name: "T",
                names: vec!["x".into(), "y".into()],
            }
        );
    }

    #[test]
    fn blank_runtime_names_fail() {
        let blank = KeyDescriptor::unchecked(" ", ValueKind::Any);
        let err = KeyRegistry::builder("T", "id")
            .keys(BASE)
            .descriptors([blank])
            .build()
            .unwrap_err();
        assert_eq!(err, RegistryError::BlankName { type_name: "T" });
    }

    #[test]
    fn missing_id_key_fails() {
        let err = KeyRegistry::builder("T", "uid").keys(BASE).build().unwrap_err();
        assert_eq!(
            err,
            RegistryError::MissingIdKey {
                type_name: "T",
                id_key: "uid",
            }
        );
    }

    #[test]
    fn init_once_builds_a_single_registry() {
        static CELL: OnceLock<KeyRegistry> = OnceLock::new();

        let first = KeyRegistry::init_once(&CELL, || {
            KeyRegistry::builder("T", "id").keys(BASE).build()
        });
        let second = KeyRegistry::init_once(&CELL, || unreachable!());
        assert!(core::ptr::eq(first, second));
    }

    #[test]
    #[should_panic(expected = "invalid key registry")]
    fn init_once_panics_on_configuration_errors() {
        static CELL: OnceLock<KeyRegistry> = OnceLock::new();

        KeyRegistry::init_once(&CELL, || {
            KeyRegistry::builder("T", "id").keys(&[&ID, &ID]).build()
        });
    }

    #[test]
    fn registry_debug() {
        let registry = KeyRegistry::builder("Note", "id").keys(BASE).build().unwrap();
        let debug = format!("{registry:?}");
        assert!(debug.contains("Note"));
        assert!(debug.contains("title"));
    }
}
