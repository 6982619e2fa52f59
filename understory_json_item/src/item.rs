// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The property bag.
//!
//! [`JsonItem`] holds the values of one synchronizable object together with
//! the set of keys that changed since the remote peer last saw it.
//!
//! ## Key states
//!
//! Every (item, key) pair is in one of three states:
//!
//! | State | Reached by |
//! |-------|------------|
//! | absent | [`remove`](JsonItem::remove); initial state of every key but the id |
//! | present-clean | [`set_without_dirty_change`](JsonItem::set_without_dirty_change), [`set`](JsonItem::set) while unknown to the peer, inbound data applied without marking |
//! | present-dirty | [`set`](JsonItem::set) of a different value while known to the peer, [`mark_dirty`](JsonItem::mark_dirty) |
//!
//! Setting a value equal to the stored one never changes state.
//!
//! ## Projections
//!
//! | Method | Writes |
//! |--------|--------|
//! | [`to_json_on_create`](JsonItem::to_json_on_create) | present keys and keys with a non-null default |
//! | [`to_json_on_update`](JsonItem::to_json_on_update) | dirty keys, then the id |
//! | [`to_json_on_delete`](JsonItem::to_json_on_delete) | the id |
//! | [`to_json`](JsonItem::to_json) | dirty keys, or the on-create set |

use core::fmt;

use serde_json::Value as JsonValue;

use crate::JsonMap;
use crate::error::ItemError;
use crate::key::{ErasedKey, Key, KeyDescriptor};
use crate::registry::{KeyId, KeyRegistry};
use crate::store::{DirtyKeys, ValueStore};
use crate::value::{PropertyValue, Value};

static NULL: Value = Value::Null;

/// A keyed property bag with dirty tracking and JSON projections.
///
/// An item is bound to the [`KeyRegistry`] of its type. Addressing a key the
/// registry does not contain is a programming error and panics.
///
/// # Example
///
/// ```rust
/// use std::sync::OnceLock;
///
/// use serde_json::json;
/// use understory_json_item::{JsonItem, Key, KeyRegistry, KeySet};
///
/// static ID: Key<String> = Key::new("id").update_allowed(false);
/// static TITLE: Key<String> = Key::new("title");
/// static COLOR: Key<String> = Key::new("color");
/// static KEYS: KeySet = &[&ID, &TITLE, &COLOR];
///
/// fn registry() -> &'static KeyRegistry {
///     static REGISTRY: OnceLock<KeyRegistry> = OnceLock::new();
///     KeyRegistry::init_once(&REGISTRY, || {
///         KeyRegistry::builder("Note", ID.name()).keys(KEYS).build()
///     })
/// }
///
/// let mut item = JsonItem::new(registry(), "e1");
/// item.set(&TITLE, "Lunch");
/// assert_eq!(item.to_json_on_create(), json!({"id": "e1", "title": "Lunch"}));
///
/// item.set_known_to_peer(true);
/// item.set(&TITLE, "Lunch2");
/// assert_eq!(item.to_json_on_update(), json!({"title": "Lunch2", "id": "e1"}));
/// assert_eq!(item.to_json_on_delete(), json!({"id": "e1"}));
/// ```
#[derive(Clone)]
pub struct JsonItem {
    registry: &'static KeyRegistry,
    values: ValueStore,
    dirty: DirtyKeys,
    known_to_peer: bool,
}

impl JsonItem {
    /// Creates an item holding only its id, not yet known to the peer.
    ///
    /// The id is stored without marking it dirty.
    #[must_use]
    pub fn new(registry: &'static KeyRegistry, id: impl Into<Value>) -> Self {
        let mut item = Self::empty(registry);
        let id_key = registry.id_key();
        item.values
            .insert(registry.id_key_id(), id_key.normalize(id.into()));
        item
    }

    fn empty(registry: &'static KeyRegistry) -> Self {
        Self {
            registry,
            values: ValueStore::default(),
            dirty: DirtyKeys::default(),
            known_to_peer: false,
        }
    }

    /// Returns the registry this item is bound to.
    #[must_use]
    #[inline]
    pub fn registry(&self) -> &'static KeyRegistry {
        self.registry
    }

    /// Returns the id.
    #[must_use]
    pub fn id(&self) -> &Value {
        self.values.get(self.registry.id_key_id()).unwrap_or(&NULL)
    }

    /// Returns the number of present keys, the id included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no key is present.
    ///
    /// Always `false` in practice, since the id cannot be removed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.len() == 0
    }

    /// Returns the names of all present keys in registry order.
    #[must_use]
    pub fn present_keys(&self) -> Vec<&'static str> {
        self.values
            .iter()
            .filter_map(|(id, _)| self.registry.get(id).map(KeyDescriptor::name))
            .collect()
    }

    fn resolve(&self, name: &str) -> (KeyId, &'static KeyDescriptor) {
        let registry = self.registry;
        match registry
            .by_name(name)
            .and_then(|id| registry.get(id).map(|key| (id, key)))
        {
            Some(found) => found,
            None => panic!(
                "key {name:?} is not registered for {}",
                registry.type_name()
            ),
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Returns the stored value, or a fresh copy of the key's default.
    ///
    /// Returns `None` if neither exists, or if the stored value does not
    /// convert to `T`.
    ///
    /// # Panics
    ///
    /// Panics if the key is not registered for this item's type.
    #[must_use]
    pub fn get<T: PropertyValue>(&self, key: &Key<T>) -> Option<T> {
        let (id, _) = self.resolve(key.name());
        match self.values.get(id) {
            Some(value) => T::from_value(value).ok(),
            None => key.default(),
        }
    }

    /// Returns the stored value, else the key's default, else `fallback`.
    ///
    /// A key default always wins over the fallback.
    ///
    /// # Panics
    ///
    /// Panics if the key is not registered for this item's type.
    #[must_use]
    pub fn get_or<T: PropertyValue>(&self, key: &Key<T>, fallback: T) -> T {
        self.get(key).unwrap_or(fallback)
    }

    /// Returns a copy of the stored value, or of the key's default.
    ///
    /// # Panics
    ///
    /// Panics if no key with this name is registered.
    #[must_use]
    pub fn get_value(&self, name: &str) -> Option<Value> {
        self.get_ref(name).cloned()
    }

    /// Returns the stored value, or the key's default, by reference.
    ///
    /// # Panics
    ///
    /// Panics if no key with this name is registered.
    #[must_use]
    pub fn get_ref(&self, name: &str) -> Option<&Value> {
        let (id, key) = self.resolve(name);
        self.values.get(id).or_else(|| key.default_value())
    }

    /// Returns `true` if a value is stored. Defaults do not count.
    ///
    /// # Panics
    ///
    /// Panics if the key is not registered for this item's type.
    #[must_use]
    pub fn has(&self, key: &dyn ErasedKey) -> bool {
        self.has_value(key.name())
    }

    /// Returns `true` if a value is stored under this name.
    ///
    /// # Panics
    ///
    /// Panics if no key with this name is registered.
    #[must_use]
    pub fn has_value(&self, name: &str) -> bool {
        let (id, _) = self.resolve(name);
        self.values.contains(id)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Stores a value, marking the key dirty if the item is known to the peer.
    ///
    /// Returns `false`, and changes nothing, if the value equals the stored
    /// one.
    ///
    /// # Panics
    ///
    /// Panics if the key is not registered for this item's type.
    pub fn set<T: PropertyValue>(&mut self, key: &Key<T>, value: impl Into<T>) -> bool {
        self.set_value(key.name(), value.into().into_value())
    }

    /// Untyped form of [`set`](Self::set).
    ///
    /// # Panics
    ///
    /// Panics if no key with this name is registered.
    pub fn set_value(&mut self, name: &str, value: Value) -> bool {
        let (id, key) = self.resolve(name);
        let value = key.normalize(value);
        if self.values.get(id) == Some(&value) {
            return false;
        }
        self.values.insert(id, value);
        if self.known_to_peer && self.dirty.insert(id) {
            tracing::trace!(
                type_name = self.registry.type_name(),
                key = key.name(),
                "property marked dirty"
            );
        }
        true
    }

    /// Stores a value without touching the dirty set.
    ///
    /// # Panics
    ///
    /// Panics if the key is not registered for this item's type.
    pub fn set_without_dirty_change<T: PropertyValue>(&mut self, key: &Key<T>, value: impl Into<T>) {
        self.set_value_without_dirty_change(key.name(), value.into().into_value());
    }

    /// Untyped form of [`set_without_dirty_change`](Self::set_without_dirty_change).
    ///
    /// # Panics
    ///
    /// Panics if no key with this name is registered.
    pub fn set_value_without_dirty_change(&mut self, name: &str, value: Value) {
        let (id, key) = self.resolve(name);
        self.values.insert(id, key.normalize(value));
    }

    /// Removes a stored value and clears its dirty flag.
    ///
    /// Returns `true` if a value was removed. The id cannot be removed.
    ///
    /// # Panics
    ///
    /// Panics if the key is not registered for this item's type.
    pub fn remove(&mut self, key: &dyn ErasedKey) -> bool {
        self.remove_value(key.name()).is_some()
    }

    /// Removes a stored value by name, returning it.
    ///
    /// # Panics
    ///
    /// Panics if no key with this name is registered.
    pub fn remove_value(&mut self, name: &str) -> Option<Value> {
        let (id, _) = self.resolve(name);
        if id == self.registry.id_key_id() {
            return None;
        }
        self.dirty.remove(id);
        self.values.remove(id)
    }

    // =========================================================================
    // Dirty tracking
    // =========================================================================

    /// Returns whether the remote peer already knows this item.
    #[must_use]
    #[inline]
    pub fn is_known_to_peer(&self) -> bool {
        self.known_to_peer
    }

    /// Sets whether the remote peer already knows this item.
    ///
    /// Only later calls to [`set`](Self::set) are affected.
    pub fn set_known_to_peer(&mut self, known: bool) {
        self.known_to_peer = known;
    }

    /// Forces keys into the dirty set without changing their values.
    ///
    /// Used when a key's wire form depends on another key that changed.
    ///
    /// # Panics
    ///
    /// Panics if a key is not registered for this item's type.
    pub fn mark_dirty(&mut self, keys: &[&dyn ErasedKey]) {
        for key in keys {
            let (id, key) = self.resolve(key.name());
            if self.dirty.insert(id) {
                tracing::trace!(
                    type_name = self.registry.type_name(),
                    key = key.name(),
                    "property marked dirty manually"
                );
            }
        }
    }

    /// Clears the dirty flag of one key. Returns `true` if it was dirty.
    ///
    /// # Panics
    ///
    /// Panics if the key is not registered for this item's type.
    pub fn clear_dirty(&mut self, key: &dyn ErasedKey) -> bool {
        let (id, _) = self.resolve(key.name());
        self.dirty.remove(id)
    }

    /// Clears every dirty flag.
    ///
    /// Call this after the peer acknowledged an update.
    pub fn clear_dirty_state(&mut self) {
        self.dirty.clear();
    }

    /// Returns `true` if the key is dirty.
    ///
    /// # Panics
    ///
    /// Panics if the key is not registered for this item's type.
    #[must_use]
    pub fn is_dirty(&self, key: &dyn ErasedKey) -> bool {
        let (id, _) = self.resolve(key.name());
        self.dirty.contains(id)
    }

    /// Returns `true` if any key is dirty.
    #[must_use]
    pub fn has_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Returns the names of the dirty keys in registry order.
    #[must_use]
    pub fn dirty_keys(&self) -> Vec<&'static str> {
        let mut names = Vec::with_capacity(self.dirty.len());
        names.extend(
            self.dirty
                .iter()
                .filter_map(|id| self.registry.get(id).map(KeyDescriptor::name)),
        );
        names
    }

    // =========================================================================
    // Outbound projections
    // =========================================================================

    fn write(&self, map: &mut JsonMap, id: KeyId, key: &KeyDescriptor) {
        match self.values.get(id).or_else(|| key.default_value()) {
            Some(value) => {
                map.insert(key.name().to_owned(), key.to_json(value));
            }
            // Dirty keys are always sent, even without a value.
            None if self.dirty.contains(id) => {
                map.insert(key.name().to_owned(), JsonValue::Null);
            }
            None => {}
        }
    }

    fn creates(&self, id: KeyId, key: &KeyDescriptor) -> bool {
        self.values.contains(id) || key.has_non_null_default()
    }

    /// Builds the object sent when the peer first learns about this item.
    ///
    /// Writes every present key and every key with a non-null default.
    #[must_use]
    pub fn to_json_on_create(&self) -> JsonValue {
        let mut map = JsonMap::new();
        for (id, key) in self.registry.iter() {
            if self.creates(id, key) {
                self.write(&mut map, id, key);
            }
        }
        JsonValue::Object(map)
    }

    /// Builds the object sent for an incremental change.
    ///
    /// Writes the dirty keys in registry order, then the id. The dirty set is
    /// left alone; clear it once the peer acknowledged the update.
    #[must_use]
    pub fn to_json_on_update(&self) -> JsonValue {
        if !self.known_to_peer {
            tracing::warn!(
                type_name = self.registry.type_name(),
                "update projection requested for an item unknown to the peer"
            );
        }
        let id_key = self.registry.id_key_id();
        let mut map = JsonMap::new();
        for id in self.dirty.iter().filter(|id| *id != id_key) {
            if let Some(key) = self.registry.get(id) {
                self.write(&mut map, id, key);
            }
        }
        self.write(&mut map, id_key, self.registry.id_key());
        JsonValue::Object(map)
    }

    /// Builds the object sent when this item is removed.
    #[must_use]
    pub fn to_json_on_delete(&self) -> JsonValue {
        let mut map = JsonMap::new();
        self.write(&mut map, self.registry.id_key_id(), self.registry.id_key());
        JsonValue::Object(map)
    }

    /// Builds a snapshot over every key.
    ///
    /// With `changed_only`, writes the dirty keys; otherwise follows the
    /// on-create rule.
    #[must_use]
    pub fn to_json(&self, changed_only: bool) -> JsonValue {
        let mut map = JsonMap::new();
        for (id, key) in self.registry.iter() {
            if self.includes(id, key, changed_only) {
                self.write(&mut map, id, key);
            }
        }
        JsonValue::Object(map)
    }

    /// Builds a snapshot over the given keys, in the given order.
    ///
    /// # Panics
    ///
    /// Panics if a key is not registered for this item's type.
    #[must_use]
    pub fn to_json_for(&self, keys: &[&dyn ErasedKey], changed_only: bool) -> JsonValue {
        let mut map = JsonMap::new();
        for key in keys {
            let (id, key) = self.resolve(key.name());
            if self.includes(id, key, changed_only) {
                self.write(&mut map, id, key);
            }
        }
        JsonValue::Object(map)
    }

    fn includes(&self, id: KeyId, key: &KeyDescriptor, changed_only: bool) -> bool {
        if changed_only {
            self.dirty.contains(id)
        } else {
            self.creates(id, key)
        }
    }

    // =========================================================================
    // Inbound application
    // =========================================================================

    /// Applies properties arriving from the peer.
    ///
    /// Every registered key that allows updates and appears in `json` is
    /// decoded. With `mark_dirty`, the values go through [`set`](Self::set);
    /// otherwise they are stored silently and their dirty flags cleared.
    /// Keys that do not allow updates are skipped.
    ///
    /// Nothing is stored unless every value decodes.
    ///
    /// # Errors
    ///
    /// - [`ItemError::NotAnObject`] if `json` is not an object.
    /// - [`ItemError::Conversion`] naming the first key that failed to decode.
    pub fn apply_from(&mut self, json: &JsonValue, mark_dirty: bool) -> Result<(), ItemError> {
        let object = json.as_object().ok_or(ItemError::NotAnObject)?;
        let registry = self.registry;

        let mut decoded = Vec::new();
        for (id, key) in registry.iter() {
            let Some(incoming) = object.get(key.name()) else {
                continue;
            };
            if !key.is_update_allowed() {
                tracing::trace!(
                    type_name = registry.type_name(),
                    key = key.name(),
                    "skipping read-only property"
                );
                continue;
            }
            let value = key
                .from_json(incoming)
                .map_err(|source| ItemError::Conversion {
                    key: key.name(),
                    source,
                })?;
            decoded.push((key.name(), id, value));
        }

        for (name, id, value) in decoded {
            if mark_dirty {
                self.set_value(name, value);
            } else {
                self.values.insert(id, value);
                if self.dirty.remove(id) {
                    tracing::trace!(
                        type_name = registry.type_name(),
                        key = name,
                        "dirty flag cleared by inbound value"
                    );
                }
            }
        }
        Ok(())
    }

    /// Applies properties after checking that `json` describes this item.
    ///
    /// # Errors
    ///
    /// - [`ItemError::NotAnObject`] if `json` is not an object.
    /// - [`ItemError::IdMismatch`] if its id is missing or differs.
    /// - Any error of [`apply_from`](Self::apply_from).
    pub fn update_from(&mut self, json: &JsonValue, mark_dirty: bool) -> Result<(), ItemError> {
        let object = json.as_object().ok_or(ItemError::NotAnObject)?;
        let id_key = self.registry.id_key();
        let found = object.get(id_key.name()).cloned().unwrap_or(JsonValue::Null);
        let matches = id_key
            .from_json(&found)
            .is_ok_and(|incoming| !found.is_null() && &incoming == self.id());
        if !matches {
            return Err(ItemError::IdMismatch {
                expected: id_key.to_json(self.id()),
                found,
            });
        }
        self.apply_from(json, mark_dirty)
    }

    // =========================================================================
    // Copy
    // =========================================================================

    /// Creates an independent item of the same type.
    ///
    /// Present values are copied, and with `include_defaults` every key with
    /// a default receives it as a stored value. Sequences and JSON payloads
    /// are deep copies. The copy is unknown to the peer and has no dirty keys.
    #[must_use]
    pub fn copy(&self, include_defaults: bool) -> Self {
        let mut copy = Self::empty(self.registry);
        for (id, key) in self.registry.iter() {
            let value = match self.values.get(id) {
                Some(value) => value,
                None if include_defaults => match key.default_value() {
                    Some(default) => default,
                    None => continue,
                },
                None => continue,
            };
            copy.values.insert(id, value.clone());
        }
        copy
    }
}

impl fmt::Debug for JsonItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values: Vec<_> = self
            .values
            .iter()
            .filter_map(|(id, value)| self.registry.get(id).map(|key| (key.name(), value)))
            .collect();
        f.debug_struct("JsonItem")
            .field("type_name", &self.registry.type_name())
            .field("known_to_peer", &self.known_to_peer)
            .field("values", &values)
            .field("dirty", &self.dirty_keys())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeySet;
    use crate::value::SequenceKind;
    use serde_json::json;
    use std::sync::OnceLock;

    static ID: Key<String> = Key::new("id").update_allowed(false);
    static TITLE: Key<String> = Key::new("title");
    static COLOR: Key<String> = Key::new("color").default_value(|| "blue".into());
    static COUNT: Key<i64> = Key::new("count");
    static LOCKED: Key<bool> = Key::new("locked").update_allowed(false);
    static TAGS: Key<Vec<String>> = Key::new("tags").sequence(SequenceKind::Set);
    static NOTE: Key<Option<String>> = Key::new("note");

    static KEYS: KeySet = &[&ID, &TITLE, &COLOR, &COUNT, &LOCKED, &TAGS, &NOTE];

    fn registry() -> &'static KeyRegistry {
        static REGISTRY: OnceLock<KeyRegistry> = OnceLock::new();
        KeyRegistry::init_once(&REGISTRY, || {
            KeyRegistry::builder("Sample", ID.name()).keys(KEYS).build()
        })
    }

    fn known(id: &str) -> JsonItem {
        let mut item = JsonItem::new(registry(), id);
        item.set_known_to_peer(true);
        item
    }

    #[test]
    fn new_item_holds_only_its_id() {
        let item = JsonItem::new(registry(), "1");
        assert_eq!(item.id(), &Value::from("1"));
        assert!(item.has(&ID));
        assert!(!item.has(&TITLE));
        assert!(!item.has_dirty());
        assert!(!item.is_known_to_peer());
        assert_eq!(item.present_keys(), ["id"]);
        assert_eq!(item.len(), 1);
    }

    #[test]
    fn set_while_unknown_is_clean() {
        let mut item = JsonItem::new(registry(), "1");
        assert!(item.set(&TITLE, "A"));
        assert_eq!(item.get(&TITLE).as_deref(), Some("A"));
        assert!(!item.is_dirty(&TITLE));
    }

    #[test]
    fn set_while_known_is_dirty() {
        let mut item = known("1");
        item.set(&TITLE, "A");
        assert!(item.is_dirty(&TITLE));
        assert_eq!(item.dirty_keys(), ["title"]);
    }

    #[test]
    fn setting_an_equal_value_is_a_no_op() {
        let mut item = known("1");
        item.set(&TITLE, "A");
        item.clear_dirty_state();
        assert!(!item.set(&TITLE, "A"));
        assert!(!item.has_dirty());
    }

    #[test]
    fn replacing_a_set_with_a_larger_one_is_a_change() {
        let mut item = known("1");
        item.set_value("tags", Value::Set(vec![Value::from("a"), Value::from("a")]));
        item.clear_dirty_state();

        let tags = Value::Set(vec![Value::from("a"), Value::from("b")]);
        assert!(item.set_value("tags", tags.clone()));
        assert_eq!(item.get_ref("tags"), Some(&tags));
        assert_eq!(item.dirty_keys(), ["tags"]);
    }

    #[test]
    fn dirty_keys_without_value_are_sent_as_null() {
        let mut item = known("1");
        item.mark_dirty(&[&TITLE]);
        let update = item.to_json_on_update();
        assert_eq!(update, json!({"title": null, "id": "1"}));
        assert_eq!(item.to_json(true), json!({"title": null}));
        assert_eq!(item.to_json(false), json!({"id": "1", "color": "blue"}));
    }

    #[test]
    fn null_is_present() {
        let mut item = known("1");
        item.set(&NOTE, None::<String>);
        assert!(item.has(&NOTE));
        assert_eq!(item.get(&NOTE), Some(None));
        assert_eq!(item.get_ref("note"), Some(&Value::Null));
    }

    #[test]
    fn silent_set_leaves_dirty_set_alone() {
        let mut item = known("1");
        item.set_without_dirty_change(&TITLE, "A");
        assert!(item.has(&TITLE));
        assert!(!item.is_dirty(&TITLE));

        item.set(&COUNT, 2);
        item.set_without_dirty_change(&COUNT, 3);
        assert!(item.is_dirty(&COUNT));
        assert_eq!(item.get(&COUNT), Some(3));
    }

    #[test]
    fn remove_clears_value_and_dirty_flag() {
        let mut item = known("1");
        item.set(&TITLE, "A");
        assert!(item.remove(&TITLE));
        assert!(!item.has(&TITLE));
        assert!(!item.is_dirty(&TITLE));
        assert!(!item.remove(&TITLE));
    }

    #[test]
    fn id_cannot_be_removed() {
        let mut item = known("1");
        assert!(!item.remove(&ID));
        assert_eq!(item.id(), &Value::from("1"));
    }

    #[test]
    fn defaults_are_read_but_not_present() {
        let item = JsonItem::new(registry(), "1");
        assert!(!item.has(&COLOR));
        assert_eq!(item.get(&COLOR).as_deref(), Some("blue"));
        assert_eq!(item.get_value("color"), Some(Value::from("blue")));
        assert_eq!(item.get(&COUNT), None);
    }

    #[test]
    fn key_default_beats_fallback() {
        let item = JsonItem::new(registry(), "1");
        assert_eq!(item.get_or(&COLOR, "red".into()), "blue");
        assert_eq!(item.get_or(&COUNT, 7), 7);
    }

    #[test]
    fn sequences_are_normalized_to_the_key_container() {
        let mut item = known("1");
        item.set(&TAGS, vec!["a".to_owned(), "b".to_owned(), "a".to_owned()]);
        assert_eq!(
            item.get_ref("tags"),
            Some(&Value::Set(vec![Value::from("a"), Value::from("b")]))
        );
        item.clear_dirty_state();
        // Same set in a different order is equal.
        assert!(!item.set(&TAGS, vec!["b".to_owned(), "a".to_owned()]));
    }

    #[test]
    fn mark_dirty_forces_keys() {
        let mut item = JsonItem::new(registry(), "1");
        item.set(&TITLE, "A");
        item.mark_dirty(&[&TITLE, &COLOR]);
        assert_eq!(item.dirty_keys(), ["title", "color"]);
        assert!(item.clear_dirty(&COLOR));
        assert!(!item.clear_dirty(&COLOR));
    }

    #[test]
    fn create_projection_includes_defaults() {
        let mut item = JsonItem::new(registry(), "1");
        item.set(&TITLE, "A");
        assert_eq!(
            item.to_json_on_create(),
            json!({"id": "1", "title": "A", "color": "blue"})
        );
    }

    #[test]
    fn update_projection_puts_id_last() {
        let mut item = known("1");
        item.set(&COUNT, 4);
        item.set(&TITLE, "B");
        let update = item.to_json_on_update();
        let names: Vec<_> = update.as_object().unwrap().keys().cloned().collect();
        assert_eq!(names, ["title", "count", "id"]);
        assert_eq!(update, json!({"title": "B", "count": "4", "id": "1"}));
        // No side effect.
        assert!(item.is_dirty(&TITLE));
    }

    #[test]
    fn update_projection_with_dirty_id_writes_it_once() {
        let mut item = known("1");
        item.set(&TITLE, "B");
        item.mark_dirty(&[&ID]);
        let update = item.to_json_on_update();
        let names: Vec<_> = update.as_object().unwrap().keys().cloned().collect();
        assert_eq!(names, ["title", "id"]);
    }

    #[test]
    fn snapshot_projections() {
        let mut item = known("1");
        item.set_without_dirty_change(&TITLE, "A");
        item.set(&COUNT, 1);

        assert_eq!(item.to_json(true), json!({"count": "1"}));
        assert_eq!(
            item.to_json(false),
            json!({"id": "1", "title": "A", "color": "blue", "count": "1"})
        );
        assert_eq!(
            item.to_json_for(&[&COUNT, &TITLE, &NOTE], false),
            json!({"count": "1", "title": "A"})
        );
        assert_eq!(item.to_json_for(&[&TITLE], true), json!({}));
        assert_eq!(item.to_json_on_delete(), json!({"id": "1"}));
    }

    #[test]
    fn apply_without_marking_clears_dirty_flags() {
        let mut item = known("1");
        item.set(&TITLE, "Mine");
        item.apply_from(&json!({"id": "1", "title": "Theirs"}), false)
            .unwrap();
        assert_eq!(item.get(&TITLE).as_deref(), Some("Theirs"));
        assert!(!item.is_dirty(&TITLE));
    }

    #[test]
    fn apply_with_marking_uses_set() {
        let mut item = known("1");
        item.apply_from(&json!({"title": "T", "count": 3}), true)
            .unwrap();
        assert_eq!(item.dirty_keys(), ["title", "count"]);
        assert_eq!(item.get(&COUNT), Some(3));
    }

    #[test]
    fn apply_skips_read_only_keys() {
        let mut item = known("1");
        item.apply_from(&json!({"id": "2", "locked": true}), true)
            .unwrap();
        assert_eq!(item.id(), &Value::from("1"));
        assert!(!item.has(&LOCKED));
    }

    #[test]
    fn apply_is_all_or_nothing() {
        let mut item = known("1");
        let err = item
            .apply_from(&json!({"title": "T", "count": "many"}), true)
            .unwrap_err();
        assert!(matches!(err, ItemError::Conversion { key: "count", .. }));
        assert!(!item.has(&TITLE));
        assert!(!item.has_dirty());
    }

    #[test]
    fn apply_rejects_non_objects() {
        let mut item = known("1");
        assert_eq!(item.apply_from(&json!([1]), true), Err(ItemError::NotAnObject));
    }

    #[test]
    fn update_from_checks_the_id() {
        let mut item = known("1");
        assert_eq!(
            item.update_from(&json!({"id": "2", "title": "T"}), false),
            Err(ItemError::IdMismatch {
                expected: json!("1"),
                found: json!("2"),
            })
        );
        assert_eq!(
            item.update_from(&json!({"title": "T"}), false),
            Err(ItemError::IdMismatch {
                expected: json!("1"),
                found: json!(null),
            })
        );
        assert!(!item.has(&TITLE));

        item.update_from(&json!({"id": "1", "title": "T"}), false)
            .unwrap();
        assert_eq!(item.get(&TITLE).as_deref(), Some("T"));
    }

    #[test]
    fn copy_is_independent_and_clean() {
        let mut item = known("1");
        item.set(&TAGS, vec!["a".to_owned()]);
        item.set(&TITLE, "A");

        let mut copy = item.copy(false);
        assert!(!copy.is_known_to_peer());
        assert!(!copy.has_dirty());
        assert!(!copy.has(&COLOR));
        assert_eq!(copy.get(&TAGS), item.get(&TAGS));

        copy.set(&TAGS, vec!["b".to_owned()]);
        assert_eq!(item.get(&TAGS), Some(vec!["a".to_owned()]));
    }

    #[test]
    fn copy_with_defaults_stores_them() {
        let item = JsonItem::new(registry(), "1");
        let copy = item.copy(true);
        assert!(copy.has(&COLOR));
        assert!(!copy.has(&COUNT));
        assert_eq!(copy.id(), item.id());
    }

    #[test]
    #[should_panic(expected = "not registered for Sample")]
    fn unregistered_keys_panic() {
        static STRAY: Key<String> = Key::new("stray");
        let item = JsonItem::new(registry(), "1");
        let _ = item.has(&STRAY);
    }

    #[test]
    fn debug_lists_values_by_name() {
        let mut item = known("1");
        item.set(&TITLE, "A");
        let debug = format!("{item:?}");
        assert!(debug.contains("Sample"));
        assert!(debug.contains("title"));
    }
}
