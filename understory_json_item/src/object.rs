// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Item type traits.
//!
//! This module provides the [`ItemType`] trait for domain objects backed by a
//! [`JsonItem`], and [`ItemTypeExt`] for delegating property access to it.

use serde_json::Value as JsonValue;

use crate::error::ItemError;
use crate::item::JsonItem;
use crate::key::{ErasedKey, Key};
use crate::registry::KeyRegistry;
use crate::value::{PropertyValue, Value};

/// A domain object whose state lives in a [`JsonItem`].
///
/// # Example
///
/// ```rust
/// use std::sync::OnceLock;
///
/// use understory_json_item::{
///     ItemType, ItemTypeExt, JsonItem, Key, KeyRegistry, KeySet,
/// };
///
/// static ID: Key<String> = Key::new("id").update_allowed(false);
/// static NAME: Key<String> = Key::new("name");
/// static KEYS: KeySet = &[&ID, &NAME];
///
/// struct Room {
///     item: JsonItem,
/// }
///
/// impl ItemType for Room {
///     fn registry() -> &'static KeyRegistry {
///         static REGISTRY: OnceLock<KeyRegistry> = OnceLock::new();
///         KeyRegistry::init_once(&REGISTRY, || {
///             KeyRegistry::builder("Room", ID.name()).keys(KEYS).build()
///         })
///     }
///
///     fn item(&self) -> &JsonItem {
///         &self.item
///     }
///
///     fn item_mut(&mut self) -> &mut JsonItem {
///         &mut self.item
///     }
///
///     fn from_item(item: JsonItem) -> Self {
///         Self { item }
///     }
/// }
///
/// let mut room = Room::with_id("r1");
/// room.set(&NAME, "Atrium");
/// assert_eq!(room.get(&NAME).as_deref(), Some("Atrium"));
/// ```
pub trait ItemType: Sized {
    /// Returns the registry shared by every object of this type.
    ///
    /// Implementations build it once, see [`KeyRegistry::init_once`].
    fn registry() -> &'static KeyRegistry;

    /// Returns the backing item.
    fn item(&self) -> &JsonItem;

    /// Returns the backing item mutably.
    fn item_mut(&mut self) -> &mut JsonItem;

    /// Wraps an item of this type's registry.
    fn from_item(item: JsonItem) -> Self;

    /// Creates an object holding only its id.
    fn with_id(id: impl Into<Value>) -> Self {
        Self::from_item(JsonItem::new(Self::registry(), id))
    }
}

/// Delegating accessors for [`ItemType`] objects.
///
/// Each method forwards to the [`JsonItem`] method of the same name.
pub trait ItemTypeExt: ItemType {
    /// See [`JsonItem::id`].
    fn id(&self) -> &Value {
        self.item().id()
    }

    /// See [`JsonItem::get`].
    fn get<T: PropertyValue>(&self, key: &Key<T>) -> Option<T> {
        self.item().get(key)
    }

    /// See [`JsonItem::get_or`].
    fn get_or<T: PropertyValue>(&self, key: &Key<T>, fallback: T) -> T {
        self.item().get_or(key, fallback)
    }

    /// See [`JsonItem::has`].
    fn has(&self, key: &dyn ErasedKey) -> bool {
        self.item().has(key)
    }

    /// See [`JsonItem::set`].
    fn set<T: PropertyValue>(&mut self, key: &Key<T>, value: impl Into<T>) -> bool {
        self.item_mut().set(key, value)
    }

    /// See [`JsonItem::set_without_dirty_change`].
    fn set_without_dirty_change<T: PropertyValue>(&mut self, key: &Key<T>, value: impl Into<T>) {
        self.item_mut().set_without_dirty_change(key, value);
    }

    /// See [`JsonItem::remove`].
    fn remove(&mut self, key: &dyn ErasedKey) -> bool {
        self.item_mut().remove(key)
    }

    /// See [`JsonItem::mark_dirty`].
    fn mark_dirty(&mut self, keys: &[&dyn ErasedKey]) {
        self.item_mut().mark_dirty(keys);
    }

    /// See [`JsonItem::is_dirty`].
    fn is_dirty(&self, key: &dyn ErasedKey) -> bool {
        self.item().is_dirty(key)
    }

    /// See [`JsonItem::clear_dirty_state`].
    fn clear_dirty_state(&mut self) {
        self.item_mut().clear_dirty_state();
    }

    /// See [`JsonItem::is_known_to_peer`].
    fn is_known_to_peer(&self) -> bool {
        self.item().is_known_to_peer()
    }

    /// See [`JsonItem::set_known_to_peer`].
    fn set_known_to_peer(&mut self, known: bool) {
        self.item_mut().set_known_to_peer(known);
    }

    /// See [`JsonItem::to_json_on_create`].
    fn to_json_on_create(&self) -> JsonValue {
        self.item().to_json_on_create()
    }

    /// See [`JsonItem::to_json_on_update`].
    fn to_json_on_update(&self) -> JsonValue {
        self.item().to_json_on_update()
    }

    /// See [`JsonItem::to_json_on_delete`].
    fn to_json_on_delete(&self) -> JsonValue {
        self.item().to_json_on_delete()
    }

    /// See [`JsonItem::to_json`].
    fn to_json(&self, changed_only: bool) -> JsonValue {
        self.item().to_json(changed_only)
    }

    /// See [`JsonItem::apply_from`].
    ///
    /// # Errors
    ///
    /// Forwards the errors of [`JsonItem::apply_from`].
    fn apply_from(&mut self, json: &JsonValue, mark_dirty: bool) -> Result<(), ItemError> {
        self.item_mut().apply_from(json, mark_dirty)
    }

    /// See [`JsonItem::update_from`].
    ///
    /// # Errors
    ///
    /// Forwards the errors of [`JsonItem::update_from`].
    fn update_from(&mut self, json: &JsonValue, mark_dirty: bool) -> Result<(), ItemError> {
        self.item_mut().update_from(json, mark_dirty)
    }

    /// Creates an independent object of the same type, see [`JsonItem::copy`].
    fn copy_item(&self, include_defaults: bool) -> Self {
        Self::from_item(self.item().copy(include_defaults))
    }
}

impl<I: ItemType> ItemTypeExt for I {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeySet;
    use serde_json::json;
    use std::sync::OnceLock;

    static ID: Key<i64> = Key::new("id").update_allowed(false);
    static SEATS: Key<i64> = Key::new("seats").default_value(|| 4);
    static KEYS: KeySet = &[&ID, &SEATS];

    #[derive(Debug)]
    struct Table {
        item: JsonItem,
    }

    impl ItemType for Table {
        fn registry() -> &'static KeyRegistry {
            static REGISTRY: OnceLock<KeyRegistry> = OnceLock::new();
            KeyRegistry::init_once(&REGISTRY, || {
                KeyRegistry::builder("Table", ID.name()).keys(KEYS).build()
            })
        }

        fn item(&self) -> &JsonItem {
            &self.item
        }

        fn item_mut(&mut self) -> &mut JsonItem {
            &mut self.item
        }

        fn from_item(item: JsonItem) -> Self {
            Self { item }
        }
    }

    #[test]
    fn registry_is_shared() {
        let a = Table::with_id(1);
        let b = Table::with_id(2);
        assert!(core::ptr::eq(a.item().registry(), b.item().registry()));
    }

    #[test]
    fn extension_methods_delegate() {
        let mut table = Table::with_id(7);
        assert_eq!(table.id(), &Value::Int(7));
        assert_eq!(table.get(&SEATS), Some(4));

        table.set_known_to_peer(true);
        table.set(&SEATS, 6);
        assert!(table.is_dirty(&SEATS));
        assert_eq!(table.to_json_on_update(), json!({"seats": "6", "id": "7"}));

        table.clear_dirty_state();
        assert!(!table.is_dirty(&SEATS));
    }

    #[test]
    fn update_from_matches_numeric_ids_in_any_wire_form() {
        let mut table = Table::with_id(7);
        table.update_from(&json!({"id": 7, "seats": 2}), false).unwrap();
        table.update_from(&json!({"id": "7", "seats": 3}), false).unwrap();
        assert_eq!(table.get(&SEATS), Some(3));
        assert!(table.update_from(&json!({"id": 8}), false).is_err());
    }

    #[test]
    fn copy_item_keeps_the_type() {
        let mut table = Table::with_id(7);
        table.set(&SEATS, 2);
        let copy = table.copy_item(false);
        assert_eq!(copy.get(&SEATS), Some(2));
        assert!(!copy.is_known_to_peer());
    }
}
