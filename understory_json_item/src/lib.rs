// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory JSON Item: keyed property bags that synchronize with a remote
//! peer as JSON.
//!
//! An item type declares its keys once; every object of that type then keeps
//! its values in a [`JsonItem`], which records which keys changed since the
//! peer last saw them and renders the JSON objects sent on creation, update
//! and removal.
//!
//! ## Core Concepts
//!
//! ### Keys and registries
//!
//! A [`Key<T>`] names one property and carries its default, update
//! permission and optional [`JsonConverter`]s. Keys are `static` items built
//! with `const` methods, grouped into key sets ([`KeySet`]).
//!
//! A [`KeyRegistry`] merges a type's own key set with any included sets and
//! rejects duplicate names. It is built once per type, before the first item
//! exists, and shared afterwards.
//!
//! ### Values
//!
//! Properties are stored as [`Value`], a closed set of shapes (numbers,
//! strings, timestamps, opaque JSON, lists, sets, …). [`PropertyValue`] maps
//! Rust types onto it; [`codec`] holds the default wire conversion.
//!
//! ### Dirty tracking
//!
//! Once an item is marked as known to the peer, every [`JsonItem::set`] that
//! changes a value marks its key dirty. [`JsonItem::to_json_on_update`] then
//! writes exactly the dirty keys plus the id. Setting an equal value is a
//! no-op, so redundant traffic is never produced.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::OnceLock;
//!
//! use serde_json::json;
//! use understory_json_item::{JsonItem, Key, KeyRegistry, KeySet};
//!
//! static ID: Key<String> = Key::new("id").update_allowed(false);
//! static TITLE: Key<String> = Key::new("title");
//! static COLOR: Key<String> = Key::new("color").default_value(|| "blue".into());
//! static KEYS: KeySet = &[&ID, &TITLE, &COLOR];
//!
//! fn registry() -> &'static KeyRegistry {
//!     static REGISTRY: OnceLock<KeyRegistry> = OnceLock::new();
//!     KeyRegistry::init_once(&REGISTRY, || {
//!         KeyRegistry::builder("Event", ID.name()).keys(KEYS).build()
//!     })
//! }
//!
//! let mut item = JsonItem::new(registry(), "1");
//! item.set(&TITLE, "A");
//! assert!(!item.has_dirty());
//! assert_eq!(
//!     item.to_json_on_create(),
//!     json!({"id": "1", "title": "A", "color": "blue"})
//! );
//!
//! item.set_known_to_peer(true);
//! item.set(&TITLE, "B");
//! assert_eq!(item.dirty_keys(), ["title"]);
//! assert_eq!(item.to_json_on_update(), json!({"title": "B", "id": "1"}));
//!
//! item.clear_dirty_state();
//! assert_eq!(item.to_json_on_update(), json!({"id": "1"}));
//!
//! // Authoritative data from the peer is stored without marking it dirty.
//! item.apply_from(&json!({"id": "1", "title": "Dinner"}), false).unwrap();
//! assert_eq!(item.get(&TITLE).as_deref(), Some("Dinner"));
//! assert!(!item.has_dirty());
//! ```
//!
//! ## Derived keys
//!
//! Types that already expose accessor methods can list them through
//! [`Bean`] and [`bean_accessors!`] instead; [`BeanProperties`] derives the
//! equivalent keys.
//!
//! ## Threading
//!
//! Items are plain values with `&mut self` mutation and no internal locking.
//! Registries are immutable once built and safe to share between threads.

mod bean;
pub mod codec;
mod converter;
mod error;
mod item;
mod key;
mod object;
mod registry;
mod store;
mod value;

pub use bean::{Bean, BeanAccessor, BeanProperties};
pub use converter::{JsonConverter, NumberConverter};
pub use error::{BeanError, ConversionError, ItemError, KeyError, RegistryError};
pub use item::JsonItem;
pub use key::{ErasedKey, Key, KeyDescriptor, KeyFlags, KeySet};
pub use object::{ItemType, ItemTypeExt};
pub use registry::{KeyId, KeyRegistry, KeyRegistryBuilder};
pub use value::{
    ClientSideValue, PropertyValue, SequenceKind, Value, ValueKind, client_side_from_value,
    client_side_into_value,
};

/// A JSON object as produced by the projections.
pub type JsonMap = serde_json::Map<String, serde_json::Value>;

#[doc(hidden)]
pub mod __private {
    pub use paste::paste;
}
