// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sparse per-item storage.
//!
//! Both containers here are sorted vectors searched by [`KeyId`]. Ids follow
//! registry declaration order, so iterating either one yields keys in
//! registry order. Typical items set a handful of keys, which fit inline
//! without a heap allocation.

use smallvec::SmallVec;

use crate::registry::KeyId;
use crate::value::Value;

const INLINE_CAPACITY: usize = 8;

/// Stored values of one item, keyed by [`KeyId`].
///
/// Absence and [`Value::Null`] are distinct: a key holding null is present.
#[derive(Clone, Debug, Default)]
pub(crate) struct ValueStore {
    entries: SmallVec<[(KeyId, Value); INLINE_CAPACITY]>,
}

impl ValueStore {
    #[inline]
    fn find(&self, id: KeyId) -> Result<usize, usize> {
        self.entries.binary_search_by_key(&id, |(key, _)| *key)
    }

    pub(crate) fn get(&self, id: KeyId) -> Option<&Value> {
        self.find(id).ok().map(|idx| &self.entries[idx].1)
    }

    pub(crate) fn contains(&self, id: KeyId) -> bool {
        self.find(id).is_ok()
    }

    /// Stores `value`, returning the previous one.
    pub(crate) fn insert(&mut self, id: KeyId, value: Value) -> Option<Value> {
        match self.find(id) {
            Ok(idx) => Some(core::mem::replace(&mut self.entries[idx].1, value)),
            Err(idx) => {
                self.entries.insert(idx, (id, value));
                None
            }
        }
    }

    pub(crate) fn remove(&mut self, id: KeyId) -> Option<Value> {
        self.find(id).ok().map(|idx| self.entries.remove(idx).1)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (KeyId, &Value)> {
        self.entries.iter().map(|(id, value)| (*id, value))
    }
}

/// The dirty keys of one item.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct DirtyKeys {
    ids: SmallVec<[KeyId; INLINE_CAPACITY]>,
}

impl DirtyKeys {
    pub(crate) fn contains(&self, id: KeyId) -> bool {
        self.ids.binary_search(&id).is_ok()
    }

    /// Returns `true` if the key was not dirty before.
    pub(crate) fn insert(&mut self, id: KeyId) -> bool {
        match self.ids.binary_search(&id) {
            Ok(_) => false,
            Err(idx) => {
                self.ids.insert(idx, id);
                true
            }
        }
    }

    /// Returns `true` if the key was dirty.
    pub(crate) fn remove(&mut self, id: KeyId) -> bool {
        match self.ids.binary_search(&id) {
            Ok(idx) => {
                self.ids.remove(idx);
                true
            }
            Err(_) => false,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.ids.clear();
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.ids.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = KeyId> + '_ {
        self.ids.iter().copied()
    }
}
