// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Entry hosts.
//!
//! An [`EntryProvider`] resolves entry ids for the calendar.
//! [`InMemoryEntryProvider`] also owns its entries and turns their changes
//! into [`Command`]s.

use hashbrown::HashMap;
use serde_json::Value as JsonValue;
use understory_json_item::{ItemType, ItemTypeExt};

use crate::command::{Command, CommandKind, CommandSink};
use crate::entry::{self, Entry};
use crate::error::CalendarError;

/// Looks entries up by id.
pub trait EntryProvider {
    /// Returns the entry with this id.
    fn entry_by_id(&self, id: &str) -> Option<&Entry>;

    /// Returns every entry.
    fn entries(&self) -> impl Iterator<Item = &Entry>;
}

/// Entries held in memory, in insertion order.
///
/// Entries added here are created on the client with the next
/// [`flush`](Self::flush); changes made through
/// [`entry_mut`](Self::entry_mut) afterwards are sent as updates.
///
/// # Example
///
/// ```rust
/// use overstory_calendar::{Command, CommandKind, Entry, InMemoryEntryProvider};
/// use serde_json::json;
/// use understory_json_item::ItemType;
///
/// let mut provider = InMemoryEntryProvider::new();
/// let mut entry = Entry::with_id("e1");
/// entry.set_title("Lunch");
/// provider.add_entry(entry);
///
/// let mut sent: Vec<Command> = Vec::new();
/// provider.flush(&mut sent);
/// assert_eq!(sent[0].kind, CommandKind::AddEntries);
///
/// provider.entry_mut("e1").unwrap().set_title("Lunch2");
/// provider.flush(&mut sent);
/// assert_eq!(sent[1].payload, json!([{"title": "Lunch2", "id": "e1"}]));
/// ```
#[derive(Debug, Default)]
pub struct InMemoryEntryProvider {
    entries: HashMap<String, Entry>,
    order: Vec<String>,
    removed: Vec<JsonValue>,
}

impl InMemoryEntryProvider {
    /// Creates an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Adds an entry, replacing and returning one with the same id.
    pub fn add_entry(&mut self, entry: Entry) -> Option<Entry> {
        let id = entry.id_str().to_owned();
        let replaced = self.entries.insert(id.clone(), entry);
        if replaced.is_none() {
            self.order.push(id);
        }
        replaced
    }

    /// Adds several entries.
    pub fn add_entries(&mut self, entries: impl IntoIterator<Item = Entry>) {
        for entry in entries {
            self.add_entry(entry);
        }
    }

    /// Returns an entry for modification.
    pub fn entry_mut(&mut self, id: &str) -> Option<&mut Entry> {
        self.entries.get_mut(id)
    }

    /// Removes an entry.
    ///
    /// If the client knows it, its removal is sent with the next flush.
    pub fn remove_entry(&mut self, id: &str) -> Option<Entry> {
        let entry = self.entries.remove(id)?;
        self.order.retain(|other| other != id);
        if entry.is_known_to_peer() {
            self.removed.push(entry.to_json_on_delete());
        }
        Some(entry)
    }

    /// Removes every entry.
    pub fn remove_all(&mut self) {
        for id in core::mem::take(&mut self.order) {
            if let Some(entry) = self.entries.remove(&id)
                && entry.is_known_to_peer()
            {
                self.removed.push(entry.to_json_on_delete());
            }
        }
    }

    /// Returns `true` if the next flush would send anything.
    #[must_use]
    pub fn has_pending_changes(&self) -> bool {
        !self.removed.is_empty()
            || self
                .entries
                .values()
                .any(|entry| !entry.is_known_to_peer() || entry.item().has_dirty())
    }

    /// Sends pending removals, creations and updates, one command each.
    ///
    /// Afterwards every entry is known to the client and clean.
    pub fn flush(&mut self, sink: &mut impl CommandSink) {
        let removed = core::mem::take(&mut self.removed);
        let mut added = Vec::new();
        let mut updated = Vec::new();
        for id in &self.order {
            let Some(entry) = self.entries.get_mut(id) else {
                continue;
            };
            if !entry.is_known_to_peer() {
                added.push(entry.to_json_on_create());
                entry.set_known_to_peer(true);
            } else if entry.item().has_dirty() {
                updated.push(entry.to_json_on_update());
            }
            entry.clear_dirty_state();
        }

        tracing::debug!(
            added = added.len(),
            updated = updated.len(),
            removed = removed.len(),
            "flushing entry changes"
        );
        for (kind, payload) in [
            (CommandKind::RemoveEntries, removed),
            (CommandKind::AddEntries, added),
            (CommandKind::UpdateEntries, updated),
        ] {
            if !payload.is_empty() {
                sink.send(Command {
                    kind,
                    payload: JsonValue::Array(payload),
                });
            }
        }
    }

    /// Applies a change made on the client, such as a drag or resize.
    ///
    /// The entry is looked up by the id in `json`. The change is stored
    /// without marking it dirty, since the client already shows it. Start
    /// and end are stored in the form the all-day flag calls for.
    ///
    /// # Errors
    ///
    /// - [`CalendarError::MissingId`] if `json` names no entry.
    /// - [`CalendarError::UnknownEntry`] if no such entry is held.
    /// - [`CalendarError::Item`] if the entry rejects the data.
    pub fn apply_client_update(&mut self, json: &JsonValue) -> Result<&Entry, CalendarError> {
        let id = match json.get(entry::ID.name()) {
            Some(JsonValue::String(id)) => id.clone(),
            Some(JsonValue::Number(id)) => id.to_string(),
            _ => return Err(CalendarError::MissingId),
        };
        let entry = self
            .entries
            .get_mut(&id)
            .ok_or(CalendarError::UnknownEntry(id))?;
        entry.update_from(json, false)?;
        entry.anchor_bounds();
        Ok(entry)
    }
}

impl EntryProvider for InMemoryEntryProvider {
    fn entry_by_id(&self, id: &str) -> Option<&Entry> {
        self.entries.get(id)
    }

    fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }
}
