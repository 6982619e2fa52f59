// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Overstory Calendar: calendar entries and business hours that keep a
//! browser calendar in sync.
//!
//! Every object here is backed by an [`understory_json_item::JsonItem`].
//! Setting a property on an object the client already shows marks it dirty,
//! and the next [`InMemoryEntryProvider::flush`] sends only what changed.
//!
//! - [`Entry`]: a timed or all-day calendar entry, optionally recurring.
//! - [`BusinessHours`]: a weekly slot the calendar highlights.
//! - [`InMemoryEntryProvider`]: owns entries and emits [`Command`]s to a
//!   [`CommandSink`].
//!
//! Property keys live in [`entry`], [`business_hours`] and [`style`] so that
//! generic code can address them through the item API.
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use overstory_calendar::{Command, CommandKind, Entry, InMemoryEntryProvider};
//! use serde_json::json;
//! use understory_json_item::ItemType;
//!
//! let mut provider = InMemoryEntryProvider::new();
//! let mut entry = Entry::with_id("e1");
//! entry.set_title("Review");
//! entry.set_start(Utc.with_ymd_and_hms(2025, 6, 2, 14, 0, 0).unwrap());
//! provider.add_entry(entry);
//!
//! let mut sent: Vec<Command> = Vec::new();
//! provider.flush(&mut sent);
//!
//! // The client moved the entry; that is not echoed back.
//! provider
//!     .apply_client_update(&json!({"id": "e1", "start": "2025-06-02T15:00:00Z"}))
//!     .unwrap();
//! provider.flush(&mut sent);
//! assert_eq!(sent.len(), 1);
//! assert_eq!(sent[0].kind, CommandKind::AddEntries);
//! ```

pub mod business_hours;
mod command;
mod converter;
pub mod entry;
mod error;
mod provider;
pub mod style;

pub use business_hours::{BusinessHours, WORK_WEEK};
pub use command::{Command, CommandKind, CommandSink};
pub use converter::{EntryTimeConverter, HourMinuteConverter};
pub use entry::{DisplayMode, Entry, EntryTime};
pub use error::CalendarError;
pub use provider::{EntryProvider, InMemoryEntryProvider};
pub use style::STYLE_KEYS;
