// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Calendar entries.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use serde_json::Value as JsonValue;
use understory_json_item::{
    ClientSideValue, ConversionError, ErasedKey, ItemType, ItemTypeExt, JsonItem, Key,
    KeyRegistry, KeySet, NumberConverter, PropertyValue, SequenceKind, Value, ValueKind,
    client_side_from_value, client_side_into_value,
};
use uuid::Uuid;

use crate::converter::EntryTimeConverter;
use crate::style::{self, STYLE_KEYS};

/// The start or end of an entry.
///
/// All-day entries are anchored to dates; timed entries to instants.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EntryTime {
    /// A timed boundary.
    DateTime(DateTime<Utc>),
    /// An all-day boundary.
    Date(NaiveDate),
}

impl EntryTime {
    /// Returns the calendar date of this boundary.
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        match self {
            Self::DateTime(ts) => ts.date_naive(),
            Self::Date(date) => *date,
        }
    }

    /// Returns this boundary as an instant; dates map to midnight UTC.
    #[must_use]
    pub fn to_date_time(&self) -> DateTime<Utc> {
        match self {
            Self::DateTime(ts) => *ts,
            Self::Date(date) => Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)),
        }
    }

    /// Returns `true` for an all-day boundary.
    #[must_use]
    pub fn is_date(&self) -> bool {
        matches!(self, Self::Date(_))
    }
}

impl From<DateTime<Utc>> for EntryTime {
    fn from(value: DateTime<Utc>) -> Self {
        Self::DateTime(value)
    }
}

impl From<NaiveDate> for EntryTime {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl PropertyValue for EntryTime {
    const KIND: ValueKind = ValueKind::Timestamp;

    fn into_value(self) -> Value {
        match self {
            Self::DateTime(ts) => Value::Timestamp(ts),
            Self::Date(date) => Value::Date(date),
        }
    }

    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Timestamp(ts) => Ok(Self::DateTime(*ts)),
            Value::Date(date) => Ok(Self::Date(*date)),
            other => Err(ConversionError::TypeMismatch {
                expected: "timestamp or date",
                found: other.kind_name(),
            }),
        }
    }
}

/// How an entry is rendered.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum DisplayMode {
    /// Block for all-day and multi-day entries, list item otherwise.
    #[default]
    Auto,
    /// A solid block.
    Block,
    /// A dot followed by the title.
    ListItem,
    /// A shaded background area.
    Background,
    /// A shaded area everywhere except the entry's range.
    InverseBackground,
    /// Not rendered.
    None,
}

impl ClientSideValue for DisplayMode {
    const VARIANTS: &'static [Self] = &[
        Self::Auto,
        Self::Block,
        Self::ListItem,
        Self::Background,
        Self::InverseBackground,
        Self::None,
    ];

    fn client_side_value(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Block => "block",
            Self::ListItem => "list-item",
            Self::Background => "background",
            Self::InverseBackground => "inverse-background",
            Self::None => "none",
        }
    }
}

impl PropertyValue for DisplayMode {
    const KIND: ValueKind = ValueKind::String;

    fn into_value(self) -> Value {
        client_side_into_value(self)
    }

    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        client_side_from_value(value)
    }
}

/// Unique id, assigned at creation.
pub static ID: Key<String> = Key::new("id").update_allowed(false);
/// Entries sharing a group id are dragged and resized together.
pub static GROUP_ID: Key<String> = Key::new("groupId");
/// Display title.
pub static TITLE: Key<String> = Key::new("title");
/// Inclusive start.
pub static START: Key<EntryTime> = Key::new("start").converter(&EntryTimeConverter);
/// Exclusive end.
pub static END: Key<EntryTime> = Key::new("end").converter(&EntryTimeConverter);
/// Whether the entry spans whole days.
pub static ALL_DAY: Key<bool> = Key::new("allDay").default_value(|| false);
/// Whether the entry may be moved and resized.
pub static EDITABLE: Key<bool> = Key::new("editable").default_value(|| true);
/// Overrides [`EDITABLE`] for moving.
pub static START_EDITABLE: Key<bool> = Key::new("startEditable");
/// Overrides [`EDITABLE`] for resizing.
pub static DURATION_EDITABLE: Key<bool> = Key::new("durationEditable");
/// Rendering mode.
pub static DISPLAY: Key<DisplayMode> = Key::new("display").default_value(DisplayMode::default);
/// Group id or `"businessHours"` the entry must stay within when moved.
pub static CONSTRAINT: Key<String> = Key::new("constraint");
/// Whether other entries may overlap this one.
pub static OVERLAP: Key<bool> = Key::new("overlap");
/// CSS class names attached to the rendered entry.
pub static CLASS_NAMES: Key<BTreeSet<String>> = Key::new("classNames");
/// Free text shown in detail views.
pub static DESCRIPTION: Key<String> = Key::new("description");
/// Application data passed through to the client untouched.
pub static CUSTOM_PROPERTIES: Key<JsonValue> = Key::new("customProperties");
/// Weekdays a recurring entry repeats on.
pub static DAYS_OF_WEEK: Key<Vec<Weekday>> = Key::new("daysOfWeek")
    .sequence(SequenceKind::Set)
    .element_converter(&NumberConverter);
/// First day of recurrence.
pub static START_RECUR: Key<NaiveDate> = Key::new("startRecur");
/// Day after the last day of recurrence.
pub static END_RECUR: Key<NaiveDate> = Key::new("endRecur");
/// Daily start time of a recurring entry.
pub static START_TIME: Key<NaiveTime> = Key::new("startTime");
/// Daily end time of a recurring entry.
pub static END_TIME: Key<NaiveTime> = Key::new("endTime");

/// The keys declared by [`Entry`] itself.
pub static ENTRY_KEYS: KeySet = &[
    &ID,
    &GROUP_ID,
    &TITLE,
    &START,
    &END,
    &ALL_DAY,
    &EDITABLE,
    &START_EDITABLE,
    &DURATION_EDITABLE,
    &DISPLAY,
    &CONSTRAINT,
    &OVERLAP,
    &CLASS_NAMES,
    &DESCRIPTION,
    &CUSTOM_PROPERTIES,
    &DAYS_OF_WEEK,
    &START_RECUR,
    &END_RECUR,
    &START_TIME,
    &END_TIME,
];

/// A calendar entry.
///
/// # Example
///
/// ```rust
/// use chrono::NaiveDate;
/// use overstory_calendar::{Entry, EntryTime};
/// use serde_json::json;
/// use understory_json_item::{ItemType, ItemTypeExt};
///
/// let day = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
/// let mut entry = Entry::with_id("e1");
/// entry.set_title("Offsite");
/// entry.set_start(day);
/// entry.set_all_day(true);
///
/// let json = entry.to_json_on_create();
/// assert_eq!(json["start"], json!("2025-06-02"));
/// assert_eq!(json["allDay"], json!(true));
/// assert_eq!(entry.start(), Some(EntryTime::Date(day)));
/// ```
#[derive(Clone, Debug)]
pub struct Entry {
    item: JsonItem,
}

impl ItemType for Entry {
    fn registry() -> &'static KeyRegistry {
        static REGISTRY: OnceLock<KeyRegistry> = OnceLock::new();
        KeyRegistry::init_once(&REGISTRY, || {
            KeyRegistry::builder("Entry", ID.name())
                .keys(ENTRY_KEYS)
                .include(STYLE_KEYS)
                .build()
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

impl Default for Entry {
    fn default() -> Self {
        Self::new()
    }
}

impl Entry {
    /// Creates an entry with a random id.
    #[must_use]
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4().to_string())
    }

    /// Returns the id as a string.
    #[must_use]
    pub fn id_str(&self) -> &str {
        self.id().as_str().unwrap_or_default()
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> Option<String> {
        self.get(&TITLE)
    }

    /// Sets the title.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.set(&TITLE, title.into());
    }

    /// Returns the group id.
    #[must_use]
    pub fn group_id(&self) -> Option<String> {
        self.get(&GROUP_ID)
    }

    /// Sets the group id.
    pub fn set_group_id(&mut self, group_id: impl Into<String>) {
        self.set(&GROUP_ID, group_id.into());
    }

    /// Returns the start.
    #[must_use]
    pub fn start(&self) -> Option<EntryTime> {
        self.get(&START)
    }

    /// Sets the start, as a date for all-day entries.
    pub fn set_start(&mut self, start: impl Into<EntryTime>) {
        let start = self.anchored(start.into());
        self.set(&START, start);
    }

    /// Returns the end.
    #[must_use]
    pub fn end(&self) -> Option<EntryTime> {
        self.get(&END)
    }

    /// Sets the end, as a date for all-day entries.
    pub fn set_end(&mut self, end: impl Into<EntryTime>) {
        let end = self.anchored(end.into());
        self.set(&END, end);
    }

    /// Returns `true` if the entry spans whole days.
    #[must_use]
    pub fn is_all_day(&self) -> bool {
        self.get_or(&ALL_DAY, false)
    }

    /// Switches between all-day and timed.
    ///
    /// Start and end are converted to the matching form. When the peer knows
    /// this entry they are sent again, since the client reads them according
    /// to the all-day flag.
    pub fn set_all_day(&mut self, all_day: bool) {
        if !self.set(&ALL_DAY, all_day) {
            return;
        }
        for key in [&START, &END] {
            let Some(time) = self.get(key) else {
                continue;
            };
            let converted = self.anchored(time);
            self.set(key, converted);
            if self.is_known_to_peer() {
                self.mark_dirty(&[key]);
            }
        }
    }

    /// Converts stored bounds that disagree with the all-day flag, without
    /// marking them dirty.
    pub(crate) fn anchor_bounds(&mut self) {
        for key in [&START, &END] {
            if let Some(time) = self.get(key) {
                let anchored = self.anchored(time);
                if anchored != time {
                    self.set_without_dirty_change(key, anchored);
                }
            }
        }
    }

    fn anchored(&self, time: EntryTime) -> EntryTime {
        if self.is_all_day() {
            EntryTime::Date(time.date())
        } else {
            EntryTime::DateTime(time.to_date_time())
        }
    }

    /// Returns whether the entry may be moved and resized.
    #[must_use]
    pub fn is_editable(&self) -> bool {
        self.get_or(&EDITABLE, true)
    }

    /// Sets whether the entry may be moved and resized.
    pub fn set_editable(&mut self, editable: bool) {
        self.set(&EDITABLE, editable);
    }

    /// Returns the rendering mode.
    #[must_use]
    pub fn display(&self) -> DisplayMode {
        self.get_or(&DISPLAY, DisplayMode::Auto)
    }

    /// Sets the rendering mode.
    pub fn set_display(&mut self, display: DisplayMode) {
        self.set(&DISPLAY, display);
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> Option<String> {
        self.get(&DESCRIPTION)
    }

    /// Sets the description.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.set(&DESCRIPTION, description.into());
    }

    /// Returns the base color.
    #[must_use]
    pub fn color(&self) -> Option<String> {
        self.get(&style::COLOR)
    }

    /// Sets the base color. An empty string removes it.
    pub fn set_color(&mut self, color: &str) {
        if color.is_empty() {
            self.clear(&style::COLOR);
        } else {
            self.set(&style::COLOR, color);
        }
    }

    /// Returns the CSS class names.
    #[must_use]
    pub fn class_names(&self) -> BTreeSet<String> {
        self.get(&CLASS_NAMES).unwrap_or_default()
    }

    /// Adds CSS class names.
    pub fn add_class_names<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut all = self.class_names();
        all.extend(names.into_iter().map(Into::into));
        self.set(&CLASS_NAMES, all);
    }

    /// Removes CSS class names. The key is removed once no name is left.
    pub fn remove_class_names(&mut self, names: &[&str]) {
        let mut all = self.class_names();
        all.retain(|name| !names.contains(&name.as_str()));
        if all.is_empty() {
            self.clear(&CLASS_NAMES);
        } else {
            self.set(&CLASS_NAMES, all);
        }
    }

    // A removal the client must see is sent as null.
    fn clear(&mut self, key: &dyn ErasedKey) {
        if self.remove(key) && self.is_known_to_peer() {
            self.mark_dirty(&[key]);
        }
    }

    /// Returns the weekdays a recurring entry repeats on.
    #[must_use]
    pub fn days_of_week(&self) -> Vec<Weekday> {
        self.get(&DAYS_OF_WEEK).unwrap_or_default()
    }

    /// Sets the weekdays a recurring entry repeats on.
    pub fn set_days_of_week(&mut self, days: impl IntoIterator<Item = Weekday>) {
        self.set(&DAYS_OF_WEEK, days.into_iter().collect::<Vec<_>>());
    }

    /// Returns `true` if any recurrence property is set.
    #[must_use]
    pub fn is_recurring(&self) -> bool {
        let keys: [&dyn ErasedKey; 5] = [
            &DAYS_OF_WEEK,
            &START_RECUR,
            &END_RECUR,
            &START_TIME,
            &END_TIME,
        ];
        keys.into_iter().any(|key| self.has(key))
    }

    /// Returns one custom property.
    #[must_use]
    pub fn custom_property(&self, name: &str) -> Option<JsonValue> {
        self.get(&CUSTOM_PROPERTIES)?.get(name).cloned()
    }

    /// Sets one custom property, keeping the others.
    pub fn set_custom_property(&mut self, name: &str, value: impl Into<JsonValue>) {
        let mut properties = match self.get(&CUSTOM_PROPERTIES) {
            Some(JsonValue::Object(map)) => map,
            _ => serde_json::Map::new(),
        };
        properties.insert(name.to_owned(), value.into());
        self.set(&CUSTOM_PROPERTIES, JsonValue::Object(properties));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    #[test]
    fn new_entries_get_distinct_uuids() {
        let a = Entry::new();
        let b = Entry::new();
        assert_ne!(a.id_str(), b.id_str());
        assert!(Uuid::parse_str(a.id_str()).is_ok());
    }

    #[test]
    fn create_projection_carries_defaults() {
        let mut entry = Entry::with_id("e1");
        entry.set_title("Standup");
        assert_eq!(
            entry.to_json_on_create(),
            json!({
                "id": "e1",
                "title": "Standup",
                "allDay": false,
                "editable": true,
                "display": "auto",
            })
        );
    }

    #[test]
    fn timed_start_is_written_as_timestamp() {
        let mut entry = Entry::with_id("e1");
        entry.set_start(Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap());
        assert_eq!(entry.to_json(false)["start"], json!("2025-06-02T09:00:00Z"));
    }

    #[test]
    fn all_day_toggle_converts_and_resends_bounds() {
        let mut entry = Entry::with_id("e1");
        entry.set_start(Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap());
        entry.set_known_to_peer(true);

        entry.set_all_day(true);
        assert_eq!(entry.start(), Some(EntryTime::Date(day(2))));
        assert_eq!(
            entry.to_json_on_update(),
            json!({"start": "2025-06-02", "allDay": true, "id": "e1"})
        );

        entry.clear_dirty_state();
        entry.set_all_day(true);
        assert!(!entry.item().has_dirty());
    }

    #[test]
    fn display_uses_client_side_strings() {
        let mut entry = Entry::with_id("e1");
        entry.set_display(DisplayMode::InverseBackground);
        assert_eq!(entry.to_json(false)["display"], json!("inverse-background"));

        entry
            .apply_from(&json!({"display": "list-item"}), false)
            .unwrap();
        assert_eq!(entry.display(), DisplayMode::ListItem);
    }

    #[test]
    fn days_of_week_are_numbers_from_sunday() {
        let mut entry = Entry::with_id("e1");
        entry.set_days_of_week([Weekday::Mon, Weekday::Wed, Weekday::Mon]);
        assert_eq!(entry.to_json(false)["daysOfWeek"], json!([1, 3]));
        assert!(entry.is_recurring());

        entry
            .apply_from(&json!({"daysOfWeek": [0, "6"]}), false)
            .unwrap();
        assert_eq!(entry.days_of_week(), [Weekday::Sun, Weekday::Sat]);
    }

    #[test]
    fn class_names_behave_as_a_set() {
        let mut entry = Entry::with_id("e1");
        entry.add_class_names(["urgent", "team"]);
        entry.add_class_names(["urgent"]);
        assert_eq!(entry.class_names().len(), 2);

        entry.remove_class_names(&["urgent", "team"]);
        assert!(!entry.has(&CLASS_NAMES));
    }

    #[test]
    fn custom_properties_pass_through() {
        let mut entry = Entry::with_id("e1");
        entry.set_custom_property("room", "B12");
        entry.set_custom_property("seats", 8);
        assert_eq!(
            entry.to_json(false)["customProperties"],
            json!({"room": "B12", "seats": 8})
        );
        assert_eq!(entry.custom_property("seats"), Some(json!(8)));
    }

    #[test]
    fn empty_color_removes_it() {
        let mut entry = Entry::with_id("e1");
        entry.set_color("#ff0000");
        assert_eq!(entry.color().as_deref(), Some("#ff0000"));
        entry.set_color("");
        assert_eq!(entry.color(), None);
    }

    #[test]
    fn clearing_on_a_known_entry_sends_null() {
        let mut entry = Entry::with_id("e1");
        entry.set_color("teal");
        entry.add_class_names(["urgent"]);
        entry.set_known_to_peer(true);

        entry.set_color("");
        entry.remove_class_names(&["urgent"]);
        assert!(!entry.has(&style::COLOR));
        assert!(!entry.has(&CLASS_NAMES));
        assert_eq!(
            entry.to_json_on_update(),
            json!({"color": null, "classNames": null, "id": "e1"})
        );

        entry.clear_dirty_state();
        entry.set_color("");
        assert!(!entry.item().has_dirty());
    }

    #[test]
    fn registry_includes_style_keys() {
        let registry = Entry::registry();
        assert_eq!(registry.len(), ENTRY_KEYS.len() + STYLE_KEYS.len());
        assert!(registry.contains("textColor"));
        assert_eq!(registry.id_key().name(), "id");
    }
}
