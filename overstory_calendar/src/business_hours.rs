// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Business hours: the recurring weekly slots a calendar highlights.

use std::sync::OnceLock;

use chrono::{NaiveTime, Weekday};
use understory_json_item::{
    ItemType, ItemTypeExt, JsonItem, Key, KeyRegistry, KeySet, NumberConverter, SequenceKind,
};
use uuid::Uuid;

use crate::converter::HourMinuteConverter;

/// Unique id, assigned at creation.
pub static ID: Key<String> = Key::new("id").update_allowed(false);
/// Weekdays the slot applies to.
pub static DAYS_OF_WEEK: Key<Vec<Weekday>> = Key::new("daysOfWeek")
    .sequence(SequenceKind::Set)
    .element_converter(&NumberConverter);
/// Daily start.
pub static START_TIME: Key<NaiveTime> = Key::new("startTime")
    .converter(&HourMinuteConverter)
    .default_value(|| NaiveTime::MIN);
/// Daily end.
pub static END_TIME: Key<NaiveTime> = Key::new("endTime").converter(&HourMinuteConverter);

/// The keys of [`BusinessHours`].
pub static BUSINESS_HOURS_KEYS: KeySet = &[&ID, &DAYS_OF_WEEK, &START_TIME, &END_TIME];

/// Monday to Friday.
pub const WORK_WEEK: [Weekday; 5] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
];

/// A weekly time slot.
///
/// Without an end the slot runs to the end of the day.
///
/// # Example
///
/// ```rust
/// use chrono::NaiveTime;
/// use overstory_calendar::{BusinessHours, WORK_WEEK};
/// use serde_json::json;
/// use understory_json_item::ItemTypeExt;
///
/// let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
/// let five = NaiveTime::from_hms_opt(17, 0, 0).unwrap();
/// let hours = BusinessHours::between(nine, five, WORK_WEEK);
///
/// let json = hours.to_json(false);
/// assert_eq!(json["daysOfWeek"], json!([1, 2, 3, 4, 5]));
/// assert_eq!(json["startTime"], json!("09:00"));
/// assert_eq!(json["endTime"], json!("17:00"));
/// ```
#[derive(Clone, Debug)]
pub struct BusinessHours {
    item: JsonItem,
}

impl ItemType for BusinessHours {
    fn registry() -> &'static KeyRegistry {
        static REGISTRY: OnceLock<KeyRegistry> = OnceLock::new();
        KeyRegistry::init_once(&REGISTRY, || {
            KeyRegistry::builder("BusinessHours", ID.name())
                .keys(BUSINESS_HOURS_KEYS)
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

impl Default for BusinessHours {
    fn default() -> Self {
        Self::new()
    }
}

impl BusinessHours {
    /// Creates an all-day slot with a random id and no weekdays.
    #[must_use]
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4().to_string())
    }

    /// Creates a slot from `start` to `end` on the given days.
    #[must_use]
    pub fn between(start: NaiveTime, end: NaiveTime, days: impl IntoIterator<Item = Weekday>) -> Self {
        let mut hours = Self::new();
        hours.set(&START_TIME, start);
        hours.set(&END_TIME, end);
        hours.set(&DAYS_OF_WEEK, days.into_iter().collect::<Vec<_>>());
        hours
    }

    /// Returns the daily start, midnight unless set.
    #[must_use]
    pub fn start(&self) -> NaiveTime {
        self.get_or(&START_TIME, NaiveTime::MIN)
    }

    /// Returns the daily end, if bounded.
    #[must_use]
    pub fn end(&self) -> Option<NaiveTime> {
        self.get(&END_TIME)
    }

    /// Returns the weekdays.
    #[must_use]
    pub fn days_of_week(&self) -> Vec<Weekday> {
        self.get(&DAYS_OF_WEEK).unwrap_or_default()
    }

    /// Returns `true` if `time` on `day` falls within this slot.
    #[must_use]
    pub fn contains(&self, day: Weekday, time: NaiveTime) -> bool {
        self.days_of_week().contains(&day)
            && time >= self.start()
            && self.end().is_none_or(|end| time < end)
    }
}
