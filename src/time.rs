use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use tracing::warn;

use crate::constants::Constants;

/// The facility's daily operating window.
///
/// Closing at or before opening means the window rolls past midnight, so
/// `{22:00, 06:00}` is a valid overnight configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpeningHours {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl Default for OpeningHours {
    fn default() -> Self {
        Self {
            start: parse_hhmm(Constants::DEFAULT_OPENING).unwrap_or(NaiveTime::MIN),
            end: parse_hhmm(Constants::DEFAULT_CLOSING).unwrap_or(NaiveTime::MIN),
        }
    }
}

impl OpeningHours {
    /// Build from raw `"HH:MM"` strings, falling back to the default window
    /// per field when a value is missing or malformed.
    pub fn from_strings(start: Option<&str>, end: Option<&str>) -> Self {
        let default = Self::default();
        Self {
            start: start.and_then(parse_hhmm).unwrap_or(default.start),
            end: end.and_then(parse_hhmm).unwrap_or(default.end),
        }
    }

    /// Closing instant for a window opened on `day`, rolled to the next
    /// day when closing is not after opening.
    pub fn closes_at(&self, day: NaiveDate) -> NaiveDateTime {
        let start = day.and_time(self.start);
        let mut end = day.and_time(self.end);
        if end <= start {
            end += Duration::days(1);
        }
        end
    }
}

/// Parse a `"HH:MM"` (or `"HH:MM:SS"`) string.
pub fn parse_hhmm(s: &str) -> Option<NaiveTime> {
    let mut parts = s.trim().split(':');
    let hour: u32 = parts.next()?.parse().ok()?;
    let minute: u32 = parts.next()?.parse().ok()?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

pub fn minutes_of_day(t: NaiveTime) -> i64 {
    i64::from(t.hour()) * 60 + i64::from(t.minute())
}

pub fn time_from_minutes(mins: i64) -> Option<NaiveTime> {
    if !(0..Constants::MINUTES_PER_DAY).contains(&mins) {
        return None;
    }
    NaiveTime::from_hms_opt((mins / 60) as u32, (mins % 60) as u32, 0)
}

/// Every bookable slot of `day`, from opening up to (excluding) closing,
/// stepping by the grid granularity. An overnight window keeps emitting
/// into the next calendar day.
pub fn time_slots(day: NaiveDate, hours: &OpeningHours) -> Vec<NaiveDateTime> {
    if hours.start == hours.end {
        // Matches the historical rollover rule, but an operator almost
        // certainly did not mean "open around the clock".
        warn!(
            open = %hours.start,
            "opening and closing hour are equal; emitting a full 24h window"
        );
    }

    let start = day.and_time(hours.start);
    let end = hours.closes_at(day);

    let mut slots = Vec::new();
    let mut current = start;
    while current < end {
        slots.push(current);
        current += Duration::minutes(Constants::SLOT_MINUTES);
    }
    slots
}

/// Round to the nearest slot boundary, ties rounding up. 23:45 rolls over
/// to midnight of the following day.
pub fn round_to_slot(dt: NaiveDateTime) -> NaiveDateTime {
    let mins = minutes_of_day(dt.time());
    let rounded = (mins + Constants::SLOT_MINUTES / 2) / Constants::SLOT_MINUTES
        * Constants::SLOT_MINUTES;
    dt.date().and_time(NaiveTime::MIN) + Duration::minutes(rounded)
}

/// Round up to the next slot boundary (already-aligned instants stay put).
pub fn round_up_to_slot(dt: NaiveDateTime) -> NaiveDateTime {
    let secs = i64::from(dt.time().num_seconds_from_midnight());
    let slot_secs = Constants::SLOT_MINUTES * 60;
    let rounded = (secs + slot_secs - 1) / slot_secs * slot_secs;
    dt.date().and_time(NaiveTime::MIN) + Duration::seconds(rounded)
}

/// Number of grid rows a `[start, end)` span occupies, never less than one.
pub fn span_rows(start: NaiveTime, end: NaiveTime) -> i64 {
    let minutes = minutes_of_day(end) - minutes_of_day(start);
    ((minutes + Constants::SLOT_MINUTES / 2) / Constants::SLOT_MINUTES).max(1)
}

/// True when the instant sits exactly on a slot boundary.
pub fn on_slot_boundary(t: NaiveTime) -> bool {
    t.second() == 0 && i64::from(t.minute()) % Constants::SLOT_MINUTES == 0
}
