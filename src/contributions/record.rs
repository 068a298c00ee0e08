use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A dated count of events, already expressed in the dashboard's reference timezone.
/// The time component is carried through but never trusted: every comparison goes through
/// [EventRecord::day].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventRecord {
    pub date: NaiveDateTime,
    pub count: u64,
}

impl EventRecord {
    pub fn new(date: NaiveDateTime, count: u64) -> Self {
        Self { date, count }
    }

    pub fn on_day(day: NaiveDate, count: u64) -> Self {
        Self::new(day.and_time(NaiveTime::MIN), count)
    }

    /// Calendar day this record belongs to.
    pub fn day(&self) -> NaiveDate {
        start_of_day(self.date).date()
    }
}

/// Truncates a wall-clock timestamp to midnight of the same day.
pub fn start_of_day(date: NaiveDateTime) -> NaiveDateTime {
    date.date().and_time(NaiveTime::MIN)
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Can't interpret {value:?} as a date")]
pub struct InvalidDateError {
    pub value: String,
}

/// How a source's timestamps map onto calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayBoundary {
    /// The calendar date written in the value is the day. An offset, if present, is ignored, so
    /// `2024-01-05T00:00:00Z` is the 5th regardless of where the dashboard runs.
    AsWritten,
    /// The value is an instant that gets converted into the given zone before taking its day.
    /// Values without an offset are assumed to already be in that zone.
    InZone(Tz),
}

/// Record in the shape it arrives from a collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub date: String,
    #[serde(default = "default_count")]
    pub count: u64,
}

fn default_count() -> u64 {
    1
}

impl RawRecord {
    pub fn new(date: impl Into<String>, count: u64) -> Self {
        Self {
            date: date.into(),
            count,
        }
    }

    pub fn normalize(&self, boundary: DayBoundary) -> Result<EventRecord, InvalidDateError> {
        let date = parse_record_date(&self.date, boundary)?;
        Ok(EventRecord::new(date, self.count))
    }
}

/// Parses `YYYY-MM-DD`, RFC 3339 timestamps and offset-less `YYYY-MM-DDTHH:MM:SS[.fff]`
/// values. The result is always at the start of its day.
pub fn parse_record_date(
    value: &str,
    boundary: DayBoundary,
) -> Result<NaiveDateTime, InvalidDateError> {
    let trimmed = value.trim();

    if let Ok(day) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(day.and_time(NaiveTime::MIN));
    }

    if let Ok(instant) = DateTime::parse_from_rfc3339(trimmed) {
        let local = match boundary {
            DayBoundary::AsWritten => instant.naive_local(),
            DayBoundary::InZone(zone) => instant.with_timezone(&zone).naive_local(),
        };
        return Ok(start_of_day(local));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(local) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(start_of_day(local));
        }
    }

    Err(InvalidDateError {
        value: value.to_string(),
    })
}

/// Collapses records into one per day, newest day first.
pub fn group_by_day(records: impl IntoIterator<Item = EventRecord>) -> Vec<EventRecord> {
    let mut days = BTreeMap::<NaiveDate, u64>::new();
    for record in records {
        *days.entry(record.day()).or_default() += record.count;
    }
    days.into_iter()
        .rev()
        .map(|(day, count)| EventRecord::on_day(day, count))
        .collect()
}
