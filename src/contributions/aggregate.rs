use chrono::NaiveDateTime;

use super::{record::EventRecord, view::ViewWindow};

/// Sum of counts whose day falls in the window ending on `now`'s day, both ends inclusive.
/// Saturates at `u64::MAX`.
pub fn aggregate(records: &[EventRecord], window: ViewWindow, now: NaiveDateTime) -> u64 {
    let period = window.period(now.date());
    records
        .iter()
        .filter(|record| period.contains(record.day()))
        .fold(0, |total, record| total.saturating_add(record.count))
}

/// Caption for the window, e.g. `Dec 29, 2023 to Jan 5, 2024`.
pub fn period_label(window: ViewWindow, now: NaiveDateTime) -> String {
    window.period(now.date()).label()
}
