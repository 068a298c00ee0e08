use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_english::{parse_date_string, Dialect};
use chrono_tz::Tz;

/// This is the standard way of converting a date to a string in heatboard.
pub fn format_day(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parses human input like "yesterday", "3 days ago" or "15/03/2025" relative to `now`, reading
/// it as a wall-clock time in `zone`.
pub fn parse_human_date(
    value: &str,
    now: DateTime<Utc>,
    zone: Tz,
    dialect: Dialect,
) -> Result<DateTime<Utc>> {
    parse_date_string(value, now.with_timezone(&zone), dialect)
        .map(|v| v.with_timezone(&Utc))
        .map_err(|e| anyhow!("Failed to parse date {value:?}: {e}"))
}
