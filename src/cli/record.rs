use anyhow::{bail, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use chrono_tz::Tz;
use clap::Parser;
use tracing::info;

use crate::{
    contributions::group_by_day,
    dashboard::{normalize_records, InvalidDatePolicy},
    sources::{store::StoredEntry, SourceKind},
    utils::time::{format_day, parse_human_date},
};

use super::{context::AppContext, panel::DateStyle};

const RECENT_DAYS: usize = 5;

#[derive(Debug, Parser)]
pub struct RecordCommand {
    #[arg(long, short)]
    source: SourceKind,
    #[arg(
        long,
        short,
        help = "When it happened. Defaults to now. Examples are \"yesterday\", \"15/03/2025\", \"12:00 16/03/2025\""
    )]
    date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
    #[arg(long, short, help = "Tweet text or book title")]
    text: Option<String>,
    #[arg(long, short, default_value_t = 1)]
    count: u64,
}

/// Tweets keep the instant so they can be bucketed in whatever zone is used later, reading
/// days are stored as the day they happened on in `zone`.
fn entry_for(
    kind: SourceKind,
    at: DateTime<Utc>,
    zone: Tz,
    count: u64,
    text: Option<String>,
) -> Result<StoredEntry> {
    let date = match kind {
        SourceKind::Twitter => at.to_rfc3339_opts(SecondsFormat::Secs, true),
        SourceKind::Reading => format_day(at.with_timezone(&zone).date_naive()),
        SourceKind::Github => bail!("GitHub contributions come from GitHub and can't be recorded"),
    };
    Ok(StoredEntry { date, count, text })
}

/// Command to process `record`. Appends an entry to the local store and shows the latest days.
pub async fn process_record_command(
    context: &AppContext,
    RecordCommand {
        source,
        date,
        date_style,
        text,
        count,
    }: RecordCommand,
) -> Result<()> {
    let now = context.clock.time();
    let at = match date {
        Some(date) => parse_human_date(&date, now, context.zone, date_style.into())?,
        None => now,
    };

    let entry = entry_for(source, at, context.zone, count, text)?;
    context.store.append(source, &entry).await?;
    info!("Recorded {entry:?} for {source}");
    println!("Recorded {count} for {} on {}", source, entry.date);

    let raw = context
        .store
        .read(source)
        .await?
        .into_iter()
        .map(Into::into)
        .collect::<Vec<_>>();
    let records = normalize_records(
        &raw,
        source.day_boundary(context.zone),
        InvalidDatePolicy::Skip,
    )?;
    for day in group_by_day(records).into_iter().take(RECENT_DAYS) {
        println!("{}\t{}", format_day(day.day()), day.count);
    }
    Ok(())
}
