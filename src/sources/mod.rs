//! Collaborators that supply raw `(date, count)` records to the contribution core.
//!
//!  - [github::GithubSource] asks the GitHub GraphQL API for the contribution calendar.
//!  - [twitter::TwitterSource] reads a user's timeline from the Twitter/X v2 API.
//!  - [store::EntryStore] is a local append-only log of tweets and reading days.
//!  - [file::ImportFile] reads a JSON array of records exported from elsewhere.
//!  - [cache::CachedSource] keeps the result of a slow source for the rest of the day.
//!
//! Each [SourceKind] also decides how its timestamps map onto days, see
//! [SourceKind::day_boundary].

pub mod cache;
pub mod file;
pub mod github;
pub mod store;
pub mod twitter;

use std::fmt::Display;

use anyhow::Result;
use async_trait::async_trait;
use chrono_tz::Tz;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::contributions::{DayBoundary, RawRecord, ViewWindow};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Github,
    Twitter,
    Reading,
}

impl SourceKind {
    pub const ALL: [SourceKind; 3] = [SourceKind::Github, SourceKind::Twitter, SourceKind::Reading];

    pub fn title(self) -> &'static str {
        match self {
            SourceKind::Github => "GitHub Contributions",
            SourceKind::Twitter => "Twitter Contributions",
            SourceKind::Reading => "Reading Days",
        }
    }

    /// What a single count means, used in panel summaries.
    pub fn unit(self) -> &'static str {
        match self {
            SourceKind::Github | SourceKind::Twitter => "contributions",
            SourceKind::Reading => "days read",
        }
    }

    /// GitHub already buckets its calendar into days and reading entries are stored as plain
    /// dates, so both are taken as written. Tweets are instants and get bucketed in `zone`.
    pub fn day_boundary(self, zone: Tz) -> DayBoundary {
        match self {
            SourceKind::Github | SourceKind::Reading => DayBoundary::AsWritten,
            SourceKind::Twitter => DayBoundary::InZone(zone),
        }
    }

    pub fn default_view(self) -> ViewWindow {
        match self {
            SourceKind::Github => ViewWindow::Year,
            SourceKind::Twitter | SourceKind::Reading => ViewWindow::Week,
        }
    }
}

impl Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Github => write!(f, "github"),
            SourceKind::Twitter => write!(f, "twitter"),
            SourceKind::Reading => write!(f, "reading"),
        }
    }
}

/// Anything able to produce raw records for a panel.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContributionSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<RawRecord>>;

    /// Same as [ContributionSource::fetch] but skips any intermediate caching.
    async fn refetch(&self) -> Result<Vec<RawRecord>> {
        self.fetch().await
    }
}

#[async_trait]
impl<T: ContributionSource + ?Sized> ContributionSource for Box<T> {
    async fn fetch(&self) -> Result<Vec<RawRecord>> {
        (**self).fetch().await
    }

    async fn refetch(&self) -> Result<Vec<RawRecord>> {
        (**self).refetch().await
    }
}
