use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, Result};
use chrono_tz::Tz;

use crate::{
    dashboard::{settings::SettingsFile, Dashboard, InvalidDatePolicy},
    sources::{
        cache::{CachedSource, DayCache},
        file::ImportFile,
        github::GithubSource,
        store::{EntryStore, StoreSource},
        twitter::TwitterSource,
        ContributionSource, SourceKind,
    },
    utils::clock::{Clock, DefaultClock},
};

/// Tokens for the remote sources. Anything missing falls back to local data or an error.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub github_token: Option<String>,
    pub twitter_token: Option<String>,
    pub twitter_user: Option<String>,
}

/// Everything commands share, resolved once from the global arguments.
pub struct AppContext {
    pub zone: Tz,
    pub clock: Arc<dyn Clock>,
    pub store: Arc<EntryStore>,
    pub cache: Arc<DayCache>,
    pub settings: SettingsFile,
    credentials: Credentials,
}

impl AppContext {
    /// `clock` drives panels and may be frozen with `--now`. The fetch cache always follows the
    /// wall clock so a frozen run doesn't stamp entries with a made up day.
    pub fn new(
        dir: PathBuf,
        zone: Tz,
        credentials: Credentials,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let store = Arc::new(EntryStore::new(dir.join("entries"))?);
        let cache = Arc::new(DayCache::new(
            dir.join("cache"),
            Arc::new(DefaultClock),
            zone,
        )?);
        Ok(Self {
            zone,
            clock,
            store,
            cache,
            settings: SettingsFile::new(dir.join("settings.json")),
            credentials,
        })
    }

    pub fn with_default_clock(dir: PathBuf, zone: Tz, credentials: Credentials) -> Result<Self> {
        Self::new(dir, zone, credentials, Arc::new(DefaultClock))
    }

    /// An import file wins over the source's usual collaborator.
    pub fn build_source(
        &self,
        kind: SourceKind,
        input: Option<PathBuf>,
    ) -> Result<Box<dyn ContributionSource>> {
        if let Some(path) = input {
            return Ok(Box::new(ImportFile::new(path)));
        }

        match kind {
            SourceKind::Github => {
                let token = self.credentials.github_token.clone().ok_or_else(|| {
                    anyhow!("GITHUB_TOKEN is not set, pass --github-token or --input")
                })?;
                Ok(Box::new(CachedSource::new(
                    GithubSource::new(token)?,
                    self.cache.clone(),
                    kind,
                )))
            }
            SourceKind::Twitter => match (
                &self.credentials.twitter_token,
                &self.credentials.twitter_user,
            ) {
                (Some(token), Some(user)) => Ok(Box::new(CachedSource::new(
                    TwitterSource::new(token.clone(), user.clone())?,
                    self.cache.clone(),
                    kind,
                ))),
                _ => Ok(Box::new(StoreSource::new(self.store.clone(), kind))),
            },
            SourceKind::Reading => Ok(Box::new(StoreSource::new(self.store.clone(), kind))),
        }
    }

    pub fn dashboard(&self, policy: InvalidDatePolicy) -> Dashboard {
        Dashboard::new(self.zone, policy, self.clock.clone())
    }
}
