use std::{io::ErrorKind, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{contributions::RawRecord, utils::clock::Clock};

use super::{ContributionSource, SourceKind};

/// Records fetched from a source together with the reference-zone day they were fetched on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedDays {
    pub fetched_on: NaiveDate,
    pub records: Vec<RawRecord>,
}

impl CachedDays {
    /// Entries stay valid until the end of the day they were fetched on.
    pub fn is_fresh(&self, today: NaiveDate) -> bool {
        self.fetched_on == today
    }
}

/// One JSON file per source under the cache directory.
pub struct DayCache {
    dir: PathBuf,
    clock: Arc<dyn Clock>,
    zone: Tz,
}

impl DayCache {
    pub fn new(dir: PathBuf, clock: Arc<dyn Clock>, zone: Tz) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir, clock, zone })
    }

    fn path_for(&self, kind: SourceKind) -> PathBuf {
        self.dir.join(format!("{kind}.json"))
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today_in(self.zone)
    }

    /// Returns the cached records if they were fetched today. Unreadable cache files are treated
    /// as missing.
    pub async fn load_fresh(&self, kind: SourceKind) -> Result<Option<Vec<RawRecord>>> {
        let path = self.path_for(kind);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(v) => v,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("Failed to read {path:?}")),
        };

        let cached = match serde_json::from_str::<CachedDays>(&content) {
            Ok(v) => v,
            Err(e) => {
                warn!("Ignoring corrupted cache {path:?}: {e}");
                return Ok(None);
            }
        };

        let today = self.today();
        if cached.is_fresh(today) {
            debug!("Cache for {kind} is fresh");
            Ok(Some(cached.records))
        } else {
            debug!("Cache for {kind} is from {}, today is {today}", cached.fetched_on);
            Ok(None)
        }
    }

    pub async fn store(&self, kind: SourceKind, records: Vec<RawRecord>) -> Result<()> {
        let path = self.path_for(kind);
        let cached = CachedDays {
            fetched_on: self.today(),
            records,
        };
        tokio::fs::write(&path, serde_json::to_vec(&cached)?)
            .await
            .with_context(|| format!("Failed to write {path:?}"))
    }
}

/// Wraps a slow source so that it is asked at most once per day.
pub struct CachedSource<S> {
    inner: S,
    cache: Arc<DayCache>,
    kind: SourceKind,
}

impl<S: ContributionSource> CachedSource<S> {
    pub fn new(inner: S, cache: Arc<DayCache>, kind: SourceKind) -> Self {
        Self { inner, cache, kind }
    }

    async fn fetch_and_store(&self) -> Result<Vec<RawRecord>> {
        let records = self.inner.fetch().await?;
        // A failed cache write only costs an extra fetch later.
        if let Err(e) = self.cache.store(self.kind, records.clone()).await {
            warn!("Failed to cache {} records: {e:?}", self.kind);
        }
        Ok(records)
    }
}

#[async_trait]
impl<S: ContributionSource> ContributionSource for CachedSource<S> {
    async fn fetch(&self) -> Result<Vec<RawRecord>> {
        match self.cache.load_fresh(self.kind).await {
            Ok(Some(records)) => return Ok(records),
            Ok(None) => {}
            Err(e) => warn!("Failed to load {} cache: {e:?}", self.kind),
        }
        self.fetch_and_store().await
    }

    async fn refetch(&self) -> Result<Vec<RawRecord>> {
        info!("Refetching {} bypassing the cache", self.kind);
        self.fetch_and_store().await
    }
}
