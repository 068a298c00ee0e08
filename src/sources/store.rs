//!  Local entries are organized through [EntryStore].
//!  The basic idea is:
//!   - There is a directory with one JSON-lines file per source.
//!   - Every line is a single [StoredEntry]. Lines are only ever appended.
//!   - Writers take an exclusive lock on the file, readers a shared one.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use fs4::tokio::AsyncFileExt;
use serde::{Deserialize, Serialize};
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
};
use tracing::{debug, warn};

use crate::contributions::RawRecord;

use super::{ContributionSource, SourceKind};

/// A single logged tweet or reading day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEntry {
    /// `YYYY-MM-DD` for plain days, RFC 3339 for instants.
    pub date: String,
    #[serde(default = "default_count")]
    pub count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

fn default_count() -> u64 {
    1
}

impl From<StoredEntry> for RawRecord {
    fn from(StoredEntry { date, count, .. }: StoredEntry) -> Self {
        RawRecord { date, count }
    }
}

pub struct EntryStore {
    entry_dir: PathBuf,
}

impl EntryStore {
    pub fn new(entry_dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&entry_dir)?;

        Ok(Self { entry_dir })
    }

    fn path_for(&self, kind: SourceKind) -> PathBuf {
        self.entry_dir.join(format!("{kind}.jsonl"))
    }

    pub async fn append(&self, kind: SourceKind, entry: &StoredEntry) -> Result<()> {
        let path = self.path_for(kind);
        let mut line = serde_json::to_vec(entry)?;
        line.push(b'\n');

        let mut file = File::options()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .with_context(|| format!("Failed to open {path:?}"))?;

        // Semi-safe acquire-release for a file
        file.lock_exclusive()?;
        let result: std::io::Result<()> = async {
            file.write_all(&line).await?;
            file.flush().await
        }
        .await;
        file.unlock_async().await?;
        result.with_context(|| format!("Failed to append to {path:?}"))?;

        debug!("Appended {entry:?} to {path:?}");
        Ok(())
    }

    pub async fn read(&self, kind: SourceKind) -> Result<Vec<StoredEntry>> {
        let path = self.path_for(kind);
        match read_entries(&path).await {
            Ok(entries) => Ok(entries),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(vec![]),
            Err(e) => Err(e).with_context(|| format!("Failed to read {path:?}")),
        }
    }
}

async fn read_entries(path: &Path) -> Result<Vec<StoredEntry>, std::io::Error> {
    debug!("Extracting {path:?}");
    let file = File::open(path).await?;
    file.lock_shared()?;
    let buffer = BufReader::new(file);
    let mut lines = buffer.lines();
    let mut entries = vec![];
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<StoredEntry>(&line) {
            Ok(v) => entries.push(v),
            Err(e) => {
                // A write cut short by a crash leaves a partial last line.
                warn!("Skipping illegal entry in {path:?} {line}: {e}")
            }
        }
    }

    lines.into_inner().into_inner().unlock_async().await?;

    Ok(entries)
}

/// Exposes one source's entries from an [EntryStore].
pub struct StoreSource {
    store: Arc<EntryStore>,
    kind: SourceKind,
}

impl StoreSource {
    pub fn new(store: Arc<EntryStore>, kind: SourceKind) -> Self {
        Self { store, kind }
    }
}

#[async_trait]
impl ContributionSource for StoreSource {
    async fn fetch(&self) -> Result<Vec<RawRecord>> {
        let entries = self.store.read(self.kind).await?;
        Ok(entries.into_iter().map(RawRecord::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use std::{io::Write, sync::Arc};

    use anyhow::Result;
    use tempfile::tempdir;

    use crate::{
        contributions::RawRecord,
        sources::{ContributionSource, SourceKind},
    };

    use super::{EntryStore, StoreSource, StoredEntry};

    fn entry(date: &str, text: Option<&str>) -> StoredEntry {
        StoredEntry {
            date: date.into(),
            count: 1,
            text: text.map(Into::into),
        }
    }

    #[tokio::test]
    async fn test_store_roundtrip() -> Result<()> {
        let dir = tempdir()?;
        let store = EntryStore::new(dir.path().to_owned())?;

        store
            .append(SourceKind::Twitter, &entry("2024-01-05T10:00:00Z", Some("hello")))
            .await?;
        store
            .append(SourceKind::Twitter, &entry("2024-01-05T18:00:00Z", None))
            .await?;
        store
            .append(SourceKind::Reading, &entry("2024-01-04", None))
            .await?;

        let tweets = store.read(SourceKind::Twitter).await?;
        assert_eq!(
            tweets,
            vec![
                entry("2024-01-05T10:00:00Z", Some("hello")),
                entry("2024-01-05T18:00:00Z", None)
            ]
        );
        assert_eq!(store.read(SourceKind::Reading).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_store_missing_file_is_empty() -> Result<()> {
        let dir = tempdir()?;
        let store = EntryStore::new(dir.path().join("entries"))?;
        assert!(store.read(SourceKind::Reading).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_store_skips_corrupted_lines() -> Result<()> {
        let dir = tempdir()?;
        let store = EntryStore::new(dir.path().to_owned())?;
        let mut file = std::fs::File::create(dir.path().join("reading.jsonl"))?;
        writeln!(file, r#"{{"date":"2024-01-01"}}"#)?;
        writeln!(file, r#"{{"date":"2024-01-02","cou"#)?;
        writeln!(file)?;
        writeln!(file, r#"{{"date":"2024-01-03","count":2}}"#)?;

        let source = StoreSource::new(Arc::new(store), SourceKind::Reading);
        assert_eq!(
            source.fetch().await?,
            vec![RawRecord::new("2024-01-01", 1), RawRecord::new("2024-01-03", 2)]
        );
        Ok(())
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_failed_append_is_reported() -> Result<()> {
        let dir = tempdir()?;
        // Every write to /dev/full fails with ENOSPC after the open succeeds.
        std::os::unix::fs::symlink("/dev/full", dir.path().join("twitter.jsonl"))?;
        let store = EntryStore::new(dir.path().to_owned())?;

        let error = store
            .append(SourceKind::Twitter, &entry("2024-01-05T10:00:00Z", None))
            .await
            .unwrap_err();
        assert!(error.to_string().contains("Failed to append"));
        Ok(())
    }
}
