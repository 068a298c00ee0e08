use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

use crate::contributions::RawRecord;

use super::ContributionSource;

/// Reads a JSON array of `{"date": ..., "count": ...}` objects. Useful for exports from the
/// hosted dashboard or for trying the CLI without network access.
pub struct ImportFile {
    path: PathBuf,
}

impl ImportFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl ContributionSource for ImportFile {
    async fn fetch(&self) -> Result<Vec<RawRecord>> {
        debug!("Importing {:?}", self.path);
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read {:?}", self.path))?;
        serde_json::from_str(&content)
            .with_context(|| format!("{:?} is not a list of records", self.path))
    }
}
