use std::{collections::BTreeMap, io::ErrorKind, path::PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{contributions::ViewWindow, sources::SourceKind};

/// Per-source choices that survive between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub views: BTreeMap<SourceKind, ViewWindow>,
}

impl Settings {
    pub fn view(&self, kind: SourceKind) -> ViewWindow {
        self.views
            .get(&kind)
            .copied()
            .unwrap_or_else(|| kind.default_view())
    }

    /// Moves the source to its next view and returns it.
    pub fn toggle_view(&mut self, kind: SourceKind) -> ViewWindow {
        let next = self.view(kind).next();
        self.views.insert(kind, next);
        next
    }
}

pub struct SettingsFile {
    path: PathBuf,
}

impl SettingsFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Missing or unreadable settings fall back to defaults.
    pub async fn load(&self) -> Result<Settings> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(v) => v,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Settings::default()),
            Err(e) => return Err(e).with_context(|| format!("Failed to read {:?}", self.path)),
        };
        match serde_json::from_str(&content) {
            Ok(v) => Ok(v),
            Err(e) => {
                warn!("Ignoring corrupted settings {:?}: {e}", self.path);
                Ok(Settings::default())
            }
        }
    }

    pub async fn save(&self, settings: &Settings) -> Result<()> {
        tokio::fs::write(&self.path, serde_json::to_vec_pretty(settings)?)
            .await
            .with_context(|| format!("Failed to write {:?}", self.path))
    }
}
