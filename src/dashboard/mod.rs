//! Presentation shell around the contribution core. A [Panel] pairs a source with the view it
//! is shown in; [Dashboard] loads every panel, normalizes what the sources return and turns it
//! into [PanelSnapshot]s that renderers can print.

pub mod refresh;
pub mod settings;

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use chrono_tz::Tz;
use futures::future::join_all;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::{
    contributions::{
        aggregate, build_grid, period_label, CalendarDayCell, DayBoundary, EventRecord,
        RawRecord, ViewWindow,
    },
    sources::{ContributionSource, SourceKind},
    utils::clock::Clock,
};

/// What to do with a record whose date can't be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidDatePolicy {
    /// Log a warning and leave the record out.
    Skip,
    /// Fail the whole panel.
    Fail,
}

pub fn normalize_records(
    raw: &[RawRecord],
    boundary: DayBoundary,
    policy: InvalidDatePolicy,
) -> Result<Vec<EventRecord>> {
    let mut records = Vec::with_capacity(raw.len());
    for record in raw {
        match record.normalize(boundary) {
            Ok(v) => records.push(v),
            Err(e) => match policy {
                InvalidDatePolicy::Skip => warn!("Skipping record with count {}: {e}", record.count),
                InvalidDatePolicy::Fail => return Err(e.into()),
            },
        }
    }
    Ok(records)
}

/// Everything a renderer needs to draw one panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelSnapshot {
    pub kind: SourceKind,
    pub view: ViewWindow,
    pub total: u64,
    pub period: String,
    pub cells: Vec<CalendarDayCell>,
}

impl PanelSnapshot {
    pub fn new(
        kind: SourceKind,
        records: &[EventRecord],
        view: ViewWindow,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            kind,
            view,
            total: aggregate(records, view, now),
            period: period_label(view, now),
            cells: build_grid(records, view, now),
        }
    }

    /// e.g. `12 contributions in the last week`
    pub fn summary(&self) -> String {
        format!("{} {} in the last {}", self.total, self.kind.unit(), self.view)
    }

    pub fn caption(&self) -> String {
        format!("Contributions from {}", self.period)
    }
}

pub struct Panel {
    pub kind: SourceKind,
    pub view: ViewWindow,
    source: Box<dyn ContributionSource>,
}

impl Panel {
    pub fn new(kind: SourceKind, view: ViewWindow, source: Box<dyn ContributionSource>) -> Self {
        Self { kind, view, source }
    }
}

pub struct Dashboard {
    panels: Vec<Panel>,
    zone: Tz,
    policy: InvalidDatePolicy,
    clock: Arc<dyn Clock>,
}

impl Dashboard {
    pub fn new(zone: Tz, policy: InvalidDatePolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            panels: vec![],
            zone,
            policy,
            clock,
        }
    }

    pub fn with_panel(mut self, panel: Panel) -> Self {
        self.panels.push(panel);
        self
    }

    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    /// Loads a single panel. `force` skips source caches.
    #[instrument(skip(self, panel), fields(kind = %panel.kind))]
    pub async fn load_panel(&self, panel: &Panel, force: bool) -> Result<PanelSnapshot> {
        let raw = if force {
            panel.source.refetch().await
        } else {
            panel.source.fetch().await
        }
        .with_context(|| format!("Failed to load {} data", panel.kind))?;

        let records = normalize_records(&raw, panel.kind.day_boundary(self.zone), self.policy)
            .with_context(|| format!("Invalid {} data", panel.kind))?;
        info!("Loaded {} records", records.len());

        Ok(PanelSnapshot::new(
            panel.kind,
            &records,
            panel.view,
            self.clock.now_in(self.zone),
        ))
    }

    /// Loads every panel concurrently. A failing panel doesn't affect the others.
    pub async fn load_all(&self, force: bool) -> Vec<(SourceKind, Result<PanelSnapshot>)> {
        join_all(self.panels.iter().map(|panel| async move {
            (panel.kind, self.load_panel(panel, force).await)
        }))
        .await
    }
}
