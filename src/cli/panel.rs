use std::{fmt::Display, path::PathBuf, sync::Arc};

use anyhow::Result;
use chrono::Utc;
use clap::{CommandFactory, Parser, ValueEnum};

use crate::{
    contributions::ViewWindow,
    dashboard::{InvalidDatePolicy, Panel, PanelSnapshot},
    sources::SourceKind,
    utils::{
        clock::{Clock, DefaultClock, FixedClock},
        time::parse_human_date,
    },
};

use super::{
    context::AppContext,
    render::{render_active_days, render_snapshot},
    Args,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

#[derive(Debug, Parser)]
pub struct PanelCommand {
    #[arg(long, short)]
    source: SourceKind,
    #[arg(
        long,
        short,
        help = "Window to show. Defaults to the one last selected with `toggle`"
    )]
    view: Option<ViewWindow>,
    #[arg(
        long,
        short,
        help = "Read records from a json array of {\"date\", \"count\"} objects instead of the source"
    )]
    input: Option<PathBuf>,
    #[arg(
        long,
        help = "Pretend it's this moment. Examples are \"yesterday\", \"15/03/2025\", \"12:00 16/03/2025\""
    )]
    now: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
    #[arg(long, help = "Fail instead of skipping records with unreadable dates")]
    strict: bool,
}

impl PanelCommand {
    /// Clock for this invocation. `--now` freezes it.
    pub fn clock(&self, zone: chrono_tz::Tz) -> Result<Arc<dyn Clock>> {
        let Some(now) = &self.now else {
            return Ok(Arc::new(DefaultClock));
        };
        match parse_human_date(now, Utc::now(), zone, self.date_style.into()) {
            Ok(v) => Ok(Arc::new(FixedClock(v))),
            Err(e) => Err(Args::command()
                .error(
                    clap::error::ErrorKind::ValueValidation,
                    format!("Failed to valiate --now {e}"),
                )
                .into()),
        }
    }

    fn policy(&self) -> InvalidDatePolicy {
        if self.strict {
            InvalidDatePolicy::Fail
        } else {
            InvalidDatePolicy::Skip
        }
    }
}

async fn load_snapshot(context: &AppContext, command: PanelCommand) -> Result<PanelSnapshot> {
    let view = match command.view {
        Some(view) => view,
        None => context.settings.load().await?.view(command.source),
    };
    let policy = command.policy();
    let source = context.build_source(command.source, command.input)?;
    let dashboard = context
        .dashboard(policy)
        .with_panel(Panel::new(command.source, view, source));
    dashboard.load_panel(&dashboard.panels()[0], false).await
}

/// Command to process `summary`. Prints how much happened in the selected window.
pub async fn process_summary_command(context: &AppContext, command: PanelCommand) -> Result<()> {
    let snapshot = load_snapshot(context, command).await?;
    println!("{}", snapshot.kind.title());
    println!("{}", snapshot.summary());
    println!("{}", snapshot.caption());
    Ok(())
}

/// Command to process `grid`. Draws the heatmap or dumps the cells.
pub async fn process_grid_command(
    context: &AppContext,
    command: PanelCommand,
    json: bool,
    plain: bool,
) -> Result<()> {
    let snapshot = load_snapshot(context, command).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print!("{}", render_snapshot(&snapshot, !plain));
        if plain {
            print!("{}", render_active_days(&snapshot));
        }
    }
    Ok(())
}
