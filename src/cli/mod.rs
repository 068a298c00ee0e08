pub mod context;
pub mod panel;
pub mod record;
pub mod render;
pub mod shutdown;
pub mod watch;

use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use context::{AppContext, Credentials};
use panel::{process_grid_command, process_summary_command, PanelCommand};
use record::{process_record_command, RecordCommand};

use crate::{
    sources::SourceKind,
    utils::{
        dir::{create_application_default_path, ensure_dir},
        logging::enable_logging,
    },
};

#[derive(Parser, Debug)]
#[command(name = "Heatboard", version, long_about = None)]
#[command(about = "Contribution heatmaps for GitHub, Twitter/X and a reading log", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Enable logging")]
    log: bool,
    #[arg(
        long,
        env = "HEATBOARD_DIR",
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
    #[arg(
        long,
        env = "HEATBOARD_TIMEZONE",
        default_value = "UTC",
        value_parser = parse_zone,
        help = "Timezone whose midnight separates days, e.g. Europe/Kyiv"
    )]
    timezone: Tz,
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,
    #[arg(long, env = "TWITTER_BEARER_TOKEN", hide_env_values = true)]
    twitter_token: Option<String>,
    #[arg(
        long,
        env = "TWITTER_USERNAME",
        help = "Read tweets of this user from the API instead of the local log"
    )]
    twitter_user: Option<String>,
}

fn parse_zone(value: &str) -> Result<Tz, String> {
    value
        .parse::<Tz>()
        .map_err(|e| format!("Unknown timezone {value:?}: {e}"))
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Print the total for a source over its view")]
    Summary {
        #[command(flatten)]
        command: PanelCommand,
    },
    #[command(about = "Draw the heatmap for a source")]
    Grid {
        #[command(flatten)]
        command: PanelCommand,
        #[arg(long, help = "Print the cells as json instead of drawing them")]
        json: bool,
        #[arg(long, help = "Draw without colors")]
        plain: bool,
    },
    #[command(about = "Switch a source to its next view (week, month, year)")]
    Toggle {
        #[arg(long, short)]
        source: SourceKind,
    },
    #[command(about = "Log a tweet or a reading day into the local store")]
    Record {
        #[command(flatten)]
        command: RecordCommand,
    },
    #[command(about = "Keep every panel on screen. Press Enter to reload, Ctrl-C to quit")]
    Watch {
        #[arg(long, default_value_t = 300, help = "Seconds between redraws")]
        interval: u64,
        #[arg(long, help = "Draw without colors")]
        plain: bool,
    },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let dir = match args.dir {
        Some(dir) => ensure_dir(dir)?,
        None => create_application_default_path()?,
    };

    enable_logging(&dir, args.log)?;

    let credentials = Credentials {
        github_token: args.github_token,
        twitter_token: args.twitter_token,
        twitter_user: args.twitter_user,
    };

    match args.commands {
        Commands::Summary { command } => {
            let clock = command.clock(args.timezone)?;
            let context = AppContext::new(dir, args.timezone, credentials, clock)?;
            process_summary_command(&context, command).await
        }
        Commands::Grid {
            command,
            json,
            plain,
        } => {
            let clock = command.clock(args.timezone)?;
            let context = AppContext::new(dir, args.timezone, credentials, clock)?;
            process_grid_command(&context, command, json, plain).await
        }
        Commands::Toggle { source } => {
            let context = AppContext::with_default_clock(dir, args.timezone, credentials)?;
            let mut settings = context.settings.load().await?;
            let view = settings.toggle_view(source);
            context.settings.save(&settings).await?;
            println!("{} now shows the last {view}", source.title());
            Ok(())
        }
        Commands::Record { command } => {
            let context = AppContext::with_default_clock(dir, args.timezone, credentials)?;
            process_record_command(&context, command).await
        }
        Commands::Watch { interval, plain } => {
            let context = AppContext::with_default_clock(dir, args.timezone, credentials)?;
            watch::run_watch(&context, Duration::from_secs(interval.max(1)), !plain).await
        }
    }
}
