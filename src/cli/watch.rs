use std::{io::BufRead, time::Duration};

use anyhow::Result;
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::{
    dashboard::{
        refresh::{ReloadHub, ReloadListener},
        Dashboard, InvalidDatePolicy, Panel, PanelSnapshot,
    },
    sources::SourceKind,
    utils::clock::Clock,
};

use super::{context::AppContext, render::render_snapshot, shutdown::detect_shutdown};

/// Every source that can be built, each in its saved view.
async fn build_dashboard(context: &AppContext) -> Result<Dashboard> {
    let settings = context.settings.load().await?;
    let mut dashboard = context.dashboard(InvalidDatePolicy::Skip);
    for kind in SourceKind::ALL {
        match context.build_source(kind, None) {
            Ok(source) => {
                dashboard = dashboard.with_panel(Panel::new(kind, settings.view(kind), source))
            }
            Err(e) => {
                warn!("Leaving out {kind}: {e}");
                println!("{}: {e}", kind.title());
            }
        }
    }
    Ok(dashboard)
}

/// Redraws on every tick or reload request until `shutdown` is cancelled. Reload requests
/// bypass source caches.
async fn watch_loop(
    dashboard: &Dashboard,
    clock: &dyn Clock,
    interval: Duration,
    mut listener: ReloadListener,
    shutdown: CancellationToken,
    mut draw: impl FnMut(&[(SourceKind, Result<PanelSnapshot>)]),
) {
    let mut force = false;
    loop {
        let results = dashboard.load_all(force).await;
        draw(&results);

        select! {
            _ = shutdown.cancelled() => break,
            _ = clock.sleep(interval) => force = false,
            requested = listener.requested() => {
                if !requested {
                    break;
                }
                debug!("Reload requested");
                force = true;
            }
        }
    }
}

fn draw_all(results: &[(SourceKind, Result<PanelSnapshot>)], color: bool) {
    if color {
        // Clear the screen and move to the top left corner.
        print!("\x1B[2J\x1B[H");
    }
    for (kind, result) in results {
        match result {
            Ok(snapshot) => println!("{}", render_snapshot(snapshot, color)),
            Err(e) => {
                error!("Failed to load {kind}: {e:?}");
                println!("{}\nFailed to load: {e:#}\n", kind.title());
            }
        }
    }
    println!("Press Enter to reload, Ctrl-C to quit");
}

/// Stdin is read on a plain thread, a blocking read would keep the runtime from shutting down.
fn listen_for_enter(hub: ReloadHub) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(_) => hub.reload(),
                Err(e) => {
                    warn!("Stopped reading stdin: {e}");
                    break;
                }
            }
        }
    });
}

/// Command to process `watch`. Keeps all panels on screen.
pub async fn run_watch(context: &AppContext, interval: Duration, color: bool) -> Result<()> {
    let dashboard = build_dashboard(context).await?;

    let shutdown = CancellationToken::new();
    tokio::spawn(detect_shutdown(shutdown.clone()));

    let hub = ReloadHub::new();
    let listener = hub.subscribe();
    listen_for_enter(hub.clone());

    watch_loop(
        &dashboard,
        context.clock.as_ref(),
        interval,
        listener,
        shutdown.clone(),
        |results| draw_all(results, color),
    )
    .await;

    shutdown.cancel();
    Ok(())
}
