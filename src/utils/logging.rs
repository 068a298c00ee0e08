use std::{path::Path, sync::LazyLock};

use anyhow::Result;
use tracing::level_filters::LevelFilter;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::{
    fmt::{format::FmtSpan, writer::MakeWriterExt},
    EnvFilter,
};

const LOG_FILE_PREFIX: &str = "heatboard";
const MAX_LOG_FILES: usize = 5;
const DEFAULT_LEVEL: LevelFilter = LevelFilter::WARN;

/// Filter for this crate's events. `--log` wins over `RUST_LOG`, which wins over the default.
fn crate_filter(verbose: bool, rust_log: Option<String>) -> String {
    let level = if verbose {
        LevelFilter::TRACE.to_string()
    } else {
        rust_log.unwrap_or_else(|| DEFAULT_LEVEL.to_string())
    };
    format!("{}={level}", env!("CARGO_PKG_NAME").replace('-', "_"))
}

/// Logs into daily files under `<app dir>/logs`. `verbose` also mirrors everything to stdout.
pub fn enable_logging(app_dir: &Path, verbose: bool) -> Result<()> {
    let appender = tracing_appender::rolling::Builder::new()
        .rotation(Rotation::DAILY)
        .max_log_files(MAX_LOG_FILES)
        .filename_prefix(LOG_FILE_PREFIX)
        .build(app_dir.join("logs"))?;

    let stdout = std::io::stdout.with_filter(move |_| verbose);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(crate_filter(
            verbose,
            std::env::var("RUST_LOG").ok(),
        )))
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(stdout.and(appender))
        .pretty()
        .init();
    Ok(())
}

pub static TEST_LOGGING: LazyLock<()> = LazyLock::new(|| {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::TRACE)
        .with_test_writer()
        .pretty()
        .init()
});

#[cfg(test)]
mod tests {
    use super::crate_filter;

    #[test]
    fn verbose_beats_environment() {
        assert_eq!(crate_filter(true, Some("info".into())), "heatboard=trace");
        assert_eq!(crate_filter(false, Some("info".into())), "heatboard=info");
        assert_eq!(crate_filter(false, None), "heatboard=warn");
    }
}
