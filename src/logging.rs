/// File logging.
///
/// The terminal is in raw mode on the alternate screen while the game runs,
/// so all `tracing` output goes to a log file instead of stdout/stderr.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_subscriber::fmt::time::OffsetTime;

pub fn setup_log(path: &Path) -> Result<()> {
    let logfile = std::fs::OpenOptions::new()
        .write(true)
        .truncate(true)
        .create(true)
        .open(path)
        .with_context(|| format!("could not open log file {}", path.display()))?;
    let timer = OffsetTime::new(
        time::UtcOffset::UTC,
        time::macros::format_description!("[hour]:[minute]:[second].[subsecond digits:6]"),
    );
    tracing_subscriber::fmt()
        .event_format(
            tracing_subscriber::fmt::format()
                .with_target(false)
                .with_source_location(true)
                .with_timer(timer),
        )
        .with_writer(logfile)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .context("could not install log subscriber")?;
    Ok(())
}

/// Log an error together with its cause chain.
pub fn log_error(e: &anyhow::Error) {
    tracing::error!("{}", e);
    e.chain()
        .skip(1)
        .for_each(|cause| tracing::error!("caused by: {}", cause));
}
