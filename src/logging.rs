use std::path::Path;
use std::sync::Once;

use anyhow::{Context, Result};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub const LOG_FILE_PREFIX: &str = "keep_awake";

static INIT: Once = Once::new();

/// Install the global subscriber writing to a daily log file in `log_dir`.
///
/// Only the current day's file is kept. `RUST_LOG` overrides `verbosity`.
/// Calls after the first are no-ops.
pub fn init(log_dir: &Path, verbosity: u8) -> Result<()> {
    let mut result = Ok(());
    INIT.call_once(|| result = install(log_dir, verbosity));
    result
}

fn install(log_dir: &Path, verbosity: u8) -> Result<()> {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .max_log_files(1)
        .build(log_dir)
        .context("failed to create log file appender")?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(appender)
                .with_ansi(false)
                .with_target(false),
        )
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(())
}
