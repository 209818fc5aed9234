//! Binary entrypoint for KeepAwake.
//!
//! Delegates all logic to the library crate; no local modules here.

// Hides the console window on Windows in release builds.
#![cfg_attr(all(windows, not(debug_assertions)), windows_subsystem = "windows")]

use std::path::Path;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tracing::info;

use keep_awake::config::{self, CONFIG_FILE, KeepAwakeConfig};

/// Settings live in `config.json`; the command line only tunes logging.
#[derive(Debug, Parser)]
#[command(
    name = "keep-awake",
    version,
    about = "Keeps the machine out of standby during working hours"
)]
struct Cli {
    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    keep_awake::logging::init(Path::new("."), cli.verbose)?;

    let cfg = config::load_or_create(CONFIG_FILE)
        .with_context(|| format!("failed to load configuration from {CONFIG_FILE}"))?;
    info!(?cfg, "configuration loaded");

    run(cfg)
}

#[cfg(windows)]
fn run(cfg: KeepAwakeConfig) -> Result<()> {
    use keep_awake::platform::instance::InstanceGuard;

    let Some(_instance) = InstanceGuard::acquire("KeepAwakeAppMutex")? else {
        info!("another KeepAwake instance is already running");
        return Ok(());
    };

    info!("starting tray");
    keep_awake::tray::run(cfg)?;
    info!("KeepAwake stopped");
    Ok(())
}

#[cfg(not(windows))]
fn run(_cfg: KeepAwakeConfig) -> Result<()> {
    anyhow::bail!("the KeepAwake tray host only runs on Windows")
}
