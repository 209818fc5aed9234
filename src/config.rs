use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

pub use config_model::{KeepAwakeConfig, LockPriority, WorkHours};

/// Settings file looked up in the working directory.
pub const CONFIG_FILE: &str = "config.json";

/// Load the settings file, writing the defaults first when it does not exist.
///
/// A file that exists but does not parse, or holds out-of-range values, is an
/// error; nothing is overwritten in that case.
pub fn load_or_create(path: impl AsRef<Path>) -> Result<KeepAwakeConfig> {
    let path = path.as_ref();
    let cfg = match fs::read_to_string(path) {
        Ok(raw) => serde_json::from_str::<KeepAwakeConfig>(&raw)
            .with_context(|| format!("failed to parse {}", path.display()))?,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            let cfg = KeepAwakeConfig::default();
            write_config(path, &cfg)?;
            info!(path = %path.display(), "created default configuration");
            cfg
        }
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {}", path.display()));
        }
    };

    let cfg = cfg
        .validated()
        .with_context(|| format!("invalid configuration in {}", path.display()))?;

    if cfg.work_hours().is_empty() {
        warn!(
            start_hour = cfg.start_hour,
            end_hour = cfg.end_hour,
            "working hours are empty; the schedule will never keep the machine awake"
        );
    }
    Ok(cfg)
}

/// Write `cfg` as JSON indented by four spaces.
pub fn write_config(path: &Path, cfg: &KeepAwakeConfig) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    cfg.serialize(&mut serializer)
        .context("failed to serialize configuration")?;

    fs::write(path, buf).with_context(|| format!("failed to write {}", path.display()))
}
