//! Subcommands and the configuration loading they share.

pub mod analyze;
pub mod classify;
pub mod config;

use std::path::{Path, PathBuf};

use tracing::debug;

use billsense_core::models::config::BillsenseConfig;

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("billsense")
        .join("config.json")
}

/// Explicit config path, or the default location.
pub fn config_path(explicit: Option<&str>) -> PathBuf {
    explicit.map(PathBuf::from).unwrap_or_else(default_config_path)
}

/// Load the effective configuration: file (explicit or default, when present)
/// followed by environment overrides.
pub fn load_config(explicit: Option<&str>) -> anyhow::Result<BillsenseConfig> {
    let config = match explicit {
        Some(path) => BillsenseConfig::from_file(Path::new(path))?,
        None => {
            let path = default_config_path();
            if path.exists() {
                BillsenseConfig::from_file(&path)?
            } else {
                BillsenseConfig::default()
            }
        }
    };

    let config = config.with_process_env();
    debug!("Effective AI config: {:?}", config.ai);
    Ok(config)
}
