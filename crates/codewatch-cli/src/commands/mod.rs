//! CLI command implementations for `cwatch`.
//!
//! Each subcommand is implemented in its own module:
//!
//! - [`watch`] -- IMAP IDLE watcher with a terminal snapshot view.
//! - [`serve`] -- Webhook push endpoint + history engine.
//! - [`status`] -- Configuration diagnostics.
//! - [`config_cmd`] -- Resolved configuration dump.

pub mod config_cmd;
pub mod serve;
pub mod status;
pub mod watch;

use std::path::{Path, PathBuf};

use codewatch_types::config::{Config, expand_home};

/// Discover the active config file, if any.
///
/// Checks, in order: the `CODEWATCH_CONFIG` env var, then
/// `~/.codewatch/config.json`.
pub fn discover_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("CODEWATCH_CONFIG") {
        let path = expand_home(&path);
        if path.exists() {
            return Some(path);
        }
    }
    let default = expand_home("~/.codewatch/config.json");
    default.exists().then_some(default)
}

/// Load configuration from the given path override or via auto-discovery.
///
/// Returns `Config::default()` when no config file exists; an explicit
/// override path that does not exist is an error.
pub fn load_config(config_override: Option<&str>) -> anyhow::Result<Config> {
    let path = match config_override {
        Some(path_str) => {
            let path = Path::new(path_str);
            if !path.exists() {
                anyhow::bail!("config file not found: {path_str}");
            }
            path.to_path_buf()
        }
        None => match discover_config_path() {
            Some(path) => path,
            None => {
                let config = Config::default();
                config.validate()?;
                return Ok(config);
            }
        },
    };

    let contents = std::fs::read_to_string(&path)
        .map_err(|e| anyhow::anyhow!("failed to read config {}: {e}", path.display()))?;
    let config: Config = serde_json::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("failed to parse config {}: {e}", path.display()))?;
    config.validate()?;
    Ok(config)
}
