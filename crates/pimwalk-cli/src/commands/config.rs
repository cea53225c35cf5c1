//! Configuration resolution and the `config` subcommand.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Subcommand;
use pimwalk_common::PimConfig;
use tracing::debug;

/// Read from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "pimwalk.toml";

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Print the configuration file path in use
    Path,
}

/// The file `load_configuration` would read, if any.
pub fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|p| p.exists()),
    }
}

/// File (explicit or default) plus `PIMWALK_*` overrides, or defaults plus
/// overrides when there is no file.
pub fn load_configuration(explicit: Option<&Path>) -> Result<PimConfig> {
    match config_path(explicit) {
        Some(path) => {
            debug!(path = %path.display(), "loading configuration");
            PimConfig::load(&path).with_context(|| format!("Failed to load configuration from {}", path.display()))
        }
        None => PimConfig::from_env().context("Failed to build configuration from environment"),
    }
}

pub fn handle_config_command(action: ConfigAction, config: &PimConfig, explicit: Option<&Path>) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let text = config.to_toml().context("Failed to serialize configuration")?;
            println!("{text}");
        }
        ConfigAction::Path => match config_path(explicit) {
            Some(path) => println!("{}", path.display()),
            None => println!("(none, using defaults; create {DEFAULT_CONFIG_FILE} to override)"),
        },
    }
    Ok(())
}
