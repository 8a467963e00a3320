//! Unified path management for purse configuration files.
//!
//! ```text
//! ~/.config/purse/             # Config directory (platform config dir)
//! └── config.toml              # Session defaults and log filter
//! ```

use purse_core::error::{PurseError, Result};
use std::path::PathBuf;

/// Resolves purse's on-disk locations.
pub struct PursePaths;

impl PursePaths {
    const APP_DIR: &'static str = "purse";
    const CONFIG_FILE: &'static str = "config.toml";

    /// Returns the purse configuration directory (e.g. `~/.config/purse/`).
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(Self::APP_DIR))
            .ok_or_else(|| PurseError::config("Cannot find config directory"))
    }

    /// Returns the path to the main configuration file.
    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(Self::CONFIG_FILE))
    }
}
