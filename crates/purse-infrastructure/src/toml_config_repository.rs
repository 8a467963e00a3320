//! TOML-based ConfigRepository implementation

use crate::paths::PursePaths;
use async_trait::async_trait;
use purse_core::config::{ConfigRepository, PurseConfig};
use purse_core::error::{PurseError, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Reads `PurseConfig` from a TOML file.
///
/// A missing or blank file is not an error: every key has a default, so the
/// repository returns `PurseConfig::default()` instead.
#[derive(Debug, Clone)]
pub struct TomlConfigRepository {
    path: PathBuf,
}

impl TomlConfigRepository {
    /// Creates a repository for the default path (`~/.config/purse/config.toml`).
    pub fn new() -> Result<Self> {
        Ok(Self {
            path: PursePaths::config_file()?,
        })
    }

    /// Creates a repository with a custom config path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ConfigRepository for TomlConfigRepository {
    async fn load(&self) -> Result<PurseConfig> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(
                    "[Config] No config at {}, using defaults",
                    self.path.display()
                );
                return Ok(PurseConfig::default());
            }
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(PurseConfig::default());
        }

        let config: PurseConfig = toml::from_str(&content).map_err(|e| {
            PurseError::serialization(
                "TOML",
                format!("Failed to parse {}: {}", self.path.display(), e),
            )
        })?;

        tracing::debug!("[Config] Loaded {}", self.path.display());
        Ok(config)
    }
}
