use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Caller-settable values folded into every purchase flow.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct SessionConfig {
    /// Obfuscated account correlation id; omitted from flows when empty.
    pub account_id: String,
    /// Obfuscated profile correlation id; omitted from flows when empty.
    pub profile_id: String,
    /// Marks offers as personalized in the flow request.
    pub personalized: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

/// Root of the `config.toml` file.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct PurseConfig {
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

/// Source of the workspace configuration.
#[async_trait]
pub trait ConfigRepository: Send + Sync {
    /// Loads the configuration, falling back to defaults when none is stored.
    async fn load(&self) -> Result<PurseConfig>;
}
