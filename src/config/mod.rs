//! Configuration for the shard download pipeline.
//!
//! Loaded from a TOML file with sensible defaults; every section implements
//! `Default` so a missing file or section falls back cleanly.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Network fetch settings
    pub fetch: FetchConfig,

    /// Per-sample processing settings
    pub processing: ProcessingConfig,

    /// Shard layout and output settings
    pub shard: ShardConfig,
}

impl Config {
    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}
