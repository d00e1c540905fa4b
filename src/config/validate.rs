//! Configuration validation with range checks.

use crate::error::ConfigError;
use crate::pipeline::hash::HashAlgorithm;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "fetch.timeout_ms must be > 0".into(),
            ));
        }
        if self.processing.worker_count == 0 {
            return Err(ConfigError::ValidationError(
                "processing.worker_count must be > 0".into(),
            ));
        }
        if self.shard.samples_per_shard == 0 {
            return Err(ConfigError::ValidationError(
                "shard.samples_per_shard must be > 0".into(),
            ));
        }
        if self.shard.shard_id_digits == 0 {
            return Err(ConfigError::ValidationError(
                "shard.shard_id_digits must be > 0".into(),
            ));
        }
        if self.shard.encode_format.is_empty() {
            return Err(ConfigError::ValidationError(
                "shard.encode_format must not be empty".into(),
            ));
        }
        if !self.shard.column_list.iter().any(|c| c == "url") {
            return Err(ConfigError::ValidationError(
                "shard.column_list must include \"url\"".into(),
            ));
        }
        for (field, name) in [
            ("processing.compute_hash", &self.processing.compute_hash),
            ("processing.verify_hash", &self.processing.verify_hash),
        ] {
            if let Some(name) = name {
                if HashAlgorithm::parse(name).is_none() {
                    return Err(ConfigError::ValidationError(format!(
                        "{field}: unknown hash algorithm \"{name}\""
                    )));
                }
            }
        }
        Ok(())
    }
}
