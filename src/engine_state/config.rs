//! Engine configuration.
//!
//! Every field has a default, so an empty JSON object is a valid configuration.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Errors produced while loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse engine config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid engine config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Tunables for the regeneration pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Whether edits regenerate on the background worker (`true`) or inline.
    pub threaded: bool,
    /// Name given to the regeneration worker thread.
    pub worker_thread_name: String,
    /// Regenerations slower than this are logged as warnings.
    pub slow_generation_warn_ms: u64,
    /// Initial capacity of the regeneration queue.
    pub queue_capacity: usize,
    /// Seed of the biome tint field.
    pub biome_seed: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            threaded: true,
            worker_thread_name: "chunk-regeneration".to_string(),
            slow_generation_warn_ms: 50,
            queue_capacity: 256,
            biome_seed: 0,
        }
    }
}

impl EngineConfig {
    /// Parses and validates a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_thread_name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "worker_thread_name",
                reason: "must not be empty".to_string(),
            });
        }
        if self.worker_thread_name.contains('\0') {
            return Err(ConfigError::Invalid {
                field: "worker_thread_name",
                reason: "must not contain NUL bytes".to_string(),
            });
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "queue_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn slow_generation_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_generation_warn_ms)
    }
}
