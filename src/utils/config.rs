// src/utils/config.rs
//! Layered engine configuration
//!
//! Sources, lowest precedence first:
//! 1. Built-in defaults
//! 2. `recorder.toml` in the working directory, or the file named by
//!    `RECORDER_CONFIG`
//! 3. `RECORDER_*` environment variables, nested with `__`
//!    (e.g. `RECORDER_RECORDER__MAX_EVENTS=5000`)

use crate::compiler::ScriptOptions;
use crate::recording::masking::SensitiveDataMasker;
use crate::recording::options::RecordingOptions;
use crate::utils::errors::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "RECORDER_CONFIG";

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "RECORDER";

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level for this crate's targets (overridden by `RUST_LOG`)
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Default options applied to every new recording
    pub recorder: RecordingOptions,

    /// Default script generation options
    pub export: ScriptOptions,

    /// Logging setup
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Load configuration from defaults, config file and environment
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).ok();
        Self::load_from(path.as_deref().map(Path::new))
    }

    /// Load configuration, reading `path` (required) instead of the default file
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let defaults = config::Config::try_from(&EngineConfig::default())?;

        let file_source = match path {
            Some(path) => {
                debug!("Loading configuration from {:?}", path);
                config::File::from(path).required(true)
            }
            None => config::File::with_name("recorder").required(false),
        };

        let built = config::Config::builder()
            .add_source(defaults)
            .add_source(file_source)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: EngineConfig = built.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let recorder = &self.recorder;

        if recorder.max_events == 0 {
            return Err(EngineError::ConfigError(
                "recorder.max_events must be greater than 0".to_string(),
            ));
        }
        if recorder.mouse_move_throttle_ms == 0 {
            return Err(EngineError::ConfigError(
                "recorder.mouse_move_throttle_ms must be greater than 0".to_string(),
            ));
        }
        if recorder.scroll_throttle_ms == 0 {
            return Err(EngineError::ConfigError(
                "recorder.scroll_throttle_ms must be greater than 0".to_string(),
            ));
        }
        if recorder.auto_checkpoint_interval_ms == Some(0) {
            return Err(EngineError::ConfigError(
                "recorder.auto_checkpoint_interval_ms must be greater than 0 when set".to_string(),
            ));
        }

        // Extra patterns must compile
        SensitiveDataMasker::from_options(recorder)?;

        Ok(())
    }
}
