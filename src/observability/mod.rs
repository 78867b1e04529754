// src/observability/mod.rs
//! Logging and metrics setup
//!
//! The library only emits through the `tracing` and `metrics` facades;
//! binaries decide where the output goes.

use crate::utils::config::LoggingConfig;
use crate::utils::errors::{EngineError, Result};
use tracing_subscriber::EnvFilter;

/// Metric names emitted by the recorder and exporter
pub mod names {
    pub const EVENTS_RECORDED: &str = "recorder_events_recorded_total";
    pub const EVENTS_MASKED: &str = "recorder_events_masked_total";
    pub const EVENTS_REFUSED: &str = "recorder_events_refused_total";
    pub const SAMPLES_COALESCED: &str = "recorder_samples_coalesced_total";
    pub const EXPORT_BYTES: &str = "recorder_export_bytes";
}

/// Initialize tracing with default logging settings
pub fn init_tracing() -> Result<()> {
    init_tracing_with(&LoggingConfig::default())
}

/// Initialize tracing; `RUST_LOG` wins over the configured level
pub fn init_tracing_with(config: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(format!("interaction_recorder={}", config.level))
            .map_err(|e| EngineError::ConfigError(format!("Invalid log level: {}", e)))?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|e| EngineError::ConfigError(format!("Failed to initialize tracing: {}", e)))
}

/// Register metric descriptions with whichever recorder is installed
pub fn describe_metrics() {
    metrics::describe_counter!(names::EVENTS_RECORDED, "Events appended to a recording");
    metrics::describe_counter!(names::EVENTS_MASKED, "Events whose sensitive values were redacted");
    metrics::describe_counter!(
        names::EVENTS_REFUSED,
        "Events refused because the recording reached max_events"
    );
    metrics::describe_counter!(
        names::SAMPLES_COALESCED,
        "High-frequency samples discarded by coalescing"
    );
    metrics::describe_histogram!(names::EXPORT_BYTES, "Size of exported recordings and scripts");
}
