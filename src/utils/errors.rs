// src/utils/errors.rs
//! Engine error taxonomy
//!
//! Lifecycle-contract violations are always returned as errors. Capacity
//! breaches are notifications, and integrity checks are plain booleans, so
//! neither appears here.

use crate::recording::state::RecorderState;
use thiserror::Error;

/// Errors produced by the recorder engine, exporters and configuration
#[derive(Debug, Error)]
pub enum EngineError {
    /// A lifecycle call was made from a state that forbids it
    #[error("Invalid recorder state: currently {current}, requires {required}")]
    InvalidState {
        current: RecorderState,
        required: &'static str,
    },

    /// Checkpoint, annotation, query or export without any recording
    #[error("No active recording")]
    NoActiveRecording,

    /// Export could not be produced (includes malformed serialized recordings)
    #[error("Export failed: {0}")]
    ExportFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Runtime error: {0}")]
    RuntimeError(String),
}

impl EngineError {
    pub(crate) fn invalid_state(current: RecorderState, required: &'static str) -> Self {
        EngineError::InvalidState { current, required }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::SerializationError(e.to_string())
    }
}

impl From<config::ConfigError> for EngineError {
    fn from(e: config::ConfigError) -> Self {
        EngineError::ConfigError(e.to_string())
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, EngineError>;
