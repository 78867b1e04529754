// src/utils/mod.rs
//! Common utilities: error types and layered configuration

pub mod config;
pub mod errors;

pub use config::{EngineConfig, LoggingConfig};
pub use errors::{EngineError, Result};
