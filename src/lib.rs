// src/lib.rs
//! Interaction Recorder Library
//!
//! Captures user interactions with a web page as a timestamped event stream,
//! organizes them into recordings with checkpoints and annotations, and
//! compiles recordings into replay scripts for browser automation tools.
//!
//! # Architecture
//!
//! - **recording**: lifecycle state machine, event model, coalescing,
//!   masking, the recording aggregate and exports
//! - **compiler**: Selenium, Puppeteer and Playwright script backends
//! - **runtime**: clock and timer capabilities injected into the recorder
//! - **observability**: tracing and metrics setup
//! - **utils**: configuration and error types

pub mod compiler;
pub mod observability;
pub mod recording;
pub mod runtime;
pub mod utils;

// Re-export commonly used types
pub use compiler::{ScriptBackend, ScriptOptions};
pub use recording::{
    ExportFormat, InteractionEvent, InteractionRecording, Recorder, RecorderNotification,
    RecorderState, RecordingOptions, StartOptions,
};
pub use runtime::{Clock, ManualClock, ManualScheduler, Scheduler, SystemClock, TokioScheduler};
pub use utils::config::EngineConfig;
pub use utils::errors::{EngineError, Result};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const GIT_HASH: &str = env!("GIT_HASH");

/// Build information
pub struct BuildInfo {
    pub version: &'static str,
    pub git_hash: &'static str,
    pub build_timestamp: &'static str,
    pub rustc_version: &'static str,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            version: VERSION,
            git_hash: GIT_HASH,
            build_timestamp: env!("BUILD_TIMESTAMP"),
            rustc_version: env!("RUSTC_VERSION"),
        }
    }
}
