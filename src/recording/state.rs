// src/recording/state.rs
//! Recorder lifecycle states

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of the recorder
///
/// ```text
/// Idle ──start──▶ Recording ──pause──▶ Paused
///                   ▲   │  ◀──resume──┘  │
///                   │   └──stop──▶ Stopped ◀──stop──┘
///                   └────start────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecorderState {
    #[default]
    Idle,
    Recording,
    Paused,
    Stopped,
}

impl RecorderState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecorderState::Idle => "idle",
            RecorderState::Recording => "recording",
            RecorderState::Paused => "paused",
            RecorderState::Stopped => "stopped",
        }
    }

    /// A new recording may begin from this state
    pub fn can_start(&self) -> bool {
        matches!(self, RecorderState::Idle | RecorderState::Stopped)
    }

    /// A recording is open (not yet finalized)
    pub fn is_active(&self) -> bool {
        matches!(self, RecorderState::Recording | RecorderState::Paused)
    }
}

impl fmt::Display for RecorderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
