// src/recording/checkpoint.rs
//! Timeline bookmarks: checkpoints and annotations

use crate::utils::errors::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Named bookmark into a recording's event sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingCheckpoint {
    /// Unique checkpoint ID
    pub id: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Wall-clock time (milliseconds since epoch)
    pub timestamp: i64,

    /// Milliseconds since recording start, paused time excluded
    pub relative_time: u64,

    /// Number of events recorded when the checkpoint was taken.
    /// Frozen at creation.
    pub event_index: usize,

    /// Opaque page-state reference supplied by the caller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_state: Option<Value>,

    /// Opaque screenshot reference supplied by the caller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
}

impl RecordingCheckpoint {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Options for `Recorder::create_checkpoint`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CheckpointOptions {
    /// Defaults to "Checkpoint N"
    pub name: Option<String>,
    pub description: Option<String>,
    pub page_state: Option<Value>,
    pub screenshot: Option<String>,
}

impl CheckpointOptions {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }
}

/// Annotation category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    #[default]
    Note,
    Highlight,
    Issue,
    Question,
}

/// Free-form reviewer note attached to a recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    /// Unique annotation ID
    pub id: String,

    pub text: String,

    #[serde(default)]
    pub kind: AnnotationKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Wall-clock time the annotation was made
    pub timestamp: i64,

    /// Position on the recording timeline
    pub relative_time: u64,

    /// Number of events recorded when the annotation was attached
    pub event_index: usize,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
}

/// Input for `Recorder::add_annotation`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnnotationInput {
    pub text: String,
    pub kind: AnnotationKind,
    pub author: Option<String>,

    /// Timeline position for annotations on a stopped recording.
    /// Ignored while recording, where the live clock is used.
    pub relative_time: Option<u64>,

    pub metadata: BTreeMap<String, Value>,
}

impl AnnotationInput {
    pub fn note(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn at(mut self, relative_time: u64) -> Self {
        self.relative_time = Some(relative_time);
        self
    }
}
