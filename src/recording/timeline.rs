// src/recording/timeline.rs
//! Recording aggregate
//!
//! Owns the append-only timeline of one session: events, checkpoints and
//! annotations, with derived statistics and an integrity digest.

use crate::recording::checkpoint::{Annotation, RecordingCheckpoint};
use crate::recording::event::{EventType, InteractionEvent};
use crate::recording::options::RecordingOptions;
use crate::utils::errors::{EngineError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use tracing::warn;

/// Schema version written into every recording
pub const RECORDING_VERSION: u32 = 1;

/// Aggregated counters, updated on every append
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecordingStats {
    pub total_events: u64,

    /// Keyed by the kebab-case event type name
    pub events_by_type: BTreeMap<String, u64>,

    pub masked_events: u64,

    /// Events produced by the page, markers excluded
    pub interaction_events: u64,

    pub checkpoints: u64,
    pub annotations: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_event_at: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_event_at: Option<u64>,
}

impl RecordingStats {
    fn record(&mut self, event: &InteractionEvent) {
        self.total_events += 1;
        *self
            .events_by_type
            .entry(event.event_type.as_str().to_string())
            .or_insert(0) += 1;
        if event.masked {
            self.masked_events += 1;
        }
        if !event.event_type.is_marker() {
            self.interaction_events += 1;
        }
        self.first_event_at.get_or_insert(event.relative_time);
        self.last_event_at = Some(event.relative_time);
    }

    /// Count for one event type
    pub fn count(&self, event_type: EventType) -> u64 {
        self.events_by_type
            .get(event_type.as_str())
            .copied()
            .unwrap_or(0)
    }
}

/// Filter and page parameters for `timeline`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimelineQuery {
    /// Inclusive lower bound on relative time
    pub start_time: Option<u64>,

    /// Inclusive upper bound on relative time
    pub end_time: Option<u64>,

    pub event_type: Option<EventType>,
    pub offset: usize,
    pub limit: usize,
}

impl Default for TimelineQuery {
    fn default() -> Self {
        Self {
            start_time: None,
            end_time: None,
            event_type: None,
            offset: 0,
            limit: 100,
        }
    }
}

/// One page of a timeline query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelinePage {
    pub events: Vec<InteractionEvent>,

    /// Matching events before paging
    pub total: usize,

    pub offset: usize,
    pub limit: usize,
    pub has_more: bool,
    pub stats: RecordingStats,
}

/// A recorded session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionRecording {
    pub id: String,
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_url: Option<String>,

    /// Wall-clock start (milliseconds since epoch)
    pub start_time: i64,

    /// None while the recording is active
    #[serde(default)]
    pub end_time: Option<i64>,

    /// None while the recording is active
    #[serde(default)]
    pub duration: Option<u64>,

    #[serde(default)]
    pub total_pause_duration: u64,

    #[serde(default)]
    pub events: Vec<InteractionEvent>,

    #[serde(default)]
    pub checkpoints: Vec<RecordingCheckpoint>,

    #[serde(default)]
    pub annotations: Vec<Annotation>,

    #[serde(default)]
    pub stats: RecordingStats,

    /// Options active when recording began
    #[serde(default)]
    pub options: RecordingOptions,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// SHA-256 over events and checkpoints, set on finalize
    #[serde(default)]
    pub hash: Option<String>,

    #[serde(default = "default_version")]
    pub version: u32,
}

fn default_version() -> u32 {
    RECORDING_VERSION
}

impl InteractionRecording {
    /// Create an empty, active recording
    pub fn new(name: impl Into<String>, start_time: i64, options: RecordingOptions) -> Self {
        Self {
            id: format!("rec_{}", ulid::Ulid::new()),
            name: name.into(),
            description: None,
            start_url: None,
            start_time,
            end_time: None,
            duration: None,
            total_pause_duration: 0,
            events: Vec::new(),
            checkpoints: Vec::new(),
            annotations: Vec::new(),
            stats: RecordingStats::default(),
            options,
            metadata: BTreeMap::new(),
            tags: Vec::new(),
            hash: None,
            version: RECORDING_VERSION,
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.end_time.is_some()
    }

    /// Whether another event would be accepted
    pub fn has_capacity(&self) -> bool {
        self.events.len() < self.options.max_events
    }

    /// Append an event; returns false once `max_events` is reached
    pub fn add_event(&mut self, event: InteractionEvent) -> bool {
        if !self.has_capacity() {
            return false;
        }
        self.stats.record(&event);
        self.events.push(event);
        true
    }

    pub fn add_checkpoint(&mut self, checkpoint: RecordingCheckpoint) {
        self.stats.checkpoints += 1;
        self.checkpoints.push(checkpoint);
    }

    pub fn add_annotation(&mut self, annotation: Annotation) {
        self.stats.annotations += 1;
        self.annotations.push(annotation);
    }

    /// Seal the recording: end time, duration and digest
    pub fn finalize(&mut self, end_time: i64, total_pause_duration: u64) -> Result<()> {
        let elapsed = end_time.saturating_sub(self.start_time).max(0) as u64;
        self.end_time = Some(end_time);
        self.total_pause_duration = total_pause_duration;
        self.duration = Some(elapsed.saturating_sub(total_pause_duration));
        self.hash = Some(self.compute_hash()?);
        Ok(())
    }

    /// Hex SHA-256 of the serialized events and checkpoints
    pub fn compute_hash(&self) -> Result<String> {
        let payload = serde_json::to_vec(&(&self.events, &self.checkpoints))?;
        let mut hasher = Sha256::new();
        hasher.update(&payload);
        Ok(hex::encode(hasher.finalize()))
    }

    /// Recompute the digest and compare with the stored one
    pub fn verify_hash(&self) -> bool {
        let Some(stored) = self.hash.as_deref() else {
            return false;
        };
        match self.compute_hash() {
            Ok(actual) if actual == stored => true,
            Ok(_) => {
                warn!("Hash mismatch for recording {}", self.id);
                false
            }
            Err(e) => {
                warn!("Failed to hash recording {}: {}", self.id, e);
                false
            }
        }
    }

    /// Events with `start <= relative_time <= end`
    pub fn events_in_range(&self, start: u64, end: u64) -> &[InteractionEvent] {
        if start > end {
            return &[];
        }
        let lo = self.events.partition_point(|e| e.relative_time < start);
        let hi = self.events.partition_point(|e| e.relative_time <= end);
        &self.events[lo..hi.max(lo)]
    }

    pub fn events_by_type(&self, event_type: EventType) -> Vec<&InteractionEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    /// Up to `limit` events starting at `offset`
    pub fn slice(&self, offset: usize, limit: usize) -> &[InteractionEvent] {
        let start = offset.min(self.events.len());
        let end = start.saturating_add(limit).min(self.events.len());
        &self.events[start..end]
    }

    /// Filtered, paginated view
    pub fn timeline(&self, query: &TimelineQuery) -> TimelinePage {
        let start = query.start_time.unwrap_or(0);
        let end = query.end_time.unwrap_or(u64::MAX);

        let matching: Vec<&InteractionEvent> = self
            .events_in_range(start, end)
            .iter()
            .filter(|e| query.event_type.map_or(true, |t| e.event_type == t))
            .collect();

        let total = matching.len();
        let events: Vec<InteractionEvent> = matching
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .cloned()
            .collect();

        TimelinePage {
            has_more: query.offset.saturating_add(events.len()) < total,
            events,
            total,
            offset: query.offset,
            limit: query.limit,
            stats: self.stats.clone(),
        }
    }

    pub fn checkpoint(&self, id: &str) -> Option<&RecordingCheckpoint> {
        self.checkpoints.iter().find(|c| c.id == id)
    }

    /// Events appended after the checkpoint was taken
    pub fn events_since_checkpoint(&self, id: &str) -> Option<&[InteractionEvent]> {
        let checkpoint = self.checkpoint(id)?;
        let start = checkpoint.event_index.min(self.events.len());
        Some(&self.events[start..])
    }

    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }

    /// Parse a serialized recording
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| EngineError::ExportFailed(format!("Invalid recording: {}", e)))
    }
}
