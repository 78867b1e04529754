// src/recording/options.rs
//! Recording options and start parameters

use crate::recording::event::EventType;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Capture behaviour for one recording
///
/// A snapshot is stored on every recording so exports can tell how the
/// timeline was captured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingOptions {
    pub record_mouse_moves: bool,
    pub record_clicks: bool,
    pub record_keyboard: bool,
    pub record_inputs: bool,
    pub record_scroll: bool,
    pub record_navigation: bool,
    pub record_focus: bool,
    pub record_hover: bool,
    pub record_resize: bool,
    pub record_visibility: bool,

    /// Coalescing window for mouse-move samples (milliseconds)
    pub mouse_move_throttle_ms: u64,

    /// Coalescing window for scroll samples (milliseconds)
    pub scroll_throttle_ms: u64,

    /// Event ceiling; further events are refused, never evicted
    pub max_events: usize,

    /// Apply field-name heuristics. `type="password"` is masked regardless.
    pub mask_sensitive_data: bool,

    /// Extra regex patterns matched against element name/id/type/class
    pub sensitive_patterns: Vec<String>,

    /// Create a checkpoint every N milliseconds while recording
    pub auto_checkpoint_interval_ms: Option<u64>,
}

impl Default for RecordingOptions {
    fn default() -> Self {
        Self {
            record_mouse_moves: true,
            record_clicks: true,
            record_keyboard: true,
            record_inputs: true,
            record_scroll: true,
            record_navigation: true,
            record_focus: true,
            record_hover: true,
            record_resize: true,
            record_visibility: true,
            mouse_move_throttle_ms: 100,
            scroll_throttle_ms: 100,
            max_events: 10_000,
            mask_sensitive_data: true,
            sensitive_patterns: Vec::new(),
            auto_checkpoint_interval_ms: None,
        }
    }
}

impl RecordingOptions {
    /// Whether the feature flag for `event_type` is enabled
    pub fn captures(&self, event_type: EventType) -> bool {
        match event_type {
            EventType::MouseMove => self.record_mouse_moves,
            EventType::Click | EventType::MouseDown | EventType::MouseUp => self.record_clicks,
            EventType::KeyDown | EventType::KeyUp | EventType::KeyPress => self.record_keyboard,
            EventType::Input | EventType::Change | EventType::Select => self.record_inputs,
            EventType::Scroll | EventType::Wheel => self.record_scroll,
            EventType::Navigation | EventType::Load => self.record_navigation,
            EventType::Focus | EventType::Blur => self.record_focus,
            EventType::Hover => self.record_hover,
            EventType::Resize => self.record_resize,
            EventType::VisibilityChange => self.record_visibility,
            EventType::Checkpoint | EventType::Annotation => true,
        }
    }

    /// Preset for keyboard/form-only sessions
    pub fn minimal() -> Self {
        Self {
            record_mouse_moves: false,
            record_hover: false,
            record_scroll: false,
            record_visibility: false,
            ..Default::default()
        }
    }
}

/// Parameters for `Recorder::start_recording`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StartOptions {
    /// Defaults to "Recording <start time>"
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_url: Option<String>,
    pub tags: Vec<String>,
    pub metadata: BTreeMap<String, Value>,

    /// Overrides the engine's default recording options
    pub options: Option<RecordingOptions>,
}

impl StartOptions {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_options(mut self, options: RecordingOptions) -> Self {
        self.options = Some(options);
        self
    }

    pub fn with_start_url(mut self, url: impl Into<String>) -> Self {
        self.start_url = Some(url.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_capture_everything() {
        let options = RecordingOptions::default();
        for event_type in EventType::ALL {
            assert!(options.captures(event_type), "{} disabled", event_type);
        }
        assert_eq!(options.max_events, 10_000);
        assert!(options.mask_sensitive_data);
    }

    #[test]
    fn test_flags_map_to_types() {
        let options = RecordingOptions {
            record_scroll: false,
            ..Default::default()
        };
        assert!(!options.captures(EventType::Scroll));
        assert!(!options.captures(EventType::Wheel));
        assert!(options.captures(EventType::Click));

        let minimal = RecordingOptions::minimal();
        assert!(!minimal.captures(EventType::MouseMove));
        assert!(minimal.captures(EventType::Input));
        assert!(minimal.captures(EventType::Checkpoint));
    }

    #[test]
    fn test_partial_deserialize() {
        let options: RecordingOptions =
            serde_json::from_str(r#"{"max_events": 5, "record_hover": false}"#).unwrap();
        assert_eq!(options.max_events, 5);
        assert!(!options.record_hover);
        assert_eq!(options.mouse_move_throttle_ms, 100);
    }
}
