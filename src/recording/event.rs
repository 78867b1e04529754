// src/recording/event.rs
//! Interaction event model
//!
//! An `InteractionEvent` is one recorded occurrence. Its payload is a closed
//! tagged union (`EventData`), so every consumer can match exhaustively
//! instead of probing loosely-typed keys.

use crate::utils::errors::{EngineError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Maximum number of characters of element text kept on an event
pub const MAX_ELEMENT_TEXT: usize = 100;

/// Event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventType {
    MouseMove,
    Click,
    MouseDown,
    MouseUp,
    Wheel,
    KeyDown,
    KeyUp,
    KeyPress,
    Input,
    Change,
    Focus,
    Blur,
    Scroll,
    Hover,
    Select,
    Navigation,
    Load,
    Resize,
    VisibilityChange,
    Checkpoint,
    Annotation,
}

impl EventType {
    /// Every event type, in declaration order
    pub const ALL: [EventType; 21] = [
        EventType::MouseMove,
        EventType::Click,
        EventType::MouseDown,
        EventType::MouseUp,
        EventType::Wheel,
        EventType::KeyDown,
        EventType::KeyUp,
        EventType::KeyPress,
        EventType::Input,
        EventType::Change,
        EventType::Focus,
        EventType::Blur,
        EventType::Scroll,
        EventType::Hover,
        EventType::Select,
        EventType::Navigation,
        EventType::Load,
        EventType::Resize,
        EventType::VisibilityChange,
        EventType::Checkpoint,
        EventType::Annotation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::MouseMove => "mouse-move",
            EventType::Click => "click",
            EventType::MouseDown => "mouse-down",
            EventType::MouseUp => "mouse-up",
            EventType::Wheel => "wheel",
            EventType::KeyDown => "key-down",
            EventType::KeyUp => "key-up",
            EventType::KeyPress => "key-press",
            EventType::Input => "input",
            EventType::Change => "change",
            EventType::Focus => "focus",
            EventType::Blur => "blur",
            EventType::Scroll => "scroll",
            EventType::Hover => "hover",
            EventType::Select => "select",
            EventType::Navigation => "navigation",
            EventType::Load => "load",
            EventType::Resize => "resize",
            EventType::VisibilityChange => "visibility-change",
            EventType::Checkpoint => "checkpoint",
            EventType::Annotation => "annotation",
        }
    }

    /// High-frequency types collapsed to one sample per throttle window
    pub fn is_coalesced(&self) -> bool {
        matches!(self, EventType::MouseMove | EventType::Scroll)
    }

    /// Types whose payload may carry user-entered values
    pub fn carries_sensitive_input(&self) -> bool {
        matches!(
            self,
            EventType::KeyDown
                | EventType::KeyUp
                | EventType::KeyPress
                | EventType::Input
                | EventType::Change
        )
    }

    /// Timeline markers created by the engine rather than the page
    pub fn is_marker(&self) -> bool {
        matches!(self, EventType::Checkpoint | EventType::Annotation)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        EventType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| EngineError::ConfigError(format!("Unknown event type: {}", s)))
    }
}

/// Pointer button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    #[default]
    Left,
    Middle,
    Right,
    Back,
    Forward,
}

/// Modifier keys held during a keyboard event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct KeyModifiers {
    pub alt: bool,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
}

impl KeyModifiers {
    pub fn any(&self) -> bool {
        self.alt || self.ctrl || self.meta || self.shift
    }
}

/// Description of the DOM element an event targeted
///
/// Resolved by the page instrumentation; the engine never queries the DOM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct ElementDescriptor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// The element's `type` attribute
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub element_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// CSS selector computed by the instrumentation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub xpath: Option<String>,

    /// Visible text, truncated to `MAX_ELEMENT_TEXT` characters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ElementDescriptor {
    /// Descriptor addressed by a CSS selector
    pub fn with_selector(selector: impl Into<String>) -> Self {
        Self {
            selector: Some(selector.into()),
            ..Default::default()
        }
    }

    /// Truncate `text` to at most `max_chars` characters
    pub fn truncate_text(&mut self, max_chars: usize) {
        if let Some(text) = self.text.as_mut() {
            if let Some((byte_index, _)) = text.char_indices().nth(max_chars) {
                text.truncate(byte_index);
            }
        }
    }

    /// Non-empty CSS selector, if any
    pub fn css_selector(&self) -> Option<&str> {
        self.selector.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Non-empty XPath, if any
    pub fn xpath_expr(&self) -> Option<&str> {
        self.xpath.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// Viewport dimensions at the time of the event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Type-specific event payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum EventData {
    MouseMove {
        x: Option<f64>,
        y: Option<f64>,
    },
    Click {
        x: Option<f64>,
        y: Option<f64>,
        #[serde(default)]
        button: MouseButton,
        #[serde(default = "default_click_count")]
        click_count: u32,
    },
    MouseDown {
        x: Option<f64>,
        y: Option<f64>,
        #[serde(default)]
        button: MouseButton,
    },
    MouseUp {
        x: Option<f64>,
        y: Option<f64>,
        #[serde(default)]
        button: MouseButton,
    },
    Wheel {
        x: Option<f64>,
        y: Option<f64>,
        delta_x: f64,
        delta_y: f64,
    },
    KeyDown {
        key: String,
        code: String,
        #[serde(default)]
        modifiers: KeyModifiers,
    },
    KeyUp {
        key: String,
        code: String,
        #[serde(default)]
        modifiers: KeyModifiers,
    },
    KeyPress {
        key: String,
        code: String,
        #[serde(default)]
        modifiers: KeyModifiers,
    },
    Input {
        value: String,
        input_type: Option<String>,
    },
    Change {
        value: String,
    },
    Focus,
    Blur,
    Scroll {
        scroll_x: f64,
        scroll_y: f64,
    },
    Hover {
        x: Option<f64>,
        y: Option<f64>,
    },
    Select {
        value: String,
        selected_text: Option<String>,
        selected_index: Option<i64>,
    },
    Navigation {
        url: String,
        from_url: Option<String>,
        navigation_type: Option<String>,
    },
    Load {
        url: String,
        load_time_ms: Option<u64>,
    },
    Resize {
        width: u32,
        height: u32,
    },
    VisibilityChange {
        visible: bool,
    },
    Checkpoint {
        checkpoint_id: String,
        name: String,
    },
    Annotation {
        annotation_id: String,
        text: String,
    },
}

fn default_click_count() -> u32 {
    1
}

impl EventData {
    /// The event type this payload belongs to
    pub fn event_type(&self) -> EventType {
        match self {
            EventData::MouseMove { .. } => EventType::MouseMove,
            EventData::Click { .. } => EventType::Click,
            EventData::MouseDown { .. } => EventType::MouseDown,
            EventData::MouseUp { .. } => EventType::MouseUp,
            EventData::Wheel { .. } => EventType::Wheel,
            EventData::KeyDown { .. } => EventType::KeyDown,
            EventData::KeyUp { .. } => EventType::KeyUp,
            EventData::KeyPress { .. } => EventType::KeyPress,
            EventData::Input { .. } => EventType::Input,
            EventData::Change { .. } => EventType::Change,
            EventData::Focus => EventType::Focus,
            EventData::Blur => EventType::Blur,
            EventData::Scroll { .. } => EventType::Scroll,
            EventData::Hover { .. } => EventType::Hover,
            EventData::Select { .. } => EventType::Select,
            EventData::Navigation { .. } => EventType::Navigation,
            EventData::Load { .. } => EventType::Load,
            EventData::Resize { .. } => EventType::Resize,
            EventData::VisibilityChange { .. } => EventType::VisibilityChange,
            EventData::Checkpoint { .. } => EventType::Checkpoint,
            EventData::Annotation { .. } => EventType::Annotation,
        }
    }

    /// Pointer coordinates, when the payload has finite ones
    pub fn point(&self) -> Option<(f64, f64)> {
        let (x, y) = match self {
            EventData::MouseMove { x, y }
            | EventData::Click { x, y, .. }
            | EventData::MouseDown { x, y, .. }
            | EventData::MouseUp { x, y, .. }
            | EventData::Wheel { x, y, .. }
            | EventData::Hover { x, y } => (*x, *y),
            _ => return None,
        };
        match (x, y) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Some((x, y)),
            _ => None,
        }
    }

    /// Replace non-finite numbers so the payload survives a JSON round trip
    ///
    /// Missing coordinates become `None`; scroll offsets and wheel deltas
    /// become 0.
    pub fn normalize_numbers(&mut self) {
        fn finite(value: &mut f64) {
            if !value.is_finite() {
                *value = 0.0;
            }
        }
        fn finite_opt(value: &mut Option<f64>) {
            if value.is_some_and(|v| !v.is_finite()) {
                *value = None;
            }
        }

        match self {
            EventData::Wheel {
                x,
                y,
                delta_x,
                delta_y,
            } => {
                finite_opt(x);
                finite_opt(y);
                finite(delta_x);
                finite(delta_y);
            }
            EventData::MouseMove { x, y }
            | EventData::Click { x, y, .. }
            | EventData::MouseDown { x, y, .. }
            | EventData::MouseUp { x, y, .. }
            | EventData::Hover { x, y } => {
                finite_opt(x);
                finite_opt(y);
            }
            EventData::Scroll { scroll_x, scroll_y } => {
                finite(scroll_x);
                finite(scroll_y);
            }
            _ => {}
        }
    }
}

/// One recorded interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionEvent {
    /// Unique event ID
    pub id: String,

    /// Event type (always equal to `data.event_type()`)
    #[serde(rename = "type")]
    pub event_type: EventType,

    /// Wall-clock time (milliseconds since epoch)
    pub timestamp: i64,

    /// Milliseconds since recording start, paused time excluded
    pub relative_time: u64,

    /// Gap to the previous event (milliseconds)
    pub time_delta: u64,

    /// Type-specific payload
    pub data: EventData,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<ElementDescriptor>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewport: Option<Viewport>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,

    /// Sensitive values were redacted before construction
    #[serde(default)]
    pub masked: bool,
}

impl InteractionEvent {
    /// Create an event with a fresh ID
    pub fn new(data: EventData, timestamp: i64, relative_time: u64, time_delta: u64) -> Self {
        Self {
            id: format!("evt_{}", ulid::Ulid::new()),
            event_type: data.event_type(),
            timestamp,
            relative_time,
            time_delta,
            data,
            element: None,
            url: None,
            title: None,
            viewport: None,
            metadata: BTreeMap::new(),
            masked: false,
        }
    }

    pub fn with_element(mut self, element: Option<ElementDescriptor>) -> Self {
        self.element = element;
        self
    }

    pub fn with_page(mut self, url: Option<String>, title: Option<String>) -> Self {
        self.url = url;
        self.title = title;
        self
    }

    pub fn with_viewport(mut self, viewport: Option<Viewport>) -> Self {
        self.viewport = viewport;
        self
    }

    pub fn with_metadata(mut self, metadata: BTreeMap<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_masked(mut self, masked: bool) -> Self {
        self.masked = masked;
        self
    }

    /// Serialize to a JSON string
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
