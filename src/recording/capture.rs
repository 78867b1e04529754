// src/recording/capture.rs
//! Capture inputs
//!
//! Plain data objects handed to the `Recorder::record_*` methods by the page
//! instrumentation. Every field is optional on the wire; missing values
//! produce a degraded event rather than an error.

use crate::recording::event::{ElementDescriptor, KeyModifiers, MouseButton, Viewport};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Page context shared by most inputs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CaptureContext {
    pub element: Option<ElementDescriptor>,
    pub url: Option<String>,
    pub title: Option<String>,
    pub viewport: Option<Viewport>,
    pub metadata: BTreeMap<String, Value>,
}

macro_rules! with_element {
    ($($input:ty),+ $(,)?) => {
        $(
            impl $input {
                /// Attach the target element
                pub fn on(mut self, element: ElementDescriptor) -> Self {
                    self.context.element = Some(element);
                    self
                }

                /// Attach the page URL
                pub fn at_url(mut self, url: impl Into<String>) -> Self {
                    self.context.url = Some(url.into());
                    self
                }
            }
        )+
    };
}

/// Mouse-move, click, mouse-down/up and hover
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PointerInput {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub button: MouseButton,
    pub click_count: Option<u32>,
    #[serde(flatten)]
    pub context: CaptureContext,
}

impl PointerInput {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WheelInput {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub delta_x: f64,
    pub delta_y: f64,
    #[serde(flatten)]
    pub context: CaptureContext,
}

/// Key-down, key-up and key-press
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KeyInput {
    pub key: String,
    pub code: String,
    pub modifiers: KeyModifiers,
    #[serde(flatten)]
    pub context: CaptureContext,
}

impl KeyInput {
    pub fn new(key: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            code: code.into(),
            ..Default::default()
        }
    }
}

/// Input and change
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValueInput {
    pub value: String,
    pub input_type: Option<String>,
    #[serde(flatten)]
    pub context: CaptureContext,
}

impl ValueInput {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScrollInput {
    pub scroll_x: f64,
    pub scroll_y: f64,
    #[serde(flatten)]
    pub context: CaptureContext,
}

impl ScrollInput {
    pub fn to(scroll_x: f64, scroll_y: f64) -> Self {
        Self {
            scroll_x,
            scroll_y,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SelectInput {
    pub value: String,
    pub selected_text: Option<String>,
    pub selected_index: Option<i64>,
    #[serde(flatten)]
    pub context: CaptureContext,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResizeInput {
    pub width: u32,
    pub height: u32,
    #[serde(flatten)]
    pub context: CaptureContext,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VisibilityInput {
    pub visible: bool,
    #[serde(flatten)]
    pub context: CaptureContext,
}

with_element!(
    PointerInput,
    WheelInput,
    KeyInput,
    ValueInput,
    ScrollInput,
    SelectInput,
    ResizeInput,
    VisibilityInput,
);

/// Navigation; `url` is the destination and becomes the event's page URL
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NavigationInput {
    pub url: String,
    pub from_url: Option<String>,
    pub navigation_type: Option<String>,
    pub title: Option<String>,
    pub viewport: Option<Viewport>,
    pub metadata: BTreeMap<String, Value>,
}

impl NavigationInput {
    pub fn to(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }
}

/// Page load completion
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoadInput {
    pub url: String,
    pub load_time_ms: Option<u64>,
    pub title: Option<String>,
    pub viewport: Option<Viewport>,
    pub metadata: BTreeMap<String, Value>,
}
