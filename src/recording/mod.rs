// src/recording/mod.rs
//! Interaction capture and the recording aggregate
//!
//! - **Recorder**: lifecycle state machine and capture surface
//! - **Event model**: tagged event payloads, element descriptors, checkpoints
//! - **Coalescer**: single-slot throttling for mouse-move and scroll
//! - **Masking**: redaction of sensitive input before events are built
//! - **Timeline**: the recording aggregate, statistics, queries and digest
//! - **Exporter**: JSON and replay-script artifacts
//!
//! # Architecture
//!
//! ```text
//! page instrumentation
//!        │ record_*(input)
//!        ▼
//!    Recorder ──state gate──▶ capture flag? ──▶ coalesced? ──yes──▶ CoalescingBuffer
//!        │                                         │ no                   │ timer / flush
//!        │                                         ▼                      ▼
//!        │                                   SensitiveDataMasker ──▶ InteractionRecording
//!        │                                                                │
//!        └──▶ NotificationHub (after lock release)           Exporter ◀──┘
//! ```

pub mod capture;
pub mod checkpoint;
pub mod coalescer;
pub mod event;
pub mod exporter;
pub mod masking;
pub mod notifications;
pub mod options;
pub mod recorder;
pub mod state;
pub mod timeline;

pub use capture::{
    CaptureContext, KeyInput, LoadInput, NavigationInput, PointerInput, ResizeInput, ScrollInput,
    SelectInput, ValueInput, VisibilityInput, WheelInput,
};
pub use checkpoint::{Annotation, AnnotationInput, AnnotationKind, CheckpointOptions, RecordingCheckpoint};
pub use event::{
    ElementDescriptor, EventData, EventType, InteractionEvent, KeyModifiers, MouseButton, Viewport,
};
pub use exporter::{ExportFormat, ExportResult, Exporter, JsonExportOptions};
pub use masking::{SensitiveDataMasker, REDACTION_TOKEN};
pub use notifications::{NotificationHub, RecorderNotification, Subscription};
pub use options::{RecordingOptions, StartOptions};
pub use recorder::{Recorder, RecorderStatus, RecordingHandle, StateChange};
pub use state::RecorderState;
pub use timeline::{InteractionRecording, RecordingStats, TimelinePage, TimelineQuery};
