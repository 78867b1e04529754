// src/recording/recorder.rs
//! Recorder engine
//!
//! Public capture surface and lifecycle state machine. Owns at most one
//! recording at a time; applies coalescing and masking before anything
//! reaches the recording.
//!
//! Notifications produced while the engine lock is held are queued and
//! published after it is released, so handlers may call back into the
//! recorder.

use crate::compiler::ScriptOptions;
use crate::observability::names;
use crate::recording::capture::{
    CaptureContext, KeyInput, LoadInput, NavigationInput, PointerInput, ResizeInput, ScrollInput,
    SelectInput, ValueInput, VisibilityInput, WheelInput,
};
use crate::recording::checkpoint::{Annotation, AnnotationInput, CheckpointOptions, RecordingCheckpoint};
use crate::recording::coalescer::{CoalescerStats, CoalescingBuffer, PendingSample};
use crate::recording::event::{EventData, EventType, InteractionEvent, Viewport, MAX_ELEMENT_TEXT};
use crate::recording::exporter::{ExportFormat, ExportResult, Exporter, JsonExportOptions};
use crate::recording::masking::SensitiveDataMasker;
use crate::recording::notifications::{NotificationHub, RecorderNotification, Subscription};
use crate::recording::options::{RecordingOptions, StartOptions};
use crate::recording::state::RecorderState;
use crate::recording::timeline::{InteractionRecording, RecordingStats, TimelinePage, TimelineQuery};
use crate::runtime::{Clock, Scheduler, SystemClock, TimerHandle, TokioScheduler};
use crate::utils::errors::{EngineError, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Returned by `start_recording`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingHandle {
    pub id: String,
    pub name: String,
    pub start_time: i64,
}

/// Returned by `pause_recording` / `resume_recording`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateChange {
    pub state: RecorderState,
    pub recording_id: String,
}

/// Snapshot of the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecorderStatus {
    pub state: RecorderState,
    pub recording_id: Option<String>,
    pub name: Option<String>,

    /// Relative time now (or at the pause, or the final duration)
    pub elapsed: Option<u64>,

    pub total_pause_duration: u64,
    pub event_count: usize,
    pub checkpoint_count: usize,
    pub annotation_count: usize,
    pub max_events: Option<usize>,
    pub max_events_reached: bool,
    pub mouse_move: CoalescerStats,
    pub scroll: CoalescerStats,
}

type Outbox = Vec<RecorderNotification>;

/// Mutable engine state, guarded by one lock
struct RecorderInner {
    state: RecorderState,
    recording: Option<InteractionRecording>,
    masker: SensitiveDataMasker,

    start_time: i64,
    pause_time: Option<i64>,
    total_pause: u64,

    /// Relative time of the last appended event
    last_relative: Option<u64>,

    mouse: CoalescingBuffer,
    scroll: CoalescingBuffer,
    auto_checkpoint: Option<(u64, TimerHandle)>,

    /// Source of timer tokens; a fired timer whose token is no longer
    /// current is ignored
    timer_seq: u64,

    max_events_notified: bool,
}

impl RecorderInner {
    fn new(masker: SensitiveDataMasker) -> Self {
        Self::reset(masker, 0)
    }

    /// Fresh state that keeps issuing timer tokens after `timer_seq`
    fn reset(masker: SensitiveDataMasker, timer_seq: u64) -> Self {
        Self {
            state: RecorderState::Idle,
            recording: None,
            masker,
            start_time: 0,
            pause_time: None,
            total_pause: 0,
            last_relative: None,
            mouse: CoalescingBuffer::new(EventType::MouseMove),
            scroll: CoalescingBuffer::new(EventType::Scroll),
            auto_checkpoint: None,
            timer_seq,
            max_events_notified: false,
        }
    }

    /// Elapsed recording time at `now`, paused intervals excluded
    fn relative_at(&self, now: i64) -> u64 {
        let elapsed = now.saturating_sub(self.start_time).max(0) as u64;
        elapsed.saturating_sub(self.total_pause)
    }

    /// Relative time for a new event: never earlier than the previous one
    fn next_relative(&self, now: i64) -> u64 {
        self.relative_at(now).max(self.last_relative.unwrap_or(0))
    }

    fn next_token(&mut self) -> u64 {
        self.timer_seq += 1;
        self.timer_seq
    }

    fn buffer_mut(&mut self, kind: EventType) -> &mut CoalescingBuffer {
        if kind == EventType::Scroll {
            &mut self.scroll
        } else {
            &mut self.mouse
        }
    }

    fn recording_id(&self) -> String {
        self.recording
            .as_ref()
            .map(|r| r.id.clone())
            .unwrap_or_default()
    }

    fn require(&self, allowed: &[RecorderState], required: &'static str) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(EngineError::invalid_state(self.state, required))
        }
    }
}

struct Shared {
    inner: Mutex<RecorderInner>,
    clock: Arc<dyn Clock>,
    scheduler: Arc<dyn Scheduler>,
    hub: Arc<NotificationHub>,
    defaults: RecordingOptions,
}

impl Shared {
    /// Build and append one event; returns false if it was refused
    fn append(
        &self,
        inner: &mut RecorderInner,
        outbox: &mut Outbox,
        data: EventData,
        context: CaptureContext,
        timestamp: i64,
        relative_time: u64,
    ) -> bool {
        let relative_time = relative_time.max(inner.last_relative.unwrap_or(0));
        let time_delta = inner
            .last_relative
            .map_or(0, |last| relative_time.saturating_sub(last));

        let (data, element, masked) = inner.masker.apply(data, context.element);
        let event = InteractionEvent::new(data, timestamp, relative_time, time_delta)
            .with_element(element)
            .with_page(context.url, context.title)
            .with_viewport(context.viewport)
            .with_metadata(context.metadata)
            .with_masked(masked);
        let event_type = event.event_type;

        let Some(recording) = inner.recording.as_mut() else {
            return false;
        };

        if recording.add_event(event.clone()) {
            inner.last_relative = Some(relative_time);
            metrics::counter!(names::EVENTS_RECORDED, "type" => event_type.as_str()).increment(1);
            if masked {
                metrics::counter!(names::EVENTS_MASKED).increment(1);
            }
            outbox.push(RecorderNotification::EventRecorded { event });
            return true;
        }

        metrics::counter!(names::EVENTS_REFUSED).increment(1);
        if !inner.max_events_notified {
            inner.max_events_notified = true;
            let max_events = recording.options.max_events;
            warn!(
                "Recording {} reached max_events ({}); further events are refused",
                recording.id, max_events
            );
            outbox.push(RecorderNotification::MaxEventsReached {
                recording_id: recording.id.clone(),
                max_events,
            });
        }
        false
    }

    /// Emit buffered samples with `relative_time <= upto` (all when None),
    /// oldest first
    fn flush_pending(&self, inner: &mut RecorderInner, outbox: &mut Outbox, upto: Option<u64>) {
        let mut samples: Vec<PendingSample> = Vec::with_capacity(2);

        for buffer in [&mut inner.mouse, &mut inner.scroll] {
            let due = match (buffer.peek_relative(), upto) {
                (Some(relative), Some(limit)) => relative <= limit,
                (Some(_), None) => true,
                (None, _) => false,
            };
            if !due {
                continue;
            }
            if let Some(handle) = buffer.disarm() {
                self.scheduler.cancel(handle);
            }
            if let Some(sample) = buffer.take() {
                samples.push(sample);
            }
        }

        samples.sort_by_key(|s| s.relative_time);
        for sample in samples {
            self.append(
                inner,
                outbox,
                sample.data,
                sample.context,
                sample.timestamp,
                sample.relative_time,
            );
        }
    }

    /// Store a high-frequency sample and arm its throttle timer if idle
    fn buffer_sample(self: &Arc<Self>, inner: &mut RecorderInner, sample: PendingSample) {
        let kind = sample.data.event_type();
        let throttle_ms = inner.recording.as_ref().map_or(100, |r| match kind {
            EventType::Scroll => r.options.scroll_throttle_ms,
            _ => r.options.mouse_move_throttle_ms,
        });

        if inner.buffer_mut(kind).offer(sample) {
            metrics::counter!(names::SAMPLES_COALESCED, "type" => kind.as_str()).increment(1);
        }
        if inner.buffer_mut(kind).is_armed() {
            return;
        }

        let token = inner.next_token();
        let weak = Arc::downgrade(self);
        let handle = self.scheduler.schedule(
            Duration::from_millis(throttle_ms),
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    Recorder { shared }.on_flush_timer(kind, token);
                }
            }),
        );
        inner.buffer_mut(kind).arm(token, handle);
    }

    fn arm_auto_checkpoint(self: &Arc<Self>, inner: &mut RecorderInner) {
        self.cancel_auto_checkpoint(inner);

        let Some(interval) = inner
            .recording
            .as_ref()
            .and_then(|r| r.options.auto_checkpoint_interval_ms)
            .filter(|ms| *ms > 0)
        else {
            return;
        };

        let token = inner.next_token();
        let weak = Arc::downgrade(self);
        let handle = self.scheduler.schedule(
            Duration::from_millis(interval),
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    Recorder { shared }.on_auto_checkpoint(token);
                }
            }),
        );
        inner.auto_checkpoint = Some((token, handle));
    }

    fn cancel_auto_checkpoint(&self, inner: &mut RecorderInner) {
        if let Some((_, handle)) = inner.auto_checkpoint.take() {
            self.scheduler.cancel(handle);
        }
    }

    /// Cancel and forget every outstanding timer
    fn cancel_timers(&self, inner: &mut RecorderInner) {
        self.cancel_auto_checkpoint(inner);
        for buffer in [&mut inner.mouse, &mut inner.scroll] {
            if let Some(handle) = buffer.disarm() {
                self.scheduler.cancel(handle);
            }
        }
    }

    fn checkpoint(
        &self,
        inner: &mut RecorderInner,
        outbox: &mut Outbox,
        options: CheckpointOptions,
    ) -> Result<RecordingCheckpoint> {
        self.flush_pending(inner, outbox, None);

        let now = self.clock.now_ms();
        let relative_time = inner.next_relative(now);
        let recording = inner.recording.as_mut().ok_or(EngineError::NoActiveRecording)?;

        let checkpoint = RecordingCheckpoint {
            id: format!("cp_{}", ulid::Ulid::new()),
            name: options
                .name
                .unwrap_or_else(|| format!("Checkpoint {}", recording.checkpoints.len() + 1)),
            description: options.description,
            timestamp: now,
            relative_time,
            event_index: recording.events.len(),
            page_state: options.page_state,
            screenshot: options.screenshot,
        };
        recording.add_checkpoint(checkpoint.clone());

        debug!(
            "Checkpoint '{}' at event {} ({} ms)",
            checkpoint.name, checkpoint.event_index, relative_time
        );

        self.append(
            inner,
            outbox,
            EventData::Checkpoint {
                checkpoint_id: checkpoint.id.clone(),
                name: checkpoint.name.clone(),
            },
            CaptureContext::default(),
            now,
            relative_time,
        );
        outbox.push(RecorderNotification::CheckpointCreated {
            checkpoint: checkpoint.clone(),
        });

        Ok(checkpoint)
    }
}

/// Interaction recorder
///
/// Cheap to clone; clones share the same engine.
#[derive(Clone)]
pub struct Recorder {
    shared: Arc<Shared>,
}

impl Recorder {
    /// Create a recorder with injected time sources
    pub fn new(
        defaults: RecordingOptions,
        clock: Arc<dyn Clock>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Result<Self> {
        let masker = SensitiveDataMasker::from_options(&defaults)?;
        Ok(Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(RecorderInner::new(masker)),
                clock,
                scheduler,
                hub: Arc::new(NotificationHub::new()),
                defaults,
            }),
        })
    }

    /// Create a recorder on the system clock and the current tokio runtime
    pub fn with_system_clock(defaults: RecordingOptions) -> Result<Self> {
        let scheduler = TokioScheduler::from_current()?;
        Self::new(defaults, Arc::new(SystemClock), Arc::new(scheduler))
    }

    /// Run `f` under the engine lock, then publish what it queued
    fn locked<T>(&self, f: impl FnOnce(&Arc<Shared>, &mut RecorderInner, &mut Outbox) -> T) -> T {
        let mut outbox = Outbox::new();
        let result = {
            let mut inner = self.shared.inner.lock();
            f(&self.shared, &mut inner, &mut outbox)
        };
        for notification in &outbox {
            self.shared.hub.publish(notification);
        }
        result
    }

    // ---- Lifecycle ----

    /// Begin a new recording (from Idle or Stopped)
    pub fn start_recording(&self, start: StartOptions) -> Result<RecordingHandle> {
        let options = start
            .options
            .clone()
            .unwrap_or_else(|| self.shared.defaults.clone());
        let masker = SensitiveDataMasker::from_options(&options)?;

        self.locked(move |shared, inner, outbox| {
            if !inner.state.can_start() {
                return Err(EngineError::invalid_state(inner.state, "idle or stopped"));
            }
            shared.cancel_timers(inner);

            let now = shared.clock.now_ms();
            let name = start.name.unwrap_or_else(|| default_name(now));

            let mut recording = InteractionRecording::new(name, now, options);
            recording.description = start.description;
            recording.start_url = start.start_url;
            recording.tags = start.tags;
            recording.metadata = start.metadata;

            let handle = RecordingHandle {
                id: recording.id.clone(),
                name: recording.name.clone(),
                start_time: now,
            };

            *inner = RecorderInner::reset(masker, inner.timer_seq);
            inner.state = RecorderState::Recording;
            inner.start_time = now;
            inner.recording = Some(recording);
            shared.arm_auto_checkpoint(inner);

            info!("Recording {} '{}' started", handle.id, handle.name);
            outbox.push(RecorderNotification::RecordingStarted {
                recording_id: handle.id.clone(),
                name: handle.name.clone(),
                start_time: now,
            });

            Ok(handle)
        })
    }

    pub fn pause_recording(&self) -> Result<StateChange> {
        self.locked(|shared, inner, outbox| {
            inner.require(&[RecorderState::Recording], "recording")?;

            shared.flush_pending(inner, outbox, None);
            shared.cancel_timers(inner);

            let now = shared.clock.now_ms();
            let relative_time = inner.relative_at(now);
            inner.pause_time = Some(now);
            inner.state = RecorderState::Paused;

            let recording_id = inner.recording_id();
            info!("Recording {} paused at {} ms", recording_id, relative_time);
            outbox.push(RecorderNotification::RecordingPaused {
                recording_id: recording_id.clone(),
                relative_time,
            });

            Ok(StateChange {
                state: inner.state,
                recording_id,
            })
        })
    }

    pub fn resume_recording(&self) -> Result<StateChange> {
        self.locked(|shared, inner, outbox| {
            inner.require(&[RecorderState::Paused], "paused")?;

            let now = shared.clock.now_ms();
            let paused_for = inner
                .pause_time
                .take()
                .map_or(0, |at| now.saturating_sub(at).max(0) as u64);
            inner.total_pause += paused_for;
            inner.state = RecorderState::Recording;
            shared.arm_auto_checkpoint(inner);

            let recording_id = inner.recording_id();
            info!("Recording {} resumed after {} ms", recording_id, paused_for);
            outbox.push(RecorderNotification::RecordingResumed {
                recording_id: recording_id.clone(),
                paused_for,
            });

            Ok(StateChange {
                state: inner.state,
                recording_id,
            })
        })
    }

    /// Finalize the recording and hand a snapshot to the caller
    ///
    /// Stopping while paused closes the open pause interval first.
    pub fn stop_recording(&self) -> Result<InteractionRecording> {
        self.locked(|shared, inner, outbox| {
            inner.require(&[RecorderState::Recording, RecorderState::Paused], "recording or paused")?;

            let now = shared.clock.now_ms();
            if let Some(paused_at) = inner.pause_time.take() {
                inner.total_pause += now.saturating_sub(paused_at).max(0) as u64;
            }

            shared.flush_pending(inner, outbox, None);
            shared.cancel_timers(inner);

            let total_pause = inner.total_pause;
            let recording = inner.recording.as_mut().ok_or(EngineError::NoActiveRecording)?;
            recording.finalize(now, total_pause)?;
            inner.state = RecorderState::Stopped;

            let duration = recording.duration.unwrap_or(0);
            info!(
                "Recording {} stopped: {} events, {} ms",
                recording.id,
                recording.events.len(),
                duration
            );
            outbox.push(RecorderNotification::RecordingStopped {
                recording_id: recording.id.clone(),
                duration,
                event_count: recording.events.len(),
                hash: recording.hash.clone(),
            });

            Ok(recording.clone())
        })
    }

    /// Cancel all timers, drop buffered samples and the current recording,
    /// and return to Idle
    pub fn cleanup(&self) {
        self.locked(|shared, inner, _| {
            shared.cancel_timers(inner);
            inner.mouse.discard();
            inner.scroll.discard();
            if let Some(recording) = inner.recording.as_ref() {
                debug!("Discarding recording {}", recording.id);
            }
            *inner = RecorderInner::reset(inner.masker.clone(), inner.timer_seq);
        });
    }

    // ---- Checkpoints & annotations ----

    /// Bookmark the current position (Recording only)
    pub fn create_checkpoint(&self, options: CheckpointOptions) -> Result<RecordingCheckpoint> {
        self.locked(|shared, inner, outbox| {
            if inner.recording.is_none() {
                return Err(EngineError::NoActiveRecording);
            }
            inner.require(&[RecorderState::Recording], "recording")?;
            shared.checkpoint(inner, outbox, options)
        })
    }

    /// Attach a note while recording, or retroactively to a stopped recording
    pub fn add_annotation(&self, input: AnnotationInput) -> Result<Annotation> {
        self.locked(|shared, inner, outbox| {
            if inner.recording.is_none() {
                return Err(EngineError::NoActiveRecording);
            }
            inner.require(
                &[RecorderState::Recording, RecorderState::Stopped],
                "recording or stopped",
            )?;

            let now = shared.clock.now_ms();
            let live = inner.state == RecorderState::Recording;
            if live {
                shared.flush_pending(inner, outbox, None);
            }
            let live_relative = inner.next_relative(now);

            let recording = inner.recording.as_mut().ok_or(EngineError::NoActiveRecording)?;
            let relative_time = if live {
                live_relative
            } else {
                input
                    .relative_time
                    .unwrap_or_else(|| recording.duration.unwrap_or(0))
            };

            let annotation = Annotation {
                id: format!("ann_{}", ulid::Ulid::new()),
                text: input.text,
                kind: input.kind,
                author: input.author,
                timestamp: now,
                relative_time,
                event_index: recording.events.len(),
                metadata: input.metadata,
            };
            recording.add_annotation(annotation.clone());

            if live {
                shared.append(
                    inner,
                    outbox,
                    EventData::Annotation {
                        annotation_id: annotation.id.clone(),
                        text: annotation.text.clone(),
                    },
                    CaptureContext::default(),
                    now,
                    relative_time,
                );
            }

            debug!("Annotation {} at {} ms", annotation.id, relative_time);
            outbox.push(RecorderNotification::AnnotationAdded {
                annotation: annotation.clone(),
            });

            Ok(annotation)
        })
    }

    // ---- Capture ----

    /// Common capture path; returns true if the sample was recorded or
    /// buffered
    fn capture(&self, mut data: EventData, mut context: CaptureContext) -> bool {
        data.normalize_numbers();
        self.locked(move |shared, inner, outbox| {
            if inner.state != RecorderState::Recording {
                return false;
            }
            let event_type = data.event_type();
            let enabled = inner
                .recording
                .as_ref()
                .is_some_and(|r| r.options.captures(event_type));
            if !enabled {
                return false;
            }

            if let Some(element) = context.element.as_mut() {
                element.truncate_text(MAX_ELEMENT_TEXT);
            }

            let now = shared.clock.now_ms();
            let relative_time = inner.relative_at(now);

            if event_type.is_coalesced() {
                shared.buffer_sample(
                    inner,
                    PendingSample {
                        data,
                        context,
                        timestamp: now,
                        relative_time,
                    },
                );
                return true;
            }

            shared.flush_pending(inner, outbox, None);
            shared.append(inner, outbox, data, context, now, relative_time)
        })
    }

    pub fn record_mouse_move(&self, input: PointerInput) -> bool {
        self.capture(
            EventData::MouseMove {
                x: input.x,
                y: input.y,
            },
            input.context,
        )
    }

    pub fn record_click(&self, input: PointerInput) -> bool {
        self.capture(
            EventData::Click {
                x: input.x,
                y: input.y,
                button: input.button,
                click_count: input.click_count.unwrap_or(1).max(1),
            },
            input.context,
        )
    }

    pub fn record_mouse_down(&self, input: PointerInput) -> bool {
        self.capture(
            EventData::MouseDown {
                x: input.x,
                y: input.y,
                button: input.button,
            },
            input.context,
        )
    }

    pub fn record_mouse_up(&self, input: PointerInput) -> bool {
        self.capture(
            EventData::MouseUp {
                x: input.x,
                y: input.y,
                button: input.button,
            },
            input.context,
        )
    }

    pub fn record_wheel(&self, input: WheelInput) -> bool {
        self.capture(
            EventData::Wheel {
                x: input.x,
                y: input.y,
                delta_x: input.delta_x,
                delta_y: input.delta_y,
            },
            input.context,
        )
    }

    pub fn record_key_down(&self, input: KeyInput) -> bool {
        self.capture(
            EventData::KeyDown {
                key: input.key,
                code: input.code,
                modifiers: input.modifiers,
            },
            input.context,
        )
    }

    pub fn record_key_up(&self, input: KeyInput) -> bool {
        self.capture(
            EventData::KeyUp {
                key: input.key,
                code: input.code,
                modifiers: input.modifiers,
            },
            input.context,
        )
    }

    pub fn record_key_press(&self, input: KeyInput) -> bool {
        self.capture(
            EventData::KeyPress {
                key: input.key,
                code: input.code,
                modifiers: input.modifiers,
            },
            input.context,
        )
    }

    pub fn record_input(&self, input: ValueInput) -> bool {
        self.capture(
            EventData::Input {
                value: input.value,
                input_type: input.input_type,
            },
            input.context,
        )
    }

    pub fn record_change(&self, input: ValueInput) -> bool {
        self.capture(EventData::Change { value: input.value }, input.context)
    }

    pub fn record_focus(&self, context: CaptureContext) -> bool {
        self.capture(EventData::Focus, context)
    }

    pub fn record_blur(&self, context: CaptureContext) -> bool {
        self.capture(EventData::Blur, context)
    }

    pub fn record_scroll(&self, input: ScrollInput) -> bool {
        self.capture(
            EventData::Scroll {
                scroll_x: input.scroll_x,
                scroll_y: input.scroll_y,
            },
            input.context,
        )
    }

    pub fn record_hover(&self, input: PointerInput) -> bool {
        self.capture(
            EventData::Hover {
                x: input.x,
                y: input.y,
            },
            input.context,
        )
    }

    pub fn record_select(&self, input: SelectInput) -> bool {
        self.capture(
            EventData::Select {
                value: input.value,
                selected_text: input.selected_text,
                selected_index: input.selected_index,
            },
            input.context,
        )
    }

    pub fn record_navigation(&self, input: NavigationInput) -> bool {
        let context = CaptureContext {
            element: None,
            url: Some(input.url.clone()),
            title: input.title,
            viewport: input.viewport,
            metadata: input.metadata,
        };
        self.capture(
            EventData::Navigation {
                url: input.url,
                from_url: input.from_url,
                navigation_type: input.navigation_type,
            },
            context,
        )
    }

    pub fn record_load(&self, input: LoadInput) -> bool {
        let context = CaptureContext {
            element: None,
            url: Some(input.url.clone()),
            title: input.title,
            viewport: input.viewport,
            metadata: input.metadata,
        };
        self.capture(
            EventData::Load {
                url: input.url,
                load_time_ms: input.load_time_ms,
            },
            context,
        )
    }

    pub fn record_resize(&self, input: ResizeInput) -> bool {
        let mut context = input.context;
        if context.viewport.is_none() {
            context.viewport = Some(Viewport {
                width: input.width,
                height: input.height,
            });
        }
        self.capture(
            EventData::Resize {
                width: input.width,
                height: input.height,
            },
            context,
        )
    }

    pub fn record_visibility_change(&self, input: VisibilityInput) -> bool {
        self.capture(
            EventData::VisibilityChange {
                visible: input.visible,
            },
            input.context,
        )
    }

    // ---- Timers ----

    fn on_flush_timer(&self, kind: EventType, token: u64) {
        self.locked(|shared, inner, outbox| {
            let buffer = inner.buffer_mut(kind);
            if !buffer.owns_timer(token) {
                return;
            }
            buffer.disarm();
            let upto = buffer.peek_relative();

            if inner.state == RecorderState::Recording && upto.is_some() {
                shared.flush_pending(inner, outbox, upto);
            }
        });
    }

    fn on_auto_checkpoint(&self, token: u64) {
        self.locked(|shared, inner, outbox| {
            if !matches!(inner.auto_checkpoint, Some((armed, _)) if armed == token) {
                return;
            }
            inner.auto_checkpoint = None;
            if inner.state != RecorderState::Recording {
                return;
            }

            let number = inner.recording.as_ref().map_or(0, |r| r.checkpoints.len()) + 1;
            if let Err(e) = shared.checkpoint(
                inner,
                outbox,
                CheckpointOptions::named(format!("Auto checkpoint {}", number)),
            ) {
                warn!("Auto checkpoint failed: {}", e);
            }
            shared.arm_auto_checkpoint(inner);
        });
    }

    // ---- Queries ----

    pub fn state(&self) -> RecorderState {
        self.shared.inner.lock().state
    }

    pub fn status(&self) -> RecorderStatus {
        let now = self.shared.clock.now_ms();
        let inner = self.shared.inner.lock();
        let recording = inner.recording.as_ref();

        let elapsed = match inner.state {
            RecorderState::Idle => None,
            RecorderState::Recording => Some(inner.relative_at(now)),
            RecorderState::Paused => inner.pause_time.map(|at| inner.relative_at(at)),
            RecorderState::Stopped => recording.and_then(|r| r.duration),
        };

        RecorderStatus {
            state: inner.state,
            recording_id: recording.map(|r| r.id.clone()),
            name: recording.map(|r| r.name.clone()),
            elapsed,
            total_pause_duration: inner.total_pause,
            event_count: recording.map_or(0, |r| r.events.len()),
            checkpoint_count: recording.map_or(0, |r| r.checkpoints.len()),
            annotation_count: recording.map_or(0, |r| r.annotations.len()),
            max_events: recording.map(|r| r.options.max_events),
            max_events_reached: inner.max_events_notified,
            mouse_move: inner.mouse.stats(),
            scroll: inner.scroll.stats(),
        }
    }

    /// Paginated slice of the current recording
    pub fn timeline(&self, query: &TimelineQuery) -> Result<TimelinePage> {
        let inner = self.shared.inner.lock();
        let recording = inner.recording.as_ref().ok_or(EngineError::NoActiveRecording)?;
        Ok(recording.timeline(query))
    }

    pub fn stats(&self) -> Result<RecordingStats> {
        let inner = self.shared.inner.lock();
        let recording = inner.recording.as_ref().ok_or(EngineError::NoActiveRecording)?;
        Ok(recording.stats.clone())
    }

    /// Read-only snapshot of the current recording
    pub fn recording(&self) -> Option<InteractionRecording> {
        self.shared.inner.lock().recording.clone()
    }

    // ---- Export ----

    fn snapshot(&self) -> Result<InteractionRecording> {
        self.recording().ok_or(EngineError::NoActiveRecording)
    }

    pub fn export(&self, format: ExportFormat, options: &ScriptOptions) -> Result<ExportResult> {
        let recording = self.snapshot()?;
        Exporter::new(format)
            .with_script_options(options.clone())
            .export(&recording)
    }

    pub fn export_as_json(&self, options: JsonExportOptions) -> Result<ExportResult> {
        let recording = self.snapshot()?;
        Exporter::new(ExportFormat::Json)
            .pretty(options.pretty)
            .export(&recording)
    }

    pub fn export_as_selenium(&self, options: &ScriptOptions) -> Result<ExportResult> {
        self.export(ExportFormat::Selenium, options)
    }

    pub fn export_as_puppeteer(&self, options: &ScriptOptions) -> Result<ExportResult> {
        self.export(ExportFormat::Puppeteer, options)
    }

    pub fn export_as_playwright(&self, options: &ScriptOptions) -> Result<ExportResult> {
        self.export(ExportFormat::Playwright, options)
    }

    // ---- Notifications ----

    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&RecorderNotification) + Send + Sync + 'static,
    {
        self.shared.hub.subscribe(handler)
    }

    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        self.shared.hub.unsubscribe(subscription)
    }

    /// Notifications as a channel
    pub fn notifications(&self) -> (Subscription, mpsc::UnboundedReceiver<RecorderNotification>) {
        self.shared.hub.channel()
    }
}

fn default_name(now: i64) -> String {
    match chrono::DateTime::from_timestamp_millis(now) {
        Some(at) => format!("Recording {}", at.format("%Y-%m-%d %H:%M:%S")),
        None => "Recording".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::event::ElementDescriptor;
    use crate::runtime::{ManualClock, ManualScheduler};

    fn recorder_with(options: RecordingOptions) -> (Recorder, Arc<ManualScheduler>) {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let scheduler = Arc::new(ManualScheduler::new(Arc::clone(&clock)));
        let recorder = Recorder::new(options, clock, scheduler.clone()).unwrap();
        (recorder, scheduler)
    }

    #[test]
    fn test_start_twice_is_invalid() {
        let (recorder, _) = recorder_with(RecordingOptions::default());
        let handle = recorder.start_recording(StartOptions::named("first")).unwrap();
        assert_eq!(handle.name, "first");
        assert!(handle.id.starts_with("rec_"));

        let err = recorder.start_recording(StartOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidState {
                current: RecorderState::Recording,
                ..
            }
        ));
    }

    #[test]
    fn test_lifecycle_calls_from_idle() {
        let (recorder, _) = recorder_with(RecordingOptions::default());
        assert!(matches!(
            recorder.pause_recording(),
            Err(EngineError::InvalidState {
                current: RecorderState::Idle,
                ..
            })
        ));
        assert!(matches!(
            recorder.stop_recording(),
            Err(EngineError::InvalidState { .. })
        ));
        assert!(matches!(
            recorder.create_checkpoint(CheckpointOptions::default()),
            Err(EngineError::NoActiveRecording)
        ));
    }

    #[test]
    fn test_capture_ignored_unless_recording() {
        let (recorder, _) = recorder_with(RecordingOptions::default());
        assert!(!recorder.record_click(PointerInput::at(1.0, 1.0)));

        recorder.start_recording(StartOptions::default()).unwrap();
        recorder.pause_recording().unwrap();
        assert!(!recorder.record_click(PointerInput::at(1.0, 1.0)));
        assert_eq!(recorder.status().event_count, 0);
    }

    #[test]
    fn test_disabled_type_is_noop() {
        let options = RecordingOptions {
            record_focus: false,
            ..Default::default()
        };
        let (recorder, _) = recorder_with(options);
        recorder.start_recording(StartOptions::default()).unwrap();
        assert!(!recorder.record_focus(CaptureContext::default()));
        assert!(!recorder.record_blur(CaptureContext::default()));
    }

    #[test]
    fn test_mouse_moves_flushed_before_click() {
        let (recorder, scheduler) = recorder_with(RecordingOptions::default());
        recorder.start_recording(StartOptions::default()).unwrap();

        recorder.record_mouse_move(PointerInput::at(1.0, 1.0));
        scheduler.advance(10);
        recorder.record_mouse_move(PointerInput::at(2.0, 2.0));
        scheduler.advance(10);
        recorder.record_click(
            PointerInput::at(2.0, 2.0).on(ElementDescriptor::with_selector("#go")),
        );

        let recording = recorder.recording().unwrap();
        let types: Vec<EventType> = recording.events.iter().map(|e| e.event_type).collect();
        assert_eq!(types, vec![EventType::MouseMove, EventType::Click]);
        assert_eq!(recording.events[0].relative_time, 10);
        assert_eq!(recording.events[1].relative_time, 20);
        assert_eq!(recording.events[1].time_delta, 10);
        assert_eq!(scheduler.pending(), 0);

        let status = recorder.status();
        assert_eq!(status.mouse_move.received, 2);
        assert_eq!(status.mouse_move.discarded, 1);
    }

    #[test]
    fn test_element_text_truncated() {
        let (recorder, _) = recorder_with(RecordingOptions::default());
        recorder.start_recording(StartOptions::default()).unwrap();

        let element = ElementDescriptor {
            text: Some("x".repeat(500)),
            ..Default::default()
        };
        recorder.record_click(PointerInput::at(0.0, 0.0).on(element));

        let recording = recorder.recording().unwrap();
        let text = recording.events[0].element.as_ref().unwrap().text.clone().unwrap();
        assert_eq!(text.chars().count(), MAX_ELEMENT_TEXT);
    }

    #[test]
    fn test_cleanup_returns_to_idle() {
        let (recorder, scheduler) = recorder_with(RecordingOptions {
            auto_checkpoint_interval_ms: Some(1_000),
            ..Default::default()
        });
        recorder.start_recording(StartOptions::default()).unwrap();
        recorder.record_scroll(ScrollInput::to(0.0, 50.0));
        assert_eq!(scheduler.pending(), 2);

        recorder.cleanup();
        assert_eq!(recorder.state(), RecorderState::Idle);
        assert!(recorder.recording().is_none());
        assert_eq!(scheduler.pending(), 0);
        assert!(matches!(
            recorder.create_checkpoint(CheckpointOptions::default()),
            Err(EngineError::NoActiveRecording)
        ));
    }

    #[test]
    fn test_export_requires_recording() {
        let (recorder, _) = recorder_with(RecordingOptions::default());
        assert!(matches!(
            recorder.export_as_json(JsonExportOptions::default()),
            Err(EngineError::NoActiveRecording)
        ));
        assert!(matches!(recorder.stats(), Err(EngineError::NoActiveRecording)));
    }

    #[test]
    fn test_invalid_sensitive_pattern_rejected_at_start() {
        let (recorder, _) = recorder_with(RecordingOptions::default());
        let start = StartOptions::default().with_options(RecordingOptions {
            sensitive_patterns: vec!["[".to_string()],
            ..Default::default()
        });
        assert!(matches!(
            recorder.start_recording(start),
            Err(EngineError::ConfigError(_))
        ));
        assert_eq!(recorder.state(), RecorderState::Idle);
    }

    #[tokio::test]
    async fn test_system_clock_recorder_flushes_on_timer() {
        let recorder = Recorder::with_system_clock(RecordingOptions {
            mouse_move_throttle_ms: 20,
            ..Default::default()
        })
        .unwrap();
        recorder.start_recording(StartOptions::default()).unwrap();
        recorder.record_mouse_move(PointerInput::at(5.0, 6.0));

        tokio::time::sleep(Duration::from_millis(200)).await;

        let recording = recorder.recording().unwrap();
        assert_eq!(recording.events.len(), 1);
        assert_eq!(recording.events[0].data.point(), Some((5.0, 6.0)));
    }
}
