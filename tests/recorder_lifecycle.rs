//! Integration tests for the recorder lifecycle.
//!
//! Every test drives the engine through virtual time: a `ManualClock`
//! shared with a `ManualScheduler`, so throttle windows and auto-checkpoint
//! timers fire deterministically from `advance`.

use interaction_recorder::recording::{
    AnnotationInput, CaptureContext, CheckpointOptions, ElementDescriptor, EventData, EventType,
    InteractionRecording, KeyInput, NavigationInput, PointerInput, Recorder, RecorderNotification,
    RecorderState, RecordingOptions, ScrollInput, StartOptions, TimelineQuery, ValueInput,
    WheelInput, REDACTION_TOKEN,
};
use interaction_recorder::runtime::{ManualClock, ManualScheduler, Scheduler};
use interaction_recorder::EngineError;
use parking_lot::Mutex;
use proptest::prelude::*;
use std::sync::Arc;

const T0: i64 = 1_700_000_000_000;

struct Harness {
    recorder: Recorder,
    scheduler: Arc<ManualScheduler>,
}

impl Harness {
    fn new(options: RecordingOptions) -> Self {
        let clock = Arc::new(ManualClock::new(T0));
        let scheduler = Arc::new(ManualScheduler::new(Arc::clone(&clock)));
        let recorder = Recorder::new(options, clock, scheduler.clone()).expect("valid options");
        Self {
            recorder,
            scheduler,
        }
    }

    fn advance(&self, ms: u64) {
        self.scheduler.advance(ms);
    }

    /// Collect every notification name published from now on
    fn capture_notifications(&self) -> Arc<Mutex<Vec<RecorderNotification>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        self.recorder
            .subscribe(move |n: &RecorderNotification| sink.lock().push(n.clone()));
        seen
    }
}

fn click_on(selector: &str) -> PointerInput {
    PointerInput::at(10.0, 10.0).on(ElementDescriptor::with_selector(selector))
}

fn password_field() -> ElementDescriptor {
    ElementDescriptor {
        tag_name: Some("input".to_string()),
        element_type: Some("password".to_string()),
        selector: Some("#pw".to_string()),
        value: Some("hunter2".to_string()),
        ..Default::default()
    }
}

#[test]
fn test_duration_excludes_paused_time() {
    let h = Harness::new(RecordingOptions::default());
    h.recorder.start_recording(StartOptions::named("pauses")).unwrap();

    h.advance(50);
    h.recorder.pause_recording().unwrap();
    h.advance(200);
    h.recorder.resume_recording().unwrap();
    h.advance(50);

    let recording = h.recorder.stop_recording().unwrap();
    assert_eq!(recording.duration, Some(100));
    assert_eq!(recording.total_pause_duration, 200);
    assert_eq!(recording.end_time, Some(T0 + 300));

    let end = recording.end_time.unwrap();
    assert_eq!(
        recording.duration.unwrap() as i64,
        end - recording.start_time - recording.total_pause_duration as i64
    );
}

#[test]
fn test_stop_while_paused_closes_pause() {
    let h = Harness::new(RecordingOptions::default());
    h.recorder.start_recording(StartOptions::default()).unwrap();

    h.advance(30);
    h.recorder.pause_recording().unwrap();
    h.advance(500);

    let recording = h.recorder.stop_recording().unwrap();
    assert_eq!(recording.total_pause_duration, 500);
    assert_eq!(recording.duration, Some(30));
    assert_eq!(h.recorder.state(), RecorderState::Stopped);
}

#[test]
fn test_events_after_pause_use_shifted_clock() {
    let h = Harness::new(RecordingOptions::default());
    h.recorder.start_recording(StartOptions::default()).unwrap();

    h.advance(40);
    h.recorder.record_click(click_on("#a"));
    h.recorder.pause_recording().unwrap();
    h.advance(1_000);
    h.recorder.resume_recording().unwrap();
    h.advance(10);
    h.recorder.record_click(click_on("#b"));

    let recording = h.recorder.recording().unwrap();
    assert_eq!(recording.events[0].relative_time, 40);
    assert_eq!(recording.events[1].relative_time, 50);
    assert_eq!(recording.events[1].time_delta, 10);
    assert_eq!(recording.events[0].time_delta, 0);
}

#[test]
fn test_ten_mouse_moves_in_one_window_coalesce() {
    let h = Harness::new(RecordingOptions::default());
    h.recorder.start_recording(StartOptions::default()).unwrap();

    for i in 0..10 {
        h.recorder
            .record_mouse_move(PointerInput::at(i as f64, (i * 2) as f64));
        h.advance(9);
    }
    h.advance(100);

    let recording = h.recorder.recording().unwrap();
    let moves = recording.events_by_type(EventType::MouseMove);
    assert_eq!(moves.len(), 1);
    assert_eq!(moves[0].data.point(), Some((9.0, 18.0)));
    assert_eq!(moves[0].relative_time, 81);
    assert_eq!(h.scheduler.pending(), 0);

    let status = h.recorder.status();
    assert_eq!(status.mouse_move.received, 10);
    assert_eq!(status.mouse_move.emitted, 1);
    assert_eq!(status.mouse_move.discarded, 9);
}

#[test]
fn test_one_event_per_throttle_window() {
    let h = Harness::new(RecordingOptions::default());
    h.recorder.start_recording(StartOptions::default()).unwrap();

    // Three windows of 100 ms, samples every 20 ms
    for i in 0..15 {
        h.recorder.record_scroll(ScrollInput::to(0.0, (i * 10) as f64));
        h.advance(20);
    }
    h.advance(200);

    let recording = h.recorder.recording().unwrap();
    let scrolls = recording.events_by_type(EventType::Scroll);
    assert_eq!(scrolls.len(), 3);
    assert!(scrolls.windows(2).all(|w| w[0].relative_time < w[1].relative_time));
}

#[test]
fn test_pending_samples_flushed_on_stop() {
    let h = Harness::new(RecordingOptions::default());
    h.recorder.start_recording(StartOptions::default()).unwrap();

    h.recorder.record_mouse_move(PointerInput::at(1.0, 2.0));
    h.advance(5);
    h.recorder.record_scroll(ScrollInput::to(0.0, 300.0));
    h.advance(5);

    let recording = h.recorder.stop_recording().unwrap();
    let types: Vec<EventType> = recording.events.iter().map(|e| e.event_type).collect();
    assert_eq!(types, vec![EventType::MouseMove, EventType::Scroll]);
    assert_eq!(h.scheduler.pending(), 0);
    assert!(recording.verify_hash());
}

#[test]
fn test_password_masked_regardless_of_heuristics() {
    let h = Harness::new(RecordingOptions {
        mask_sensitive_data: false,
        ..Default::default()
    });
    h.recorder.start_recording(StartOptions::default()).unwrap();

    h.recorder
        .record_input(ValueInput::new("hunter2").on(password_field()));
    h.recorder
        .record_key_press(KeyInput::new("h", "KeyH").on(password_field()));
    h.recorder.record_input(
        ValueInput::new("plain").on(ElementDescriptor {
            name: Some("email".to_string()),
            ..Default::default()
        }),
    );

    let recording = h.recorder.stop_recording().unwrap();
    let json = recording.to_json(false).unwrap();
    assert!(!json.contains("hunter2"));

    assert!(recording.events[0].masked);
    assert!(recording.events[1].masked);
    assert_eq!(
        recording.events[0].element.as_ref().unwrap().value.as_deref(),
        Some(REDACTION_TOKEN)
    );

    // Heuristics are off, so an "email" field is left alone
    assert!(!recording.events[2].masked);
    assert_eq!(recording.stats.masked_events, 2);
}

#[test]
fn test_password_element_masked_on_click_and_blur() {
    let h = Harness::new(RecordingOptions::default());
    h.recorder.start_recording(StartOptions::default()).unwrap();

    h.recorder
        .record_click(PointerInput::at(12.0, 34.0).on(password_field()));
    h.recorder.record_blur(CaptureContext {
        element: Some(password_field()),
        ..Default::default()
    });

    let recording = h.recorder.stop_recording().unwrap();
    let json = recording.to_json(false).unwrap();
    assert!(!json.contains("hunter2"));

    assert_eq!(recording.events.len(), 2);
    for event in &recording.events {
        assert!(event.masked, "{:?} not masked", event.event_type);
        assert_eq!(
            event.element.as_ref().unwrap().value.as_deref(),
            Some(REDACTION_TOKEN)
        );
    }
    assert_eq!(recording.stats.masked_events, 2);
}

#[test]
fn test_camel_case_short_field_names_masked() {
    let h = Harness::new(RecordingOptions::default());
    h.recorder.start_recording(StartOptions::default()).unwrap();

    let names = ["userPin", "pinCode", "cardPIN", "telNumber"];
    for name in names {
        h.recorder.record_input(
            ValueInput::new("1234").on(ElementDescriptor {
                name: Some(name.to_string()),
                ..Default::default()
            }),
        );
    }
    h.recorder.record_input(
        ValueInput::new("Ritz").on(ElementDescriptor {
            name: Some("hotelName".to_string()),
            ..Default::default()
        }),
    );

    let recording = h.recorder.stop_recording().unwrap();
    let json = recording.to_json(false).unwrap();
    assert!(!json.contains("1234"));

    for event in &recording.events[..names.len()] {
        assert!(event.masked);
        assert!(
            matches!(&event.data, EventData::Input { value, .. } if value == REDACTION_TOKEN)
        );
    }
    assert!(!recording.events[names.len()].masked);
}

#[test]
fn test_non_finite_numbers_survive_json_round_trip() {
    let h = Harness::new(RecordingOptions::default());
    h.recorder.start_recording(StartOptions::default()).unwrap();

    h.recorder.record_scroll(ScrollInput::to(f64::NAN, 10.0));
    h.advance(150);
    h.recorder.record_wheel(WheelInput {
        x: Some(f64::INFINITY),
        y: Some(5.0),
        delta_x: f64::NEG_INFINITY,
        delta_y: 120.0,
        ..Default::default()
    });
    h.recorder
        .record_click(PointerInput::at(f64::NAN, 20.0).on(ElementDescriptor::with_selector("#go")));

    let recording = h.recorder.stop_recording().unwrap();
    assert_eq!(recording.events.len(), 3);

    let restored = InteractionRecording::from_json(&recording.to_json(false).unwrap()).unwrap();
    assert_eq!(restored, recording);
    assert!(restored.verify_hash());

    assert_eq!(
        restored.events[0].data,
        EventData::Scroll {
            scroll_x: 0.0,
            scroll_y: 10.0
        }
    );
    assert_eq!(
        restored.events[1].data,
        EventData::Wheel {
            x: None,
            y: Some(5.0),
            delta_x: 0.0,
            delta_y: 120.0
        }
    );
    assert_eq!(restored.events[2].data.point(), None);
}

#[test]
fn test_checkpoint_index_is_frozen() {
    let h = Harness::new(RecordingOptions::default());
    h.recorder.start_recording(StartOptions::default()).unwrap();

    for selector in ["#a", "#b", "#c"] {
        h.recorder.record_click(click_on(selector));
        h.advance(10);
    }
    let checkpoint = h
        .recorder
        .create_checkpoint(CheckpointOptions::named("after three"))
        .unwrap();
    assert_eq!(checkpoint.event_index, 3);

    h.recorder.record_click(click_on("#d"));
    let recording = h.recorder.stop_recording().unwrap();

    let stored = recording.checkpoint(&checkpoint.id).unwrap();
    assert_eq!(stored.event_index, 3);
    assert_eq!(recording.events[3].event_type, EventType::Checkpoint);

    let since = recording.events_since_checkpoint(&checkpoint.id).unwrap();
    assert_eq!(since.len(), 2);
}

#[test]
fn test_default_checkpoint_names() {
    let h = Harness::new(RecordingOptions::default());
    h.recorder.start_recording(StartOptions::default()).unwrap();

    let first = h.recorder.create_checkpoint(CheckpointOptions::default()).unwrap();
    let second = h.recorder.create_checkpoint(CheckpointOptions::default()).unwrap();
    assert_eq!(first.name, "Checkpoint 1");
    assert_eq!(second.name, "Checkpoint 2");
}

#[test]
fn test_max_events_notifies_once() {
    let h = Harness::new(RecordingOptions {
        max_events: 5,
        ..Default::default()
    });
    let seen = h.capture_notifications();
    h.recorder.start_recording(StartOptions::default()).unwrap();

    let accepted: Vec<bool> = (0..8)
        .map(|i| h.recorder.record_click(click_on(&format!("#b{}", i))))
        .collect();
    assert_eq!(accepted.iter().filter(|a| **a).count(), 5);

    let recording = h.recorder.stop_recording().unwrap();
    assert_eq!(recording.events.len(), 5);
    assert_eq!(recording.stats.total_events, 5);

    let seen = seen.lock();
    let reached = seen
        .iter()
        .filter(|n| matches!(n, RecorderNotification::MaxEventsReached { max_events: 5, .. }))
        .count();
    assert_eq!(reached, 1);
    assert!(h.recorder.status().max_events_reached);
}

#[test]
fn test_invalid_transitions() {
    let h = Harness::new(RecordingOptions::default());

    assert!(matches!(
        h.recorder.resume_recording(),
        Err(EngineError::InvalidState {
            current: RecorderState::Idle,
            ..
        })
    ));

    h.recorder.start_recording(StartOptions::default()).unwrap();
    assert!(matches!(
        h.recorder.resume_recording(),
        Err(EngineError::InvalidState {
            current: RecorderState::Recording,
            ..
        })
    ));

    h.recorder.pause_recording().unwrap();
    assert!(matches!(
        h.recorder.pause_recording(),
        Err(EngineError::InvalidState {
            current: RecorderState::Paused,
            ..
        })
    ));
    assert!(matches!(
        h.recorder.create_checkpoint(CheckpointOptions::default()),
        Err(EngineError::InvalidState { .. })
    ));
    assert!(matches!(
        h.recorder.add_annotation(AnnotationInput::note("while paused")),
        Err(EngineError::InvalidState { .. })
    ));

    h.recorder.stop_recording().unwrap();
    assert!(matches!(
        h.recorder.stop_recording(),
        Err(EngineError::InvalidState {
            current: RecorderState::Stopped,
            ..
        })
    ));
}

#[test]
fn test_restart_creates_new_recording() {
    let h = Harness::new(RecordingOptions::default());
    let first = h.recorder.start_recording(StartOptions::named("one")).unwrap();
    h.recorder.record_click(click_on("#x"));
    let finished = h.recorder.stop_recording().unwrap();

    let second = h.recorder.start_recording(StartOptions::named("two")).unwrap();
    assert_ne!(first.id, second.id);
    assert_eq!(h.recorder.status().event_count, 0);

    // The snapshot handed out on stop is unaffected
    assert_eq!(finished.events.len(), 1);
}

#[test]
fn test_annotations_live_and_post_hoc() {
    let h = Harness::new(RecordingOptions::default());
    h.recorder.start_recording(StartOptions::default()).unwrap();

    h.advance(120);
    let live = h
        .recorder
        .add_annotation(AnnotationInput::note("login slow"))
        .unwrap();
    assert_eq!(live.relative_time, 120);

    h.advance(80);
    let recording = h.recorder.stop_recording().unwrap();
    assert_eq!(recording.events.len(), 1);
    assert_eq!(recording.events[0].event_type, EventType::Annotation);

    let defaulted = h
        .recorder
        .add_annotation(AnnotationInput::note("review later"))
        .unwrap();
    assert_eq!(defaulted.relative_time, 200);

    let placed = h
        .recorder
        .add_annotation(AnnotationInput::note("here").at(42))
        .unwrap();
    assert_eq!(placed.relative_time, 42);

    let after = h.recorder.recording().unwrap();
    assert_eq!(after.annotations.len(), 3);
    assert_eq!(after.events.len(), 1);
    assert_eq!(after.hash, recording.hash);
}

#[test]
fn test_auto_checkpoints_suspended_while_paused() {
    let h = Harness::new(RecordingOptions {
        auto_checkpoint_interval_ms: Some(1_000),
        ..Default::default()
    });
    h.recorder.start_recording(StartOptions::default()).unwrap();

    h.advance(2_500);
    assert_eq!(h.recorder.status().checkpoint_count, 2);

    h.recorder.pause_recording().unwrap();
    h.advance(5_000);
    assert_eq!(h.recorder.status().checkpoint_count, 2);

    h.recorder.resume_recording().unwrap();
    h.advance(1_000);

    let recording = h.recorder.stop_recording().unwrap();
    let names: Vec<&str> = recording.checkpoints.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Auto checkpoint 1", "Auto checkpoint 2", "Auto checkpoint 3"]);
    assert_eq!(recording.checkpoints[2].relative_time, 3_500);
    assert_eq!(h.scheduler.pending(), 0);
}

#[test]
fn test_unsubscribe_stops_delivery() {
    let h = Harness::new(RecordingOptions::default());
    let count = Arc::new(Mutex::new(0usize));
    let sink = Arc::clone(&count);
    let subscription = h.recorder.subscribe(move |_| *sink.lock() += 1);

    h.recorder.start_recording(StartOptions::default()).unwrap();
    assert_eq!(*count.lock(), 1);

    assert!(h.recorder.unsubscribe(subscription));
    h.recorder.record_click(click_on("#x"));
    assert_eq!(*count.lock(), 1);
    assert!(!h.recorder.unsubscribe(subscription));
}

#[test]
fn test_handlers_may_reenter_recorder() {
    let h = Harness::new(RecordingOptions::default());
    let observer = h.recorder.clone();
    let counts = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&counts);
    h.recorder.subscribe(move |n| {
        if let RecorderNotification::EventRecorded { .. } = n {
            sink.lock().push(observer.status().event_count);
        }
    });

    h.recorder.start_recording(StartOptions::default()).unwrap();
    h.recorder.record_click(click_on("#a"));
    h.recorder.record_click(click_on("#b"));

    assert_eq!(*counts.lock(), vec![1, 2]);
}

#[test]
fn test_notification_channel() {
    let h = Harness::new(RecordingOptions::default());
    let (_subscription, mut rx) = h.recorder.notifications();

    let handle = h.recorder.start_recording(StartOptions::named("chan")).unwrap();
    h.recorder.record_navigation(NavigationInput::to("https://example.com/"));

    match rx.try_recv().unwrap() {
        RecorderNotification::RecordingStarted { recording_id, name, .. } => {
            assert_eq!(recording_id, handle.id);
            assert_eq!(name, "chan");
        }
        other => panic!("unexpected notification {}", other.name()),
    }
    assert!(matches!(
        rx.try_recv().unwrap(),
        RecorderNotification::EventRecorded { .. }
    ));
}

#[test]
fn test_timeline_paging() {
    let h = Harness::new(RecordingOptions::default());
    h.recorder.start_recording(StartOptions::default()).unwrap();
    for i in 0..25 {
        h.recorder.record_click(click_on(&format!("#row{}", i)));
        h.advance(10);
    }

    let page = h
        .recorder
        .timeline(&TimelineQuery {
            offset: 20,
            limit: 10,
            ..Default::default()
        })
        .unwrap();
    assert_eq!(page.total, 25);
    assert_eq!(page.events.len(), 5);
    assert!(!page.has_more);

    let window = h
        .recorder
        .timeline(&TimelineQuery {
            start_time: Some(50),
            end_time: Some(90),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(window.total, 5);
    assert_eq!(h.recorder.stats().unwrap().count(EventType::Click), 25);
}

#[test]
fn test_disabled_flags_are_noops() {
    let h = Harness::new(RecordingOptions::minimal());
    h.recorder.start_recording(StartOptions::default()).unwrap();

    assert!(!h.recorder.record_mouse_move(PointerInput::at(1.0, 1.0)));
    assert!(!h.recorder.record_scroll(ScrollInput::to(0.0, 1.0)));
    assert!(h.recorder.record_key_press(KeyInput::new("a", "KeyA")));
    assert_eq!(h.scheduler.pending(), 0);
    assert_eq!(h.recorder.status().event_count, 1);
}

#[derive(Debug, Clone)]
enum Step {
    Advance(u64),
    Click,
    Move(f64),
    Scroll(f64),
    TogglePause,
    Checkpoint,
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (0u64..250).prop_map(Step::Advance),
        Just(Step::Click),
        (0.0f64..1000.0).prop_map(Step::Move),
        (0.0f64..5000.0).prop_map(Step::Scroll),
        Just(Step::TogglePause),
        Just(Step::Checkpoint),
    ]
}

proptest! {
    #[test]
    fn prop_relative_time_never_decreases(steps in proptest::collection::vec(step(), 1..80)) {
        let h = Harness::new(RecordingOptions {
            auto_checkpoint_interval_ms: Some(300),
            ..Default::default()
        });
        h.recorder.start_recording(StartOptions::default()).unwrap();

        for step in steps {
            match step {
                Step::Advance(ms) => h.advance(ms),
                Step::Click => {
                    h.recorder.record_click(click_on("#p"));
                }
                Step::Move(x) => {
                    h.recorder.record_mouse_move(PointerInput::at(x, x));
                }
                Step::Scroll(y) => {
                    h.recorder.record_scroll(ScrollInput::to(0.0, y));
                }
                Step::TogglePause => {
                    if h.recorder.state() == RecorderState::Paused {
                        h.recorder.resume_recording().unwrap();
                    } else {
                        h.recorder.pause_recording().unwrap();
                    }
                }
                Step::Checkpoint => {
                    let _ = h.recorder.create_checkpoint(CheckpointOptions::default());
                }
            }
        }

        let recording = h.recorder.stop_recording().unwrap();
        prop_assert!(recording
            .events
            .windows(2)
            .all(|w| w[0].relative_time <= w[1].relative_time));
        for pair in recording.events.windows(2) {
            prop_assert_eq!(pair[1].time_delta, pair[1].relative_time - pair[0].relative_time);
        }

        let duration = recording.duration.unwrap();
        prop_assert_eq!(
            duration as i64,
            recording.end_time.unwrap() - recording.start_time - recording.total_pause_duration as i64
        );
        prop_assert!(recording.events.last().map_or(true, |e| e.relative_time <= duration));
        prop_assert_eq!(h.scheduler.pending(), 0);
    }
}
