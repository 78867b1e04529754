// src/recording/notifications.rs
//! Recorder notifications and subscriptions

use crate::recording::checkpoint::{Annotation, RecordingCheckpoint};
use crate::recording::event::InteractionEvent;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// Something observable happened in the recorder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum RecorderNotification {
    RecordingStarted {
        recording_id: String,
        name: String,
        start_time: i64,
    },
    RecordingStopped {
        recording_id: String,
        duration: u64,
        event_count: usize,
        hash: Option<String>,
    },
    RecordingPaused {
        recording_id: String,
        relative_time: u64,
    },
    RecordingResumed {
        recording_id: String,
        paused_for: u64,
    },
    EventRecorded {
        event: InteractionEvent,
    },
    CheckpointCreated {
        checkpoint: RecordingCheckpoint,
    },
    AnnotationAdded {
        annotation: Annotation,
    },
    MaxEventsReached {
        recording_id: String,
        max_events: usize,
    },
}

impl RecorderNotification {
    pub fn name(&self) -> &'static str {
        match self {
            RecorderNotification::RecordingStarted { .. } => "recordingStarted",
            RecorderNotification::RecordingStopped { .. } => "recordingStopped",
            RecorderNotification::RecordingPaused { .. } => "recordingPaused",
            RecorderNotification::RecordingResumed { .. } => "recordingResumed",
            RecorderNotification::EventRecorded { .. } => "eventRecorded",
            RecorderNotification::CheckpointCreated { .. } => "checkpointCreated",
            RecorderNotification::AnnotationAdded { .. } => "annotationAdded",
            RecorderNotification::MaxEventsReached { .. } => "maxEventsReached",
        }
    }
}

/// Notification handler
pub type Handler = Arc<dyn Fn(&RecorderNotification) + Send + Sync>;

/// Token returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

/// Fan-out of notifications to registered handlers
#[derive(Default)]
pub struct NotificationHub {
    handlers: RwLock<Vec<(u64, Handler)>>,
    next_id: AtomicU64,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&RecorderNotification) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.handlers.write().push((id, Arc::new(handler)));
        Subscription(id)
    }

    /// Returns false if the subscription was already removed
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        let mut handlers = self.handlers.write();
        let before = handlers.len();
        handlers.retain(|(id, _)| *id != subscription.0);
        handlers.len() != before
    }

    /// Forward notifications into an unbounded channel
    ///
    /// The subscription is dropped automatically on the first send after the
    /// receiver goes away.
    pub fn channel(self: &Arc<Self>) -> (Subscription, mpsc::UnboundedReceiver<RecorderNotification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let hub = Arc::downgrade(self);
        let slot: Arc<RwLock<Option<Subscription>>> = Arc::new(RwLock::new(None));
        let own = Arc::clone(&slot);

        let subscription = self.subscribe(move |notification| {
            if tx.send(notification.clone()).is_err() {
                if let (Some(hub), Some(subscription)) = (hub.upgrade(), *own.read()) {
                    hub.unsubscribe(subscription);
                }
            }
        });
        *slot.write() = Some(subscription);

        (subscription, rx)
    }

    /// Deliver to every handler registered at call time
    ///
    /// Handlers run outside the registry lock, so they may subscribe or
    /// unsubscribe.
    pub fn publish(&self, notification: &RecorderNotification) {
        let handlers: Vec<Handler> = self
            .handlers
            .read()
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();

        debug!(
            "Publishing {} to {} handler(s)",
            notification.name(),
            handlers.len()
        );
        for handler in handlers {
            handler(notification);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn paused() -> RecorderNotification {
        RecorderNotification::RecordingPaused {
            recording_id: "rec_1".to_string(),
            relative_time: 50,
        }
    }

    #[test]
    fn test_subscribe_and_unsubscribe() {
        let hub = NotificationHub::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        let subscription = hub.subscribe(move |n| sink.lock().push(n.name()));

        hub.publish(&paused());
        assert!(hub.unsubscribe(subscription));
        assert!(!hub.unsubscribe(subscription));
        hub.publish(&paused());

        assert_eq!(*seen.lock(), vec!["recordingPaused"]);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn test_serialized_shape() {
        let value = serde_json::to_value(paused()).unwrap();
        assert_eq!(value["type"], "recordingPaused");
        assert_eq!(value["recordingId"], "rec_1");
        assert_eq!(value["relativeTime"], 50);
    }

    #[tokio::test]
    async fn test_channel_delivery() {
        let hub = Arc::new(NotificationHub::new());
        let (_subscription, mut rx) = hub.channel();

        hub.publish(&paused());
        assert_eq!(rx.recv().await, Some(paused()));

        drop(rx);
        hub.publish(&paused());
        assert_eq!(hub.subscriber_count(), 0);
    }
}
