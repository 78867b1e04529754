// src/recording/coalescer.rs
//! Single-slot coalescing buffer for high-frequency samples
//!
//! Each offered sample overwrites the slot; only the most recent sample in a
//! throttle window becomes an event. Intermediate samples are discarded.

use crate::recording::capture::CaptureContext;
use crate::recording::event::{EventData, EventType};
use crate::runtime::TimerHandle;
use serde::{Deserialize, Serialize};

/// A sample waiting for its throttle window to close
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSample {
    pub data: EventData,
    pub context: CaptureContext,

    /// Capture time of this sample
    pub timestamp: i64,
    pub relative_time: u64,
}

/// Coalescing buffer for one event type
#[derive(Debug)]
pub struct CoalescingBuffer {
    kind: EventType,
    slot: Option<PendingSample>,

    /// Outstanding flush timer and the token it was armed with
    timer: Option<(u64, TimerHandle)>,

    received: u64,
    emitted: u64,
    discarded: u64,
}

impl CoalescingBuffer {
    pub fn new(kind: EventType) -> Self {
        Self {
            kind,
            slot: None,
            timer: None,
            received: 0,
            emitted: 0,
            discarded: 0,
        }
    }

    pub fn kind(&self) -> EventType {
        self.kind
    }

    /// Store a sample; returns true if it replaced an earlier one
    pub fn offer(&mut self, sample: PendingSample) -> bool {
        self.received += 1;
        let replaced = self.slot.replace(sample).is_some();
        if replaced {
            self.discarded += 1;
        }
        replaced
    }

    /// Remove the buffered sample for emission
    pub fn take(&mut self) -> Option<PendingSample> {
        let sample = self.slot.take();
        if sample.is_some() {
            self.emitted += 1;
        }
        sample
    }

    /// Drop the buffered sample without emitting it
    pub fn discard(&mut self) -> bool {
        let dropped = self.slot.take().is_some();
        if dropped {
            self.discarded += 1;
        }
        dropped
    }

    pub fn peek_relative(&self) -> Option<u64> {
        self.slot.as_ref().map(|s| s.relative_time)
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }

    pub fn is_armed(&self) -> bool {
        self.timer.is_some()
    }

    pub fn arm(&mut self, token: u64, handle: TimerHandle) {
        self.timer = Some((token, handle));
    }

    /// Forget the outstanding timer, returning its handle for cancellation
    pub fn disarm(&mut self) -> Option<TimerHandle> {
        self.timer.take().map(|(_, handle)| handle)
    }

    /// Whether `token` belongs to the currently armed timer
    pub fn owns_timer(&self, token: u64) -> bool {
        matches!(self.timer, Some((armed, _)) if armed == token)
    }

    pub fn stats(&self) -> CoalescerStats {
        CoalescerStats {
            received: self.received,
            emitted: self.emitted,
            discarded: self.discarded,
            pending: self.slot.is_some(),
        }
    }
}

/// Sample counters for one buffer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoalescerStats {
    pub received: u64,
    pub emitted: u64,
    pub discarded: u64,
    pub pending: bool,
}
