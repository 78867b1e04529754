// src/runtime/scheduler.rs
//! One-shot timer scheduling
//!
//! The recorder never sleeps itself. Coalescing flushes and auto-checkpoints
//! are handed to a `Scheduler`, which runs the task once after the delay
//! unless the returned handle is cancelled first.

use crate::runtime::clock::{Clock, ManualClock};
use crate::utils::errors::{EngineError, Result};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::debug;

/// Deferred unit of work
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Handle identifying a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    /// Wrap an ID issued by a custom scheduler
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Timer capability
pub trait Scheduler: Send + Sync {
    /// Run `task` once after `delay`
    fn schedule(&self, delay: Duration, task: Task) -> TimerHandle;

    /// Cancel a pending task; returns false if it already ran or was cancelled
    fn cancel(&self, handle: TimerHandle) -> bool;

    /// Number of tasks still pending
    fn pending(&self) -> usize;
}

/// Scheduler backed by tokio timers
pub struct TokioScheduler {
    runtime: Handle,
    tasks: Arc<Mutex<HashMap<u64, JoinHandle<()>>>>,
    next_id: AtomicU64,
}

impl TokioScheduler {
    /// Create a scheduler spawning onto the given runtime
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            tasks: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(1),
        }
    }

    /// Create a scheduler for the runtime of the calling context
    pub fn from_current() -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| {
            EngineError::RuntimeError(format!("No tokio runtime available: {}", e))
        })?;
        Ok(Self::new(runtime))
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: Task) -> TimerHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let tasks = Arc::clone(&self.tasks);

        // Hold the map lock across spawn so the task cannot remove itself
        // before it has been inserted
        let mut guard = self.tasks.lock();
        let join = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if tasks.lock().remove(&id).is_some() {
                task();
            }
        });
        guard.insert(id, join);

        TimerHandle(id)
    }

    fn cancel(&self, handle: TimerHandle) -> bool {
        match self.tasks.lock().remove(&handle.0) {
            Some(join) => {
                join.abort();
                true
            }
            None => false,
        }
    }

    fn pending(&self) -> usize {
        self.tasks.lock().len()
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, join) in self.tasks.lock().drain() {
            join.abort();
        }
    }
}

/// Virtual-time scheduler for deterministic tests
///
/// Tasks fire only from [`ManualScheduler::advance`], which moves the shared
/// [`ManualClock`] to each task's due time before running it.
pub struct ManualScheduler {
    clock: Arc<ManualClock>,
    queue: Mutex<BTreeMap<(i64, u64), Task>>,
    due_times: Mutex<HashMap<u64, i64>>,
    next_id: AtomicU64,
}

impl ManualScheduler {
    pub fn new(clock: Arc<ManualClock>) -> Self {
        Self {
            clock,
            queue: Mutex::new(BTreeMap::new()),
            due_times: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Shared clock driven by this scheduler
    pub fn clock(&self) -> Arc<ManualClock> {
        Arc::clone(&self.clock)
    }

    /// Advance virtual time by `ms`, firing due tasks in order
    ///
    /// Tasks scheduled by a firing task are honoured if they fall inside the
    /// window. Returns the number of tasks fired.
    pub fn advance(&self, ms: u64) -> usize {
        let target = self.clock.now_ms() + ms as i64;
        let mut fired = 0;

        loop {
            // Never run a task while holding the queue lock
            let next = {
                let mut queue = self.queue.lock();
                let key = match queue.keys().next() {
                    Some(&key) if key.0 <= target => key,
                    _ => break,
                };
                queue.remove(&key).map(|task| (key, task))
            };

            if let Some(((due, id), task)) = next {
                self.due_times.lock().remove(&id);
                if due > self.clock.now_ms() {
                    self.clock.set(due);
                }
                debug!("Firing virtual timer {} at {}", id, due);
                task();
                fired += 1;
            }
        }

        self.clock.set(target);
        fired
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: Task) -> TimerHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let due = self.clock.now_ms() + delay.as_millis() as i64;

        self.queue.lock().insert((due, id), task);
        self.due_times.lock().insert(id, due);

        TimerHandle(id)
    }

    fn cancel(&self, handle: TimerHandle) -> bool {
        let due = match self.due_times.lock().remove(&handle.0) {
            Some(due) => due,
            None => return false,
        };
        self.queue.lock().remove(&(due, handle.0)).is_some()
    }

    fn pending(&self) -> usize {
        self.queue.lock().len()
    }
}
