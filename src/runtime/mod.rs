// src/runtime/mod.rs
//! Time and timer capabilities injected into the recorder
//!
//! - **Clock**: wall-clock source (`SystemClock`, or `ManualClock` for tests)
//! - **Scheduler**: one-shot delayed tasks (`TokioScheduler`, or
//!   `ManualScheduler` driven by virtual time)
//!
//! # Architecture
//!
//! ```text
//! Recorder ── schedule(delay, task) ──▶ Scheduler ── fires ──▶ task()
//!    │                                      │                     │
//!    └──── cancel(handle) ─────────────────▶┘      Weak<Recorder>─┘
//! ```

pub mod clock;
pub mod scheduler;

pub use clock::{Clock, ManualClock, SystemClock};
pub use scheduler::{ManualScheduler, Scheduler, Task, TimerHandle, TokioScheduler};
