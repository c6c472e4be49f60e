//! Control loops for the Pillbox dispenser.
//!
//! Two independent periodic loops drive the device:
//!
//! - [`ScheduleEngine`] - evaluates the dose schedule every 30 s and, for
//!   each entry inside its due window, delivers a reminder and runs one
//!   dispense cycle. Each entry fires exactly once per process lifetime.
//! - [`SensorMonitor`] - samples the range and climate sensors every 2 s
//!   and publishes [`SensorEvent`] snapshots over an mpsc channel.
//!
//! Both loops take a `watch::Receiver<bool>` shutdown signal and always
//! finish the tick in progress before exiting, so shutdown never leaves a
//! dispense half-done.
//!
//! Time and notification delivery sit behind the [`Clock`] and [`Notifier`]
//! traits so tests can step through a schedule deterministically.

#![allow(async_fn_in_trait)]

pub mod clock;
pub mod error;
pub mod monitor;
pub mod notify;
pub mod scheduler;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{EngineError, EngineResult};
pub use monitor::{SensorEvent, SensorMonitor};
pub use notify::{LogNotifier, Notification, Notifier, RecordingNotifier};
pub use scheduler::ScheduleEngine;
