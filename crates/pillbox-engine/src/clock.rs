//! Clock abstraction for the schedule engine.
//!
//! Schedules are wall-clock local times ("take the 08:00 dose"), so the
//! engine works in naive local time rather than UTC. The trait exists so
//! tests can step a [`ManualClock`] through a morning in 30-second
//! increments without sleeping.

use chrono::{Local, NaiveDateTime};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Source of the current local date-time.
pub trait Clock: Send + Sync {
    /// Current local date-time.
    fn now(&self) -> NaiveDateTime;
}

/// Production clock backed by the system's local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Manually driven clock for tests.
///
/// Clones share the same instant, so a clock handed to an engine can still
/// be advanced from the test body.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<NaiveDateTime>>,
}

impl ManualClock {
    /// Create a clock frozen at the given instant.
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Jump to a specific instant.
    pub fn set(&self, instant: NaiveDateTime) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = instant;
    }

    /// Advance the clock by a duration.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += chrono::Duration::from_std(by).unwrap_or(chrono::Duration::zero());
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 8, 27)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new(at(7, 59, 0));
        clock.advance(Duration::from_secs(30));
        assert_eq!(clock.now(), at(7, 59, 30));
    }

    #[test]
    fn test_manual_clock_clones_share_time() {
        let clock = ManualClock::new(at(8, 0, 0));
        let other = clock.clone();
        clock.advance(Duration::from_secs(60));
        assert_eq!(other.now(), at(8, 1, 0));
    }
}
