//! Dose schedule evaluation loop.
//!
//! Every tick the engine loads the entries for each calendar date the
//! tolerance window touches (today, plus yesterday in the first moments
//! after midnight) and fires the ones whose time has arrived. "Arrived"
//! means the current time is at or past the entry's time but no more than
//! the tolerance window past it, so a tick landing up to a minute late
//! still dispenses, while an entry missed by more than the window stays
//! missed rather than firing hours later.
//!
//! Fired entries are tracked in memory for the process lifetime. The tick
//! interval (30 s) is less than half the tolerance window (60 s), so every
//! entry gets at least one tick inside its window and the fired set
//! guarantees it dispenses exactly once. An entry is only marked fired
//! after its dispense cycle succeeds; a busy or failed actuator leaves it
//! unmarked so the next tick retries while the window is still open.

use crate::clock::Clock;
use crate::error::EngineResult;
use crate::notify::{Notification, Notifier};
use pillbox_core::constants::{SCHEDULE_TICK_INTERVAL, SCHEDULE_TOLERANCE_SECS};
use pillbox_devices::DispenseActuator;
use pillbox_storage::{ScheduleEntry, ScheduleRepository};
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Periodic schedule evaluator that notifies and dispenses due doses.
pub struct ScheduleEngine<R, N, C> {
    repo: R,
    notifier: N,
    clock: C,
    actuator: DispenseActuator,
    tick_interval: Duration,
    tolerance_secs: i64,
    fired: HashSet<i64>,
}

impl<R, N, C> ScheduleEngine<R, N, C>
where
    R: ScheduleRepository,
    N: Notifier,
    C: Clock,
{
    /// Create an engine with the default cadence (30 s tick, 60 s window).
    pub fn new(repo: R, notifier: N, clock: C, actuator: DispenseActuator) -> Self {
        Self {
            repo,
            notifier,
            clock,
            actuator,
            tick_interval: SCHEDULE_TICK_INTERVAL,
            tolerance_secs: SCHEDULE_TOLERANCE_SECS,
            fired: HashSet::new(),
        }
    }

    /// Set a custom tick interval.
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Set a custom tolerance window in seconds.
    pub fn with_tolerance_secs(mut self, tolerance_secs: i64) -> Self {
        self.tolerance_secs = tolerance_secs;
        self
    }

    /// Whether an entry is inside its due window at `now` and not yet fired.
    fn is_due(&self, entry: &ScheduleEntry, now: chrono::NaiveDateTime) -> bool {
        if self.fired.contains(&entry.id) {
            return false;
        }
        let late_by = now.signed_duration_since(entry.fires_at()).num_seconds();
        (0..=self.tolerance_secs).contains(&late_by)
    }

    /// Evaluate the schedule once.
    ///
    /// # Errors
    ///
    /// Propagates storage failures. A dispense failure leaves the entry
    /// unmarked so the next tick retries it; the notification is only
    /// requested after a successful dispense, keeping it at most once per
    /// fired entry.
    pub async fn tick(&mut self) -> EngineResult<()> {
        let now = self.clock.now();
        let window_start = now - chrono::TimeDelta::seconds(self.tolerance_secs);

        let mut entries = self.repo.find_for_date(now.date()).await?;
        // A window straddling midnight still covers the tail of yesterday.
        if window_start.date() != now.date() {
            entries.extend(self.repo.find_for_date(window_start.date()).await?);
        }

        for entry in &entries {
            if !self.is_due(entry, now) {
                continue;
            }
            info!(
                entry_id = entry.id,
                user_id = entry.user_id,
                scheduled = %entry.fires_at(),
                "dose due, dispensing"
            );

            if let Err(e) = self.actuator.dispense().await {
                warn!(entry_id = entry.id, error = %e, "dispense failed, retrying next tick");
                continue;
            }
            self.fired.insert(entry.id);
            if let Err(e) = self.notifier.notify(&Notification::dose_reminder(entry)).await {
                warn!(entry_id = entry.id, error = %e, "reminder delivery failed");
            }
        }

        debug!(
            checked = entries.len(),
            fired_total = self.fired.len(),
            "schedule tick complete"
        );
        Ok(())
    }

    /// Run the evaluation loop until shutdown is signalled.
    ///
    /// A tick already in progress always completes before the loop exits,
    /// so shutdown never interrupts a dispense mid-cycle.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(interval = ?self.tick_interval, "schedule engine started");
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.tick().await {
                        warn!(error = %e, "schedule tick failed");
                    }
                }
                _ = shutdown.changed() => {
                    info!("schedule engine stopping");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::notify::RecordingNotifier;
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
    use pillbox_core::Pin;
    use pillbox_hardware::{AnyHardwarePort, SimPort, SimPortHandle, shared};
    use pillbox_storage::{Database, SqliteScheduleRepository};

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 8, 27)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    async fn setup(
        entry_times: &[(u32, u32)],
        start: NaiveDateTime,
    ) -> (
        ScheduleEngine<SqliteScheduleRepository, RecordingNotifier, ManualClock>,
        RecordingNotifier,
        ManualClock,
        SimPortHandle,
        DispenseActuator,
    ) {
        let db = Database::in_memory().await.unwrap();
        let repo = SqliteScheduleRepository::new(db.pool().clone());
        for (h, m) in entry_times {
            repo.create(&ScheduleEntry::new(
                1,
                NaiveDate::from_ymd_opt(2026, 8, 27).unwrap(),
                NaiveTime::from_hms_opt(*h, *m, 0).unwrap(),
            ))
            .await
            .unwrap();
        }

        let (sim, handle) = SimPort::new();
        let actuator = DispenseActuator::new(
            shared(AnyHardwarePort::Sim(sim)),
            Pin::new(18).unwrap(),
        )
        .with_settle(Duration::from_millis(2));

        let notifier = RecordingNotifier::new();
        let clock = ManualClock::new(start);
        let engine =
            ScheduleEngine::new(repo, notifier.clone(), clock.clone(), actuator.clone());
        (engine, notifier, clock, handle, actuator)
    }

    #[tokio::test]
    async fn test_entry_before_its_time_does_not_fire() {
        let (mut engine, notifier, _clock, handle, _actuator) = setup(&[(8, 0)], at(7, 59, 0)).await;

        engine.tick().await.unwrap();
        assert!(notifier.sent().is_empty());
        assert!(handle.pwm_history().is_empty());
    }

    #[tokio::test]
    async fn test_due_entry_notifies_and_dispenses_once() {
        let (mut engine, notifier, _clock, handle, _actuator) = setup(&[(8, 0)], at(8, 0, 10)).await;

        engine.tick().await.unwrap();
        assert_eq!(notifier.sent().len(), 1);
        assert_eq!(notifier.sent()[0].title, "Pill Reminder");
        // One full servo cycle: open, closed, clear.
        assert_eq!(handle.pwm_history().len(), 3);

        // The same entry never fires again.
        engine.tick().await.unwrap();
        assert_eq!(notifier.sent().len(), 1);
        assert_eq!(handle.pwm_history().len(), 3);
    }

    #[tokio::test]
    async fn test_entry_past_tolerance_window_stays_missed() {
        let (mut engine, notifier, _clock, handle, _actuator) = setup(&[(8, 0)], at(8, 1, 1)).await;

        engine.tick().await.unwrap();
        assert!(notifier.sent().is_empty());
        assert!(handle.pwm_history().is_empty());
    }

    #[tokio::test]
    async fn test_entry_at_tolerance_edge_fires() {
        let (mut engine, notifier, _clock, _handle, _actuator) = setup(&[(8, 0)], at(8, 1, 0)).await;

        engine.tick().await.unwrap();
        assert_eq!(notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_multiple_due_entries_all_fire() {
        let (mut engine, notifier, _clock, _handle, _actuator) =
            setup(&[(8, 0), (8, 0)], at(8, 0, 30)).await;

        engine.tick().await.unwrap();
        assert_eq!(notifier.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_busy_actuator_retried_on_next_tick() {
        let (mut engine, notifier, _clock, handle, actuator) =
            setup(&[(8, 0)], at(8, 0, 10)).await;

        // Occupy the actuator so the tick's dispense is rejected busy.
        let blocker = actuator.clone().with_settle(Duration::from_millis(80));
        let block_task = tokio::spawn(async move { blocker.dispense().await });
        tokio::time::sleep(Duration::from_millis(10)).await;

        engine.tick().await.unwrap();
        // Not fired, not notified; entry stays eligible.
        assert!(notifier.sent().is_empty());

        block_task.await.unwrap().unwrap();
        engine.tick().await.unwrap();
        assert_eq!(notifier.sent().len(), 1);
        // Two complete cycles total: the blocker's and the engine's.
        assert_eq!(handle.pwm_history().len(), 6);
    }

    #[tokio::test]
    async fn test_window_crossing_midnight_fires_previous_day_entry() {
        let db = Database::in_memory().await.unwrap();
        let repo = SqliteScheduleRepository::new(db.pool().clone());
        repo.create(&ScheduleEntry::new(
            1,
            NaiveDate::from_ymd_opt(2026, 8, 27).unwrap(),
            NaiveTime::from_hms_opt(23, 59, 45).unwrap(),
        ))
        .await
        .unwrap();

        let (sim, handle) = SimPort::new();
        let actuator = DispenseActuator::new(
            shared(AnyHardwarePort::Sim(sim)),
            Pin::new(18).unwrap(),
        )
        .with_settle(Duration::from_millis(2));
        let notifier = RecordingNotifier::new();
        // 30 s past the entry, 15 s past midnight: still inside the window.
        let clock = ManualClock::new(
            NaiveDate::from_ymd_opt(2026, 8, 28)
                .unwrap()
                .and_hms_opt(0, 0, 15)
                .unwrap(),
        );
        let mut engine = ScheduleEngine::new(repo, notifier.clone(), clock, actuator);

        engine.tick().await.unwrap();
        assert_eq!(notifier.sent().len(), 1);
        assert_eq!(handle.pwm_history().len(), 3);

        // Still exactly once on the following tick.
        engine.tick().await.unwrap();
        assert_eq!(notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_run_loop_stops_on_shutdown() {
        let (engine, _notifier, _clock, _handle, _actuator) = setup(&[], at(8, 0, 0)).await;
        let engine = engine.with_tick_interval(Duration::from_millis(5));

        let (tx, rx) = watch::channel(false);
        let task = tokio::spawn(engine.run(rx));

        tokio::time::sleep(Duration::from_millis(20)).await;
        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("engine did not stop")
            .unwrap();
    }
}
