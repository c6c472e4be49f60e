//! End-to-end schedule scenario against the simulated hardware port.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use pillbox_core::Pin;
use pillbox_core::constants::{SERVO_CLOSED_DUTY_PERCENT, SERVO_OPEN_DUTY_PERCENT};
use pillbox_devices::DispenseActuator;
use pillbox_engine::{ManualClock, RecordingNotifier, ScheduleEngine};
use pillbox_hardware::{AnyHardwarePort, SimPort, shared};
use pillbox_storage::{Database, ScheduleEntry, ScheduleRepository, SqliteScheduleRepository};
use std::time::Duration;

fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 8, 27)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
}

/// A morning with one 08:00 dose, stepped from 07:59 to 08:01 in
/// 30-second ticks: the dose dispenses exactly once, on the 08:00 tick.
#[tokio::test]
async fn test_morning_dose_fires_exactly_once() {
    let db = Database::in_memory().await.unwrap();
    let repo = SqliteScheduleRepository::new(db.pool().clone());
    repo.create(&ScheduleEntry::new(
        1,
        NaiveDate::from_ymd_opt(2026, 8, 27).unwrap(),
        NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
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
    let clock = ManualClock::new(at(7, 59, 0));
    let mut engine = ScheduleEngine::new(repo, notifier.clone(), clock.clone(), actuator);

    // 07:59:00, 07:59:30, 08:00:00, 08:00:30, 08:01:00
    let mut dispenses_per_tick = Vec::new();
    for _ in 0..5 {
        engine.tick().await.unwrap();
        dispenses_per_tick.push(handle.pwm_history().len() / 3);
        clock.advance(Duration::from_secs(30));
    }

    // Nothing before 08:00, one dispense at 08:00, nothing after.
    assert_eq!(dispenses_per_tick, vec![0, 0, 1, 1, 1]);
    assert_eq!(notifier.sent().len(), 1);
    assert_eq!(notifier.sent()[0].title, "Pill Reminder");
    assert_eq!(notifier.sent()[0].message, "Time to take your medication!");

    // The single cycle ran open, closed, clear.
    let duties: Vec<_> = handle
        .pwm_history()
        .into_iter()
        .map(|c| c.duty_percent)
        .collect();
    assert_eq!(
        duties,
        vec![
            Some(SERVO_OPEN_DUTY_PERCENT),
            Some(SERVO_CLOSED_DUTY_PERCENT),
            None
        ]
    );
}

/// Two doses in the same evaluation window both fire on the same tick,
/// sequentially (the actuator serializes cycles).
#[tokio::test]
async fn test_two_doses_same_window_both_dispense() {
    let db = Database::in_memory().await.unwrap();
    let repo = SqliteScheduleRepository::new(db.pool().clone());
    for minute in [0, 0] {
        repo.create(&ScheduleEntry::new(
            1,
            NaiveDate::from_ymd_opt(2026, 8, 27).unwrap(),
            NaiveTime::from_hms_opt(8, minute, 0).unwrap(),
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
    let clock = ManualClock::new(at(8, 0, 15));
    let mut engine = ScheduleEngine::new(repo, notifier.clone(), clock, actuator);

    engine.tick().await.unwrap();
    assert_eq!(notifier.sent().len(), 2);
    assert_eq!(handle.pwm_history().len(), 6);
}

/// Entries for other days never fire, whatever the time of day.
#[tokio::test]
async fn test_other_day_entries_ignored() {
    let db = Database::in_memory().await.unwrap();
    let repo = SqliteScheduleRepository::new(db.pool().clone());
    repo.create(&ScheduleEntry::new(
        1,
        NaiveDate::from_ymd_opt(2026, 8, 28).unwrap(),
        NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
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
    let clock = ManualClock::new(at(8, 0, 0));
    let mut engine = ScheduleEngine::new(repo, notifier.clone(), clock, actuator);

    engine.tick().await.unwrap();
    assert!(notifier.sent().is_empty());
    assert!(handle.pwm_history().is_empty());
}
