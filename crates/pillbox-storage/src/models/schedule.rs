use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// One planned dose: a user, a calendar date, and a wall-clock time.
///
/// Date and time are stored separately (both as ISO-8601 TEXT in SQLite)
/// because schedules are entered and queried per calendar day. The schedule
/// engine combines them into a local [`NaiveDateTime`] via [`fires_at`]
/// when deciding whether a dose is due.
///
/// [`fires_at`]: ScheduleEntry::fires_at
///
/// # Examples
///
/// ```
/// use pillbox_storage::models::ScheduleEntry;
/// use chrono::{NaiveDate, NaiveTime};
///
/// let date = NaiveDate::from_ymd_opt(2026, 8, 27).unwrap();
/// let time = NaiveTime::from_hms_opt(8, 0, 0).unwrap();
/// let entry = ScheduleEntry::new(1, date, time);
///
/// assert_eq!(entry.fires_at(), date.and_time(time));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ScheduleEntry {
    /// Auto-increment primary key
    pub id: i64,

    /// Owning user id
    pub user_id: i64,

    /// Calendar date the dose is planned for
    pub scheduled_date: NaiveDate,

    /// Wall-clock time of day the dose is planned for
    pub scheduled_time: NaiveTime,

    /// Record creation timestamp
    pub created_at: DateTime<Utc>,
}

impl ScheduleEntry {
    /// Create a new unpersisted entry. The id is assigned on insert.
    pub fn new(user_id: i64, scheduled_date: NaiveDate, scheduled_time: NaiveTime) -> Self {
        Self {
            id: 0,
            user_id,
            scheduled_date,
            scheduled_time,
            created_at: Utc::now(),
        }
    }

    /// The local date-time at which this entry fires.
    pub fn fires_at(&self) -> NaiveDateTime {
        self.scheduled_date.and_time(self.scheduled_time)
    }
}
