//! Storage layer for the Pillbox dispenser.
//!
//! SQLite-backed persistence for the pill schedule, behind a repository
//! trait so the schedule engine can run against an in-memory fake in tests.
//!
//! # Architecture
//!
//! - [`Database`] - Connection pool manager with automatic migrations
//! - [`ScheduleRepository`] - Data access trait for schedule entries
//! - [`SqliteScheduleRepository`] - The production implementation
//!
//! Schedule entries are append-and-delete: a dose is planned or it is
//! removed, never edited in place. Fired state is not persisted here — the
//! engine tracks it in memory for the current process, so a restart will
//! re-arm any dose still inside its due window.
//!
//! # Examples
//!
//! ```no_run
//! use pillbox_storage::{Database, DatabaseConfig, ScheduleRepository, SqliteScheduleRepository};
//! use pillbox_storage::models::ScheduleEntry;
//! use chrono::{NaiveDate, NaiveTime};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(DatabaseConfig::new("pillbox.db")).await?;
//! let repo = SqliteScheduleRepository::new(db.pool().clone());
//!
//! let date = NaiveDate::from_ymd_opt(2026, 8, 27).unwrap();
//! let time = NaiveTime::from_hms_opt(8, 0, 0).unwrap();
//! let id = repo.create(&ScheduleEntry::new(1, date, time)).await?;
//!
//! for entry in repo.find_for_date(date).await? {
//!     println!("dose {} at {}", entry.id, entry.scheduled_time);
//! }
//!
//! repo.delete(id).await?;
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod error;
pub mod models;
pub mod repositories;

pub use connection::{Database, DatabaseConfig};
pub use error::{StorageError, StorageResult};
pub use models::ScheduleEntry;
pub use repositories::{ScheduleRepository, SqliteScheduleRepository};
