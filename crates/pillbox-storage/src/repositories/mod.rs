//! Repository traits and SQLite implementations.

pub mod schedule;

pub use schedule::{ScheduleRepository, SqliteScheduleRepository};
