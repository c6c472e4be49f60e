//! Data models for the Pillbox schedule store.

pub mod schedule;

pub use schedule::ScheduleEntry;
