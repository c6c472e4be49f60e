//! User notification seam.
//!
//! The engine only knows how to say "a dose is due"; delivery (desktop
//! notification, display, push service) lives behind the [`Notifier`]
//! trait. The default [`LogNotifier`] writes the reminder to the log, which
//! is the appropriate surface for a headless device.

use crate::error::EngineResult;
use pillbox_storage::ScheduleEntry;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tracing::info;

/// Title used for dose reminders.
pub const NOTIFICATION_TITLE: &str = "Pill Reminder";

/// Body used for dose reminders.
pub const NOTIFICATION_MESSAGE: &str = "Time to take your medication!";

/// A reminder ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub message: String,

    /// Schedule entry that triggered the reminder.
    pub entry_id: i64,

    /// User the dose belongs to.
    pub user_id: i64,
}

impl Notification {
    /// Build the standard dose reminder for a schedule entry.
    pub fn dose_reminder(entry: &ScheduleEntry) -> Self {
        Self {
            title: NOTIFICATION_TITLE.to_string(),
            message: NOTIFICATION_MESSAGE.to_string(),
            entry_id: entry.id,
            user_id: entry.user_id,
        }
    }
}

/// Delivery seam for dose reminders.
pub trait Notifier: Send + Sync {
    /// Deliver one notification.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Notification`](crate::EngineError::Notification)
    /// when delivery fails; the engine logs the failure and continues, since
    /// a missed reminder must not block the dispense itself.
    async fn notify(&self, notification: &Notification) -> EngineResult<()>;
}

/// Notifier that writes reminders to the structured log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn notify(&self, notification: &Notification) -> EngineResult<()> {
        info!(
            entry_id = notification.entry_id,
            user_id = notification.user_id,
            title = %notification.title,
            message = %notification.message,
            "dose reminder"
        );
        Ok(())
    }
}

/// Notifier that records every delivery, for tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications delivered so far.
    pub fn sent(&self) -> Vec<Notification> {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: &Notification) -> EngineResult<()> {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(notification.clone());
        Ok(())
    }
}
