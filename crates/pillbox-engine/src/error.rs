use thiserror::Error;

/// Errors surfaced by the control loops.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Schedule store operation failed
    #[error("Storage error: {0}")]
    Storage(#[from] pillbox_storage::StorageError),

    /// Hardware operation failed
    #[error("Hardware error: {0}")]
    Hardware(#[from] pillbox_hardware::HardwareError),

    /// Notification delivery failed
    #[error("Notification error: {0}")]
    Notification(String),
}

impl EngineError {
    /// Create a notification delivery error.
    pub fn notification(message: impl Into<String>) -> Self {
        Self::Notification(message.into())
    }
}

/// Specialized result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
