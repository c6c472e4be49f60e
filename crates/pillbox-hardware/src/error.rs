//! Error types for hardware port operations.
//!
//! This module defines the failure taxonomy for physical pin access: edge
//! waits that never complete, an actuator commanded while mid-cycle, and a
//! backend that cannot be brought up at startup.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur during hardware port operations.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// An edge wait or read did not complete within its deadline.
    ///
    /// Recoverable: the caller skips this cycle's reading.
    #[error("Operation timeout after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// The actuator was commanded while a dispense cycle is in flight.
    ///
    /// Recoverable: the schedule engine retries on its next tick.
    #[error("Actuator busy: {operation}")]
    Busy { operation: String },

    /// The hardware backend could not be initialized or has been lost.
    ///
    /// Fatal at startup unless the caller falls back to the simulator.
    #[error("Hardware unavailable: {message}")]
    Unavailable { message: String },

    /// Operation is not supported by this pin or backend.
    #[error("Unsupported operation: {operation}")]
    Unsupported { operation: String },

    /// PWM duty cycle outside 0-100 percent.
    #[error("Invalid duty cycle: {duty_percent}%")]
    InvalidDuty { duty_percent: f64 },

    /// Invalid pin or reading from the core layer.
    #[error(transparent)]
    Core(#[from] pillbox_core::Error),

    /// Backend-specific GPIO failure.
    #[error("GPIO error: {message}")]
    Gpio { message: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HardwareError {
    /// Create a new timeout error.
    pub fn timeout(duration_ms: u64) -> Self {
        Self::Timeout { duration_ms }
    }

    /// Create a new busy error.
    pub fn busy(operation: impl Into<String>) -> Self {
        Self::Busy {
            operation: operation.into(),
        }
    }

    /// Create a new unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Create a new unsupported operation error.
    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
        }
    }

    /// Create a new backend GPIO error.
    pub fn gpio(message: impl Into<String>) -> Self {
        Self::Gpio {
            message: message.into(),
        }
    }

    /// Check if this error is the recoverable busy rejection.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy { .. })
    }

    /// Check if this error is a recoverable timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
