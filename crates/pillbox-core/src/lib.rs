//! Shared domain types for the Pillbox dispenser controller.
//!
//! This crate holds the types, constants, and error taxonomy shared by the
//! hardware, device, storage, and engine layers: pin identifiers, sensor
//! readings, and the container fill-level classification.

pub mod constants;
pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
