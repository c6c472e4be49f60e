//! Hardware port abstraction for the Pillbox dispenser controller.
//!
//! This crate provides the single capability surface through which every
//! sensor and actuator touches physical pins: digital reads and writes, the
//! servo PWM signal, and a monotonic timestamp source. Two implementations
//! exist behind one trait:
//!
//! - [`SimPort`] — a simulator with no side effects, used for development
//!   and testing. It records pin writes and PWM commands, and its input pins
//!   follow configurable behaviors (fixed levels or an echo-pulse profile
//!   derived from a simulated distance).
//! - [`GpioPort`] — real BCM pins via `rppal`, available behind the `rpi`
//!   feature.
//!
//! # Design Philosophy
//!
//! - **One variant, chosen once**: the active backend is selected at startup
//!   through [`AnyHardwarePort`]; no higher component ever branches on which
//!   variant is running.
//! - **One in-flight operation**: the port is shared between tasks as
//!   [`SharedPort`] (`Arc<tokio::sync::Mutex<_>>`), serializing physical
//!   access — the ultrasonic ranging and the servo cycle never interleave.
//! - **Error-aware**: all operations return [`Result<T>`] with
//!   [`HardwareError`] describing timeouts, busy rejections, and backend
//!   failures.
//!
//! # Examples
//!
//! ```
//! use pillbox_hardware::{AnyHardwarePort, HardwarePort, SimPort};
//! use pillbox_core::{Pin, PinLevel};
//!
//! # fn example() -> pillbox_hardware::Result<()> {
//! let (sim, handle) = SimPort::new();
//! let mut port = AnyHardwarePort::Sim(sim);
//!
//! let trigger = Pin::new(23).unwrap();
//! port.set_digital(trigger, PinLevel::High)?;
//! assert_eq!(handle.output_level(trigger), Some(PinLevel::High));
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod port;
pub mod sim;

#[cfg(feature = "rpi")]
pub mod gpio;

pub use error::{HardwareError, Result};
pub use port::{AnyHardwarePort, HardwarePort, SharedPort, shared};
pub use sim::{InputBehavior, PwmCommand, SimPort, SimPortHandle};

#[cfg(feature = "rpi")]
pub use gpio::GpioPort;
