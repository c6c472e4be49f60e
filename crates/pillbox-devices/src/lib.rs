//! Sensor and actuator drivers for the Pillbox dispenser.
//!
//! Everything in this crate is written against the
//! [`HardwarePort`](pillbox_hardware::HardwarePort) capability surface and
//! works unchanged on the simulator and on real pins:
//!
//! - [`RangeSensor`] — ultrasonic trigger/echo ranging with bounded edge
//!   waits. A stuck sensor yields a timeout, never a hang.
//! - [`ClimateSensor`] — temperature/humidity over a [`ClimateProbe`] with
//!   a bounded retry policy; an unavailable reading is `None`, never an
//!   error the caller has to handle.
//! - [`DispenseActuator`] — the open-hold-close-hold servo cycle with a
//!   busy rejection for overlapping commands and a safe shutdown path.
//!
//! All failure modes are recoverable at the component boundary; the
//! periodic loops in `pillbox-engine` treat them as "no update this tick"
//! or "retry next tick".

#![allow(async_fn_in_trait)]

pub mod actuator;
pub mod climate;
pub mod range;

pub use actuator::{ActuatorState, DispenseActuator};
pub use climate::{AnyClimateProbe, ClimateProbe, ClimateSensor, SimProbe};
pub use range::RangeSensor;

#[cfg(feature = "rpi")]
pub use climate::dht22::Dht22Probe;
