//! Hardware port trait and backend dispatch.
//!
//! [`HardwarePort`] is the contract between the device layer and physical
//! pins. Backends are unified through [`AnyHardwarePort`], an enum wrapper
//! selected once at startup; higher components never branch on the active
//! variant.

use crate::Result;
use crate::sim::SimPort;
use pillbox_core::{Pin, PinLevel};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

/// Capability surface over physical pins.
///
/// Pin operations are synchronous and fast; blocking behavior (edge waits,
/// settle holds) belongs to the devices built on top of the port, which are
/// responsible for bounding it.
pub trait HardwarePort: Send {
    /// Drive a digital output pin to the given level.
    fn set_digital(&mut self, pin: Pin, level: PinLevel) -> Result<()>;

    /// Read the current level of a digital input pin.
    fn read_digital(&self, pin: Pin) -> Result<PinLevel>;

    /// Start or update the servo PWM signal on a pin.
    ///
    /// The carrier runs at the fixed 50 Hz servo frequency; `duty_percent`
    /// is the pulse width as a percentage of the period (0-100).
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::InvalidDuty`](crate::HardwareError::InvalidDuty)
    /// if the duty cycle is outside 0-100.
    fn set_pwm_duty_cycle(&mut self, pin: Pin, duty_percent: f64) -> Result<()>;

    /// Stop PWM signal output on a pin.
    fn clear_pwm(&mut self, pin: Pin) -> Result<()>;

    /// Monotonic timestamp for pulse timing.
    fn now(&self) -> Instant;
}

/// Enum wrapper for hardware backend dispatch.
///
/// The active backend is resolved once at startup from configuration and
/// then shared between tasks as [`SharedPort`]. The enum keeps dispatch
/// concrete (no trait objects) and lets the real backend stay behind the
/// `rpi` feature.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyHardwarePort {
    /// Simulated port with no side effects.
    Sim(SimPort),

    /// Real BCM pins via rppal.
    #[cfg(feature = "rpi")]
    Gpio(crate::gpio::GpioPort),
}

impl HardwarePort for AnyHardwarePort {
    fn set_digital(&mut self, pin: Pin, level: PinLevel) -> Result<()> {
        match self {
            Self::Sim(port) => port.set_digital(pin, level),
            #[cfg(feature = "rpi")]
            Self::Gpio(port) => port.set_digital(pin, level),
        }
    }

    fn read_digital(&self, pin: Pin) -> Result<PinLevel> {
        match self {
            Self::Sim(port) => port.read_digital(pin),
            #[cfg(feature = "rpi")]
            Self::Gpio(port) => port.read_digital(pin),
        }
    }

    fn set_pwm_duty_cycle(&mut self, pin: Pin, duty_percent: f64) -> Result<()> {
        match self {
            Self::Sim(port) => port.set_pwm_duty_cycle(pin, duty_percent),
            #[cfg(feature = "rpi")]
            Self::Gpio(port) => port.set_pwm_duty_cycle(pin, duty_percent),
        }
    }

    fn clear_pwm(&mut self, pin: Pin) -> Result<()> {
        match self {
            Self::Sim(port) => port.clear_pwm(pin),
            #[cfg(feature = "rpi")]
            Self::Gpio(port) => port.clear_pwm(pin),
        }
    }

    fn now(&self) -> Instant {
        match self {
            Self::Sim(port) => port.now(),
            #[cfg(feature = "rpi")]
            Self::Gpio(port) => port.now(),
        }
    }
}

/// Port shared between the scheduling and monitoring tasks.
///
/// The mutex is the single serialization point for physical access: one
/// in-flight operation at a time, held for the full duration of a ranging
/// measurement or a dispense cycle.
pub type SharedPort = Arc<Mutex<AnyHardwarePort>>;

/// Wrap a port for sharing between tasks.
pub fn shared(port: AnyHardwarePort) -> SharedPort {
    Arc::new(Mutex::new(port))
}
