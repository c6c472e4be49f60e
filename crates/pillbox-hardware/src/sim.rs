//! Simulated hardware port for development and testing.
//!
//! [`SimPort`] performs no physical I/O. Output writes and PWM commands are
//! recorded for inspection, and input pins follow behaviors configured
//! through the paired [`SimPortHandle`]: a fixed level, or an echo-pulse
//! profile that answers a trigger pulse with timing derived from a simulated
//! distance, which makes the ultrasonic ranging code run unmodified against
//! the simulator.

use crate::port::HardwarePort;
use crate::{HardwareError, Result};
use pillbox_core::constants::SPEED_OF_SOUND_CM_PER_S;
use pillbox_core::{Pin, PinLevel};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Lead time between the trigger falling edge and the simulated echo rise.
const ECHO_START_DELAY: Duration = Duration::from_micros(200);

/// Behavior of a simulated input pin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputBehavior {
    /// Pin always reads the given level.
    Fixed(PinLevel),

    /// Pin mirrors an ultrasonic echo: after the trigger pin's falling
    /// edge, it reads high for `width` starting `delay` later.
    Echo {
        trigger: Pin,
        delay: Duration,
        width: Duration,
    },
}

/// A recorded PWM command. `duty_percent` is `None` when the signal was
/// cleared.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PwmCommand {
    pub pin: Pin,
    pub duty_percent: Option<f64>,
}

#[derive(Debug, Default)]
struct SimState {
    outputs: HashMap<Pin, PinLevel>,
    inputs: HashMap<Pin, InputBehavior>,
    pwm: HashMap<Pin, f64>,
    pwm_history: Vec<PwmCommand>,
    trigger_fall: HashMap<Pin, Instant>,
}

/// Simulated hardware port.
///
/// Created together with its control handle:
///
/// ```
/// use pillbox_hardware::{HardwarePort, SimPort};
/// use pillbox_core::{Pin, PinLevel};
///
/// # fn example() -> pillbox_hardware::Result<()> {
/// let (mut port, handle) = SimPort::new();
///
/// let servo = Pin::new(18).unwrap();
/// port.set_pwm_duty_cycle(servo, 12.5)?;
/// assert_eq!(handle.pwm_duty(servo), Some(12.5));
///
/// port.clear_pwm(servo)?;
/// assert_eq!(handle.pwm_duty(servo), None);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SimPort {
    state: Arc<Mutex<SimState>>,
}

impl SimPort {
    /// Create a new simulated port and its control handle.
    pub fn new() -> (Self, SimPortHandle) {
        let state = Arc::new(Mutex::new(SimState::default()));
        let port = Self {
            state: Arc::clone(&state),
        };
        let handle = SimPortHandle { state };
        (port, handle)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SimState> {
        // Lock poisoning only happens if a holder panicked; the sim state
        // stays usable either way.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl HardwarePort for SimPort {
    fn set_digital(&mut self, pin: Pin, level: PinLevel) -> Result<()> {
        let mut state = self.lock();
        let previous = state.outputs.insert(pin, level);
        if previous == Some(PinLevel::High) && level == PinLevel::Low {
            state.trigger_fall.insert(pin, Instant::now());
        }
        Ok(())
    }

    fn read_digital(&self, pin: Pin) -> Result<PinLevel> {
        let state = self.lock();
        let level = match state.inputs.get(&pin) {
            Some(InputBehavior::Fixed(level)) => *level,
            Some(InputBehavior::Echo {
                trigger,
                delay,
                width,
            }) => match state.trigger_fall.get(trigger) {
                Some(fell_at) => {
                    let elapsed = fell_at.elapsed();
                    if elapsed >= *delay && elapsed < *delay + *width {
                        PinLevel::High
                    } else {
                        PinLevel::Low
                    }
                }
                None => PinLevel::Low,
            },
            // Unconfigured inputs read low, the benign default.
            None => PinLevel::Low,
        };
        Ok(level)
    }

    fn set_pwm_duty_cycle(&mut self, pin: Pin, duty_percent: f64) -> Result<()> {
        if !(0.0..=100.0).contains(&duty_percent) {
            return Err(HardwareError::InvalidDuty { duty_percent });
        }
        let mut state = self.lock();
        state.pwm.insert(pin, duty_percent);
        state.pwm_history.push(PwmCommand {
            pin,
            duty_percent: Some(duty_percent),
        });
        Ok(())
    }

    fn clear_pwm(&mut self, pin: Pin) -> Result<()> {
        let mut state = self.lock();
        state.pwm.remove(&pin);
        state.pwm_history.push(PwmCommand {
            pin,
            duty_percent: None,
        });
        Ok(())
    }

    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Control and inspection handle for a [`SimPort`].
///
/// The handle shares state with the port, so tests can script input
/// behavior and inspect pin history while the port is locked inside a
/// device operation.
#[derive(Debug, Clone)]
pub struct SimPortHandle {
    state: Arc<Mutex<SimState>>,
}

impl SimPortHandle {
    fn lock(&self) -> std::sync::MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Force an input pin to a fixed level.
    ///
    /// Useful for simulating a stuck sensor: an echo pin fixed low never
    /// produces a start edge, fixed high never produces a stop edge.
    pub fn set_input(&self, pin: Pin, level: PinLevel) {
        self.lock().inputs.insert(pin, InputBehavior::Fixed(level));
    }

    /// Configure `echo` to answer `trigger` pulses as if an object sat at
    /// `centimeters` from the sensor.
    pub fn simulate_distance(&self, trigger: Pin, echo: Pin, centimeters: f64) {
        let width = Duration::from_secs_f64(2.0 * centimeters / SPEED_OF_SOUND_CM_PER_S);
        self.lock().inputs.insert(
            echo,
            InputBehavior::Echo {
                trigger,
                delay: ECHO_START_DELAY,
                width,
            },
        );
    }

    /// Get the last level written to an output pin.
    pub fn output_level(&self, pin: Pin) -> Option<PinLevel> {
        self.lock().outputs.get(&pin).copied()
    }

    /// Get the currently active PWM duty cycle on a pin, if any.
    pub fn pwm_duty(&self, pin: Pin) -> Option<f64> {
        self.lock().pwm.get(&pin).copied()
    }

    /// Get the full sequence of PWM commands issued so far.
    pub fn pwm_history(&self) -> Vec<PwmCommand> {
        self.lock().pwm_history.clone()
    }
}
