//! Servo dispense actuator.
//!
//! One dispense cycle walks Idle → Opening → Closing → Idle: drive the
//! servo to the open angle, hold, return to the closed angle, hold, stop
//! the signal. The state lives in an atomic so a second `dispense()` while
//! mid-cycle is rejected with a busy error before any pin is touched — the
//! mechanism is never commanded to move while already moving.

use pillbox_core::Pin;
use pillbox_core::constants::{SERVO_CLOSED_DUTY_PERCENT, SERVO_OPEN_DUTY_PERCENT, SERVO_SETTLE};
use pillbox_hardware::{HardwareError, HardwarePort, Result, SharedPort};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

const STATE_IDLE: u8 = 0;
const STATE_OPENING: u8 = 1;
const STATE_CLOSING: u8 = 2;

/// Phase of the dispense cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorState {
    /// No cycle in flight.
    Idle,

    /// Gate driven open, holding.
    Opening,

    /// Gate returning closed, holding.
    Closing,
}

impl ActuatorState {
    fn from_raw(raw: u8) -> Self {
        match raw {
            STATE_OPENING => ActuatorState::Opening,
            STATE_CLOSING => ActuatorState::Closing,
            _ => ActuatorState::Idle,
        }
    }
}

/// Servo-driven pill gate.
///
/// Clones share the same cycle state and port, so a handle kept for
/// shutdown observes in-flight cycles started through another clone.
#[derive(Debug, Clone)]
pub struct DispenseActuator {
    port: SharedPort,
    servo: Pin,
    open_duty: f64,
    closed_duty: f64,
    settle: Duration,
    state: Arc<AtomicU8>,
    shut_down: Arc<AtomicBool>,
}

impl DispenseActuator {
    /// Create an actuator with the default duty cycles and settle hold.
    pub fn new(port: SharedPort, servo: Pin) -> Self {
        Self {
            port,
            servo,
            open_duty: SERVO_OPEN_DUTY_PERCENT,
            closed_duty: SERVO_CLOSED_DUTY_PERCENT,
            settle: SERVO_SETTLE,
            state: Arc::new(AtomicU8::new(STATE_IDLE)),
            shut_down: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Set custom open/closed duty cycles.
    pub fn with_duty_cycles(mut self, open_duty: f64, closed_duty: f64) -> Self {
        self.open_duty = open_duty;
        self.closed_duty = closed_duty;
        self
    }

    /// Set a custom settle hold between phases.
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Current cycle phase.
    pub fn state(&self) -> ActuatorState {
        ActuatorState::from_raw(self.state.load(Ordering::Acquire))
    }

    /// Run one full dispense cycle.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::Busy`] if a cycle is already in flight; the
    /// in-flight cycle is unaffected. Port failures mid-cycle stop the PWM
    /// signal and restore Idle before the error propagates.
    pub async fn dispense(&self) -> Result<()> {
        if self
            .state
            .compare_exchange(
                STATE_IDLE,
                STATE_OPENING,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            return Err(HardwareError::busy("dispense"));
        }

        debug!(servo = %self.servo, "dispense cycle started");
        let result = self.run_cycle().await;

        if let Err(ref e) = result {
            warn!(error = %e, "dispense cycle failed, stopping servo output");
            let mut port = self.port.lock().await;
            let _ = port.clear_pwm(self.servo);
        }
        self.state.store(STATE_IDLE, Ordering::Release);
        result
    }

    /// Open-hold-close-hold under the port lock.
    async fn run_cycle(&self) -> Result<()> {
        let mut port = self.port.lock().await;

        port.set_pwm_duty_cycle(self.servo, self.open_duty)?;
        tokio::time::sleep(self.settle).await;

        self.state.store(STATE_CLOSING, Ordering::Release);
        port.set_pwm_duty_cycle(self.servo, self.closed_duty)?;
        tokio::time::sleep(self.settle).await;

        port.clear_pwm(self.servo)?;
        debug!(servo = %self.servo, "dispense cycle completed");
        Ok(())
    }

    /// Stop the actuator for process shutdown.
    ///
    /// Waits (bounded by one full cycle plus slack) for an in-flight cycle
    /// to reach Idle, then forces the closed output and stops the PWM
    /// signal. Idempotent: only the first call touches the pins.
    pub async fn shutdown(&self) -> Result<()> {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let deadline =
            tokio::time::Instant::now() + self.settle * 2 + Duration::from_millis(500);
        while self.state.load(Ordering::Acquire) != STATE_IDLE {
            if tokio::time::Instant::now() >= deadline {
                warn!("actuator did not reach idle before shutdown deadline");
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        let mut port = self.port.lock().await;
        port.set_pwm_duty_cycle(self.servo, self.closed_duty)?;
        tokio::time::sleep(Duration::from_millis(200)).await;
        port.clear_pwm(self.servo)?;
        debug!(servo = %self.servo, "actuator shut down");
        Ok(())
    }
}
