//! Core constants for the pill dispenser controller.
//!
//! This module centralizes the physical and behavioral constants used across
//! the workspace: default BCM pin assignments, ultrasonic ranging parameters,
//! container classification thresholds, servo drive values, and the periodic
//! cadences of the two control loops.
//!
//! # Usage
//!
//! ```
//! use pillbox_core::constants::*;
//!
//! // Classification thresholds
//! assert!(CONTAINER_FULL_MAX_CM < CONTAINER_EMPTY_MIN_CM);
//!
//! // Ranging timeout
//! use std::time::Duration;
//! let deadline = Duration::from_millis(ECHO_TIMEOUT_MS);
//! ```
//!
//! Changing the pin constants only changes defaults; actual assignments come
//! from the runtime configuration (`PillboxConfig` in the binary crate)
//! resolved at startup.

use std::time::Duration;

// ============================================================================
// Default BCM pin assignments
// ============================================================================

/// Default BCM pin driving the servo PWM signal.
pub const DEFAULT_SERVO_PIN: u8 = 18;

/// Default BCM pin for the DHT22 climate sensor data line.
pub const DEFAULT_CLIMATE_PIN: u8 = 4;

/// Default BCM pin for the ultrasonic trigger output.
pub const DEFAULT_TRIGGER_PIN: u8 = 23;

/// Default BCM pin for the ultrasonic echo input.
pub const DEFAULT_ECHO_PIN: u8 = 24;

/// Highest usable BCM pin number on the 40-pin header.
pub const MAX_PIN: u8 = 27;

// ============================================================================
// Ultrasonic ranging
// ============================================================================

/// Duration of the trigger pulse sent to the ultrasonic sensor.
pub const TRIGGER_PULSE: Duration = Duration::from_micros(10);

/// Speed of sound in centimeters per second, at room temperature.
pub const SPEED_OF_SOUND_CM_PER_S: f64 = 34_300.0;

/// Upper bound on each echo edge wait, in milliseconds.
///
/// 30 ms corresponds to roughly five meters of round trip, well beyond any
/// container depth. A sensor that has not answered by then is stuck.
pub const ECHO_TIMEOUT_MS: u64 = 30;

// ============================================================================
// Container classification thresholds
// ============================================================================

/// Distances strictly below this are classified as a full container (cm).
pub const CONTAINER_FULL_MAX_CM: f64 = 5.0;

/// Distances at or above this are classified as an empty container (cm).
pub const CONTAINER_EMPTY_MIN_CM: f64 = 15.0;

// ============================================================================
// Climate sensor
// ============================================================================

/// Total single-shot read attempts before a climate read is reported absent.
pub const CLIMATE_READ_ATTEMPTS: u32 = 3;

/// Delay between climate read attempts.
pub const CLIMATE_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Lowest temperature the DHT22 can report (°C).
pub const CLIMATE_TEMP_MIN_C: f32 = -40.0;

/// Highest temperature the DHT22 can report (°C).
pub const CLIMATE_TEMP_MAX_C: f32 = 80.0;

// ============================================================================
// Servo drive
// ============================================================================

/// PWM carrier frequency for the servo signal (Hz).
pub const SERVO_PWM_FREQUENCY_HZ: f64 = 50.0;

/// Duty cycle (percent) that holds the dispenser gate open.
pub const SERVO_OPEN_DUTY_PERCENT: f64 = 12.5;

/// Duty cycle (percent) that holds the dispenser gate closed.
pub const SERVO_CLOSED_DUTY_PERCENT: f64 = 2.5;

/// Hold duration after each gate movement before the next phase.
pub const SERVO_SETTLE: Duration = Duration::from_millis(1000);

// ============================================================================
// Periodic cadences
// ============================================================================

/// Interval between schedule engine ticks.
pub const SCHEDULE_TICK_INTERVAL: Duration = Duration::from_secs(30);

/// Slack around a scheduled time within which a tick still matches.
pub const SCHEDULE_TOLERANCE_SECS: i64 = 60;

/// Interval between sensor monitor ticks.
pub const SENSOR_TICK_INTERVAL: Duration = Duration::from_secs(2);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds_ordered() {
        assert!(CONTAINER_FULL_MAX_CM < CONTAINER_EMPTY_MIN_CM);
    }

    #[test]
    fn test_echo_timeout_covers_range() {
        // 30 ms of sound travel, halved for the round trip, exceeds any
        // distance the classifier distinguishes.
        let max_cm = ECHO_TIMEOUT_MS as f64 / 1000.0 * SPEED_OF_SOUND_CM_PER_S / 2.0;
        assert!(max_cm > CONTAINER_EMPTY_MIN_CM);
    }

    #[test]
    fn test_servo_duty_bounds() {
        assert!(SERVO_CLOSED_DUTY_PERCENT > 0.0);
        assert!(SERVO_OPEN_DUTY_PERCENT <= 100.0);
        assert!(SERVO_CLOSED_DUTY_PERCENT < SERVO_OPEN_DUTY_PERCENT);
    }
}
