//! Ultrasonic distance ranging.
//!
//! Drives an HC-SR04 style trigger/echo pair: a 10 µs trigger pulse, then
//! two bounded waits for the echo line to rise and fall. Elapsed echo time
//! converts to distance through the speed of sound, halved for the round
//! trip. Both edge waits carry an explicit deadline so a disconnected or
//! stuck sensor produces [`HardwareError::Timeout`] instead of stalling the
//! calling task.

use pillbox_core::constants::{ECHO_TIMEOUT_MS, SPEED_OF_SOUND_CM_PER_S, TRIGGER_PULSE};
use pillbox_core::{DistanceReading, Pin, PinLevel};
use pillbox_hardware::{AnyHardwarePort, HardwareError, HardwarePort, Result, SharedPort};
use std::time::{Duration, Instant};

/// Ultrasonic range sensor.
///
/// Holds the shared port for the full duration of a measurement so the
/// trigger/echo sequence never interleaves with a servo cycle.
///
/// # Examples
///
/// ```
/// use pillbox_devices::RangeSensor;
/// use pillbox_hardware::{AnyHardwarePort, SimPort, shared};
/// use pillbox_core::Pin;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> pillbox_hardware::Result<()> {
/// let (sim, handle) = SimPort::new();
/// let trigger = Pin::new(23).unwrap();
/// let echo = Pin::new(24).unwrap();
/// handle.simulate_distance(trigger, echo, 10.0);
///
/// let sensor = RangeSensor::new(shared(AnyHardwarePort::Sim(sim)), trigger, echo);
/// let reading = sensor.measure_distance().await?;
/// assert!(reading.centimeters > 0.0);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RangeSensor {
    port: SharedPort,
    trigger: Pin,
    echo: Pin,
    timeout: Duration,
}

impl RangeSensor {
    /// Create a new sensor with the default 30 ms edge deadline.
    pub fn new(port: SharedPort, trigger: Pin, echo: Pin) -> Self {
        Self {
            port,
            trigger,
            echo,
            timeout: Duration::from_millis(ECHO_TIMEOUT_MS),
        }
    }

    /// Set a custom edge-wait deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Perform one distance measurement.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::Timeout`] when either echo edge does not
    /// arrive within the deadline. Callers treat this as "reading
    /// unavailable for this cycle", not as fatal.
    pub async fn measure_distance(&self) -> Result<DistanceReading> {
        let mut port = self.port.lock().await;

        // 10 µs trigger pulse. Short enough that a spin wait is the only
        // way to hit the width; the port lock is already held.
        port.set_digital(self.trigger, PinLevel::High)?;
        let pulse_start = port.now();
        while port.now().duration_since(pulse_start) < TRIGGER_PULSE {
            std::hint::spin_loop();
        }
        port.set_digital(self.trigger, PinLevel::Low)?;

        let deadline = port.now() + self.timeout;
        let rise = self.wait_for_edge(&port, PinLevel::High, deadline).await?;
        let fall = self.wait_for_edge(&port, PinLevel::Low, deadline).await?;

        let round_trip = fall.duration_since(rise);
        let centimeters = round_trip.as_secs_f64() * SPEED_OF_SOUND_CM_PER_S / 2.0;
        Ok(DistanceReading::new(centimeters)?)
    }

    /// Wait for the echo pin to reach `level`, yielding between polls.
    async fn wait_for_edge(
        &self,
        port: &AnyHardwarePort,
        level: PinLevel,
        deadline: Instant,
    ) -> Result<Instant> {
        loop {
            if port.read_digital(self.echo)? == level {
                return Ok(port.now());
            }
            if port.now() >= deadline {
                return Err(HardwareError::timeout(self.timeout.as_millis() as u64));
            }
            tokio::task::yield_now().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pillbox_hardware::{SimPort, shared};

    fn setup(distance_cm: Option<f64>) -> (RangeSensor, pillbox_hardware::SimPortHandle) {
        let (sim, handle) = SimPort::new();
        let trigger = Pin::new(23).unwrap();
        let echo = Pin::new(24).unwrap();
        if let Some(cm) = distance_cm {
            handle.simulate_distance(trigger, echo, cm);
        }
        let sensor = RangeSensor::new(shared(AnyHardwarePort::Sim(sim)), trigger, echo);
        (sensor, handle)
    }

    #[tokio::test]
    async fn test_measure_distance_matches_simulated() {
        let (sensor, _handle) = setup(Some(10.0));

        let reading = sensor.measure_distance().await.unwrap();
        // Polling jitter makes the measurement approximate; a few
        // centimeters of slack is plenty to confirm the conversion.
        assert!(
            (reading.centimeters - 10.0).abs() < 4.0,
            "got {} cm",
            reading.centimeters
        );
    }

    #[tokio::test]
    async fn test_stuck_low_echo_times_out() {
        let (sensor, handle) = setup(None);
        handle.set_input(Pin::new(24).unwrap(), PinLevel::Low);

        let started = Instant::now();
        let result = sensor.measure_distance().await;
        assert!(result.unwrap_err().is_timeout());
        // Returned within the deadline plus scheduling slack, never hung.
        assert!(started.elapsed() < Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_stuck_high_echo_times_out() {
        let (sensor, handle) = setup(None);
        // Start edge arrives immediately, stop edge never does.
        handle.set_input(Pin::new(24).unwrap(), PinLevel::High);

        let result = sensor.measure_distance().await;
        assert!(result.unwrap_err().is_timeout());
    }

    #[tokio::test]
    async fn test_trigger_pin_left_low() {
        let (sensor, handle) = setup(Some(8.0));
        sensor.measure_distance().await.unwrap();
        assert_eq!(
            handle.output_level(Pin::new(23).unwrap()),
            Some(PinLevel::Low)
        );
    }
}
