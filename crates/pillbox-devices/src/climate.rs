//! Temperature and humidity sensing with bounded retry.
//!
//! Single-shot reads from the climate chip are unreliable by nature, so the
//! probe seam stays thin: [`ClimateProbe::sample`] is one attempt, and
//! [`ClimateSensor`] wraps it with a fixed attempt budget and a short
//! inter-attempt delay. After the final failed attempt the sensor reports
//! `None` — an absent reading is a normal outcome for a cycle, never an
//! error the monitor loop has to recover from.

use pillbox_core::ClimateReading;
use pillbox_core::constants::{CLIMATE_READ_ATTEMPTS, CLIMATE_RETRY_DELAY};
use pillbox_hardware::{HardwareError, Result};
use std::time::Duration;
use tracing::{debug, warn};

/// One single-shot climate read attempt.
pub trait ClimateProbe: Send {
    /// Perform a single read attempt.
    ///
    /// # Errors
    ///
    /// Returns an error when the chip did not answer or the transfer failed
    /// its checksum; the wrapping [`ClimateSensor`] decides whether to retry.
    async fn sample(&mut self) -> Result<ClimateReading>;
}

/// Simulated probe for development and testing.
///
/// Reports fixed values (25 °C / 50 % by default, matching the simulator's
/// benign environment) and can be scripted to fail a number of leading
/// attempts or every attempt.
#[derive(Debug)]
pub struct SimProbe {
    temperature_celsius: f32,
    humidity_percent: f32,
    failures_remaining: u32,
    always_fail: bool,
    samples_taken: u32,
}

impl SimProbe {
    /// Create a probe reporting the default simulated climate.
    pub fn new() -> Self {
        Self::with_values(25.0, 50.0)
    }

    /// Create a probe reporting custom values.
    pub fn with_values(temperature_celsius: f32, humidity_percent: f32) -> Self {
        Self {
            temperature_celsius,
            humidity_percent,
            failures_remaining: 0,
            always_fail: false,
            samples_taken: 0,
        }
    }

    /// Fail the next `count` sample attempts before succeeding.
    pub fn fail_next(mut self, count: u32) -> Self {
        self.failures_remaining = count;
        self
    }

    /// Fail every sample attempt.
    pub fn always_failing(mut self) -> Self {
        self.always_fail = true;
        self
    }

    /// Number of sample attempts made so far.
    pub fn samples_taken(&self) -> u32 {
        self.samples_taken
    }
}

impl Default for SimProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl ClimateProbe for SimProbe {
    async fn sample(&mut self) -> Result<ClimateReading> {
        self.samples_taken += 1;
        if self.always_fail {
            return Err(HardwareError::gpio("simulated sensor fault"));
        }
        if self.failures_remaining > 0 {
            self.failures_remaining -= 1;
            return Err(HardwareError::gpio("simulated checksum mismatch"));
        }
        Ok(ClimateReading::new(
            self.temperature_celsius,
            self.humidity_percent,
        )?)
    }
}

/// Enum wrapper for climate probe dispatch, selected once at startup.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyClimateProbe {
    /// Simulated probe.
    Sim(SimProbe),

    /// Real DHT22 probe on a BCM data pin.
    #[cfg(feature = "rpi")]
    Dht22(dht22::Dht22Probe),
}

impl ClimateProbe for AnyClimateProbe {
    async fn sample(&mut self) -> Result<ClimateReading> {
        match self {
            Self::Sim(probe) => probe.sample().await,
            #[cfg(feature = "rpi")]
            Self::Dht22(probe) => probe.sample().await,
        }
    }
}

/// Climate sensor with a bounded retry policy over a probe.
///
/// # Examples
///
/// ```
/// use pillbox_devices::{ClimateSensor, SimProbe};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut sensor = ClimateSensor::new(SimProbe::new());
/// let reading = sensor.read().await.expect("sim probe always succeeds");
/// assert_eq!(reading.temperature_celsius, 25.0);
/// # }
/// ```
#[derive(Debug)]
pub struct ClimateSensor<P> {
    probe: P,
    attempts: u32,
    retry_delay: Duration,
}

impl<P: ClimateProbe> ClimateSensor<P> {
    /// Create a sensor with the default retry policy (3 attempts, 500 ms
    /// apart).
    pub fn new(probe: P) -> Self {
        Self {
            probe,
            attempts: CLIMATE_READ_ATTEMPTS,
            retry_delay: CLIMATE_RETRY_DELAY,
        }
    }

    /// Set a custom retry policy. `attempts` is the total attempt budget
    /// and must be at least 1.
    pub fn with_retry(mut self, attempts: u32, retry_delay: Duration) -> Self {
        self.attempts = attempts.max(1);
        self.retry_delay = retry_delay;
        self
    }

    /// Read the climate, retrying up to the attempt budget.
    ///
    /// Returns `None` after the final failed attempt. Callers treat `None`
    /// as "no data this cycle" and keep their previous value.
    pub async fn read(&mut self) -> Option<ClimateReading> {
        for attempt in 1..=self.attempts {
            match self.probe.sample().await {
                Ok(reading) => return Some(reading),
                Err(e) => {
                    debug!(attempt, error = %e, "climate read attempt failed");
                    if attempt < self.attempts {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }
        warn!(attempts = self.attempts, "climate reading absent this cycle");
        None
    }

    /// Access the underlying probe (used by tests to inspect counters).
    pub fn probe(&self) -> &P {
        &self.probe
    }
}

/// Real DHT22 probe (feature `rpi`).
///
/// The chip speaks a single-wire protocol on its own data pin, outside the
/// digital port contract, so the probe owns the pin directly through rppal.
#[cfg(feature = "rpi")]
pub mod dht22 {
    use super::*;
    use pillbox_core::{ClimateReading, Pin};
    use rppal::gpio::{Gpio, IoPin, Level, Mode};
    use std::time::Instant;

    /// Deadline for any single level wait during the transfer.
    const BIT_TIMEOUT: Duration = Duration::from_millis(2);

    /// High pulses longer than this are a 1 bit.
    const ONE_THRESHOLD: Duration = Duration::from_micros(50);

    #[derive(Debug)]
    pub struct Dht22Probe {
        pin: IoPin,
    }

    impl Dht22Probe {
        /// Claim the data pin.
        pub fn new(pin: Pin) -> Result<Self> {
            let gpio = Gpio::new()
                .map_err(|e| HardwareError::unavailable(format!("GPIO init failed: {e}")))?;
            let io = gpio
                .get(pin.as_u8())
                .map_err(|e| HardwareError::unavailable(format!("{pin} unavailable: {e}")))?
                .into_io(Mode::Input);
            Ok(Self { pin: io })
        }

        fn wait_level(&self, level: Level, deadline: Instant) -> Result<Instant> {
            while self.pin.read() != level {
                if Instant::now() >= deadline {
                    return Err(HardwareError::timeout(BIT_TIMEOUT.as_millis() as u64));
                }
                std::hint::spin_loop();
            }
            Ok(Instant::now())
        }

        /// Perform one transfer: start signal, 40 data bits, checksum.
        fn transfer(&mut self) -> Result<ClimateReading> {
            // Start signal: pull low for 1 ms, then release the line.
            self.pin.set_mode(Mode::Output);
            self.pin.set_low();
            std::thread::sleep(Duration::from_millis(1));
            self.pin.set_mode(Mode::Input);

            // Sensor response: low then high preamble, then 40 bits.
            let deadline = Instant::now() + Duration::from_millis(10);
            self.wait_level(Level::Low, deadline)?;
            self.wait_level(Level::High, deadline)?;
            self.wait_level(Level::Low, deadline)?;

            let mut bytes = [0u8; 5];
            for bit in 0..40 {
                let deadline = Instant::now() + BIT_TIMEOUT;
                let rose = self.wait_level(Level::High, deadline)?;
                let fell = self.wait_level(Level::Low, deadline)?;
                if fell.duration_since(rose) > ONE_THRESHOLD {
                    bytes[bit / 8] |= 1 << (7 - bit % 8);
                }
            }

            let checksum = bytes[0]
                .wrapping_add(bytes[1])
                .wrapping_add(bytes[2])
                .wrapping_add(bytes[3]);
            if checksum != bytes[4] {
                return Err(HardwareError::gpio("DHT22 checksum mismatch"));
            }

            let humidity = u16::from_be_bytes([bytes[0], bytes[1]]) as f32 / 10.0;
            let raw_temp = u16::from_be_bytes([bytes[2], bytes[3]]);
            let temperature = if raw_temp & 0x8000 != 0 {
                -((raw_temp & 0x7FFF) as f32 / 10.0)
            } else {
                raw_temp as f32 / 10.0
            };

            Ok(ClimateReading::new(temperature, humidity)?)
        }
    }

    impl ClimateProbe for Dht22Probe {
        async fn sample(&mut self) -> Result<ClimateReading> {
            // The transfer is timing-critical and takes under 6 ms; run it
            // inline rather than hopping threads mid-protocol.
            self.transfer()
        }
    }
}
