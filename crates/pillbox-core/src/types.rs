use crate::{
    Result,
    constants::{
        CLIMATE_TEMP_MAX_C, CLIMATE_TEMP_MIN_C, CONTAINER_EMPTY_MIN_CM, CONTAINER_FULL_MAX_CM,
        MAX_PIN,
    },
    error::Error,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// BCM pin number (0-27)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Pin(u8);

impl Pin {
    /// Create a new pin with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidPin` if the number is outside the BCM range (0-27).
    pub fn new(pin: u8) -> Result<Self> {
        if pin > MAX_PIN {
            return Err(Error::InvalidPin(pin));
        }
        Ok(Pin(pin))
    }

    /// Get the raw BCM pin number.
    #[must_use]
    pub fn as_u8(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "GPIO{}", self.0)
    }
}

impl TryFrom<u8> for Pin {
    type Error = Error;

    fn try_from(pin: u8) -> Result<Self> {
        Pin::new(pin)
    }
}

impl From<Pin> for u8 {
    fn from(pin: Pin) -> u8 {
        pin.0
    }
}

/// Logic level on a digital pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinLevel {
    Low,
    High,
}

impl PinLevel {
    /// Check if this level is high.
    #[must_use]
    pub fn is_high(&self) -> bool {
        matches!(self, PinLevel::High)
    }
}

impl fmt::Display for PinLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PinLevel::Low => write!(f, "low"),
            PinLevel::High => write!(f, "high"),
        }
    }
}

/// A single ultrasonic distance measurement.
///
/// Produced by the range sensor and consumed immediately by the container
/// classifier; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceReading {
    /// Measured distance in centimeters.
    pub centimeters: f64,

    /// Timestamp at capture.
    pub measured_at: DateTime<Utc>,
}

impl DistanceReading {
    /// Create a new reading timestamped now.
    ///
    /// # Errors
    /// Returns `Error::InvalidReading` if the distance is negative or not finite.
    pub fn new(centimeters: f64) -> Result<Self> {
        if !centimeters.is_finite() || centimeters < 0.0 {
            return Err(Error::InvalidReading(format!(
                "Distance must be non-negative, got {centimeters}"
            )));
        }
        Ok(Self {
            centimeters,
            measured_at: Utc::now(),
        })
    }

    /// Classify this reading into a container fill level.
    #[must_use]
    pub fn status(&self) -> ContainerStatus {
        ContainerStatus::from_distance_cm(self.centimeters)
    }
}

/// Discrete fill level of the pill container.
///
/// Always a pure function of the latest distance reading; no state is
/// retained between classifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerStatus {
    /// Container is full (distance below [`CONTAINER_FULL_MAX_CM`]).
    Full,

    /// Container is partially filled.
    HalfFull,

    /// Container is empty (distance at or above [`CONTAINER_EMPTY_MIN_CM`]).
    Empty,
}

impl ContainerStatus {
    /// Classify a distance measurement into a fill level.
    ///
    /// # Examples
    ///
    /// ```
    /// use pillbox_core::ContainerStatus;
    ///
    /// assert_eq!(ContainerStatus::from_distance_cm(3.0), ContainerStatus::Full);
    /// assert_eq!(ContainerStatus::from_distance_cm(5.0), ContainerStatus::HalfFull);
    /// assert_eq!(ContainerStatus::from_distance_cm(15.0), ContainerStatus::Empty);
    /// ```
    #[must_use]
    pub fn from_distance_cm(centimeters: f64) -> Self {
        if centimeters < CONTAINER_FULL_MAX_CM {
            ContainerStatus::Full
        } else if centimeters < CONTAINER_EMPTY_MIN_CM {
            ContainerStatus::HalfFull
        } else {
            ContainerStatus::Empty
        }
    }
}

impl fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ContainerStatus::Full => write!(f, "Full"),
            ContainerStatus::HalfFull => write!(f, "Half-full"),
            ContainerStatus::Empty => write!(f, "Empty"),
        }
    }
}

/// A temperature/humidity sample from the climate sensor.
///
/// An unavailable reading is expressed as `Option::<ClimateReading>::None`
/// at the sensor boundary, never as a sentinel value inside this type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClimateReading {
    /// Ambient temperature in degrees Celsius.
    pub temperature_celsius: f32,

    /// Relative humidity in percent.
    pub humidity_percent: f32,

    /// Timestamp at capture.
    pub measured_at: DateTime<Utc>,
}

impl ClimateReading {
    /// Create a new reading timestamped now.
    ///
    /// # Errors
    /// Returns `Error::InvalidReading` if the values fall outside the DHT22
    /// operating envelope (-40..=80 °C, 0..=100 %).
    pub fn new(temperature_celsius: f32, humidity_percent: f32) -> Result<Self> {
        if !(CLIMATE_TEMP_MIN_C..=CLIMATE_TEMP_MAX_C).contains(&temperature_celsius) {
            return Err(Error::InvalidReading(format!(
                "Temperature out of range: {temperature_celsius}"
            )));
        }
        if !(0.0..=100.0).contains(&humidity_percent) {
            return Err(Error::InvalidReading(format!(
                "Humidity out of range: {humidity_percent}"
            )));
        }
        Ok(Self {
            temperature_celsius,
            humidity_percent,
            measured_at: Utc::now(),
        })
    }
}

impl fmt::Display for ClimateReading {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{:.1}°C / {:.1}%",
            self.temperature_celsius, self.humidity_percent
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_pin_valid_range() {
        assert!(Pin::new(0).is_ok());
        assert!(Pin::new(27).is_ok());
        assert!(Pin::new(28).is_err());
    }

    #[test]
    fn test_pin_display() {
        let pin = Pin::new(18).unwrap();
        assert_eq!(pin.to_string(), "GPIO18");
        assert_eq!(pin.as_u8(), 18);
    }

    #[rstest]
    #[case(0.0, ContainerStatus::Full)]
    #[case(4.9, ContainerStatus::Full)]
    #[case(5.0, ContainerStatus::HalfFull)]
    #[case(10.0, ContainerStatus::HalfFull)]
    #[case(14.9, ContainerStatus::HalfFull)]
    #[case(15.0, ContainerStatus::Empty)]
    #[case(100.0, ContainerStatus::Empty)]
    fn test_container_classification(#[case] cm: f64, #[case] expected: ContainerStatus) {
        assert_eq!(ContainerStatus::from_distance_cm(cm), expected);
    }

    #[test]
    fn test_distance_reading_rejects_negative() {
        assert!(DistanceReading::new(-0.1).is_err());
        assert!(DistanceReading::new(f64::NAN).is_err());
        assert!(DistanceReading::new(0.0).is_ok());
    }

    #[test]
    fn test_distance_reading_status() {
        let reading = DistanceReading::new(7.0).unwrap();
        assert_eq!(reading.status(), ContainerStatus::HalfFull);
    }

    #[test]
    fn test_climate_reading_envelope() {
        assert!(ClimateReading::new(25.0, 50.0).is_ok());
        assert!(ClimateReading::new(-41.0, 50.0).is_err());
        assert!(ClimateReading::new(81.0, 50.0).is_err());
        assert!(ClimateReading::new(25.0, 101.0).is_err());
        assert!(ClimateReading::new(25.0, -1.0).is_err());
    }

    #[test]
    fn test_climate_reading_display() {
        let reading = ClimateReading::new(25.0, 50.0).unwrap();
        assert_eq!(reading.to_string(), "25.0°C / 50.0%");
    }

    #[test]
    fn test_container_status_display() {
        assert_eq!(ContainerStatus::Full.to_string(), "Full");
        assert_eq!(ContainerStatus::HalfFull.to_string(), "Half-full");
        assert_eq!(ContainerStatus::Empty.to_string(), "Empty");
    }
}
