//! Real GPIO backend via rppal (feature `rpi`).
//!
//! Pins are claimed once at construction and held for the life of the port;
//! rppal restores their state on drop. Construction fails with
//! [`HardwareError::Unavailable`] when the GPIO character device cannot be
//! opened, which the binary treats as fatal unless configured to fall back
//! to the simulator.

use crate::port::HardwarePort;
use crate::{HardwareError, Result};
use pillbox_core::constants::SERVO_PWM_FREQUENCY_HZ;
use pillbox_core::{Pin, PinLevel};
use rppal::gpio::{Gpio, InputPin, Level, OutputPin};
use std::collections::HashMap;
use std::time::Instant;

/// Real BCM pin backend.
#[derive(Debug)]
pub struct GpioPort {
    outputs: HashMap<Pin, OutputPin>,
    inputs: HashMap<Pin, InputPin>,
}

impl GpioPort {
    /// Claim the given pins and create the port.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::Unavailable`] if the GPIO peripheral cannot
    /// be opened or a pin is already claimed by another process.
    pub fn new(output_pins: &[Pin], input_pins: &[Pin]) -> Result<Self> {
        let gpio = Gpio::new()
            .map_err(|e| HardwareError::unavailable(format!("GPIO init failed: {e}")))?;

        let mut outputs = HashMap::new();
        for &pin in output_pins {
            let claimed = gpio
                .get(pin.as_u8())
                .map_err(|e| HardwareError::unavailable(format!("{pin} unavailable: {e}")))?
                .into_output_low();
            outputs.insert(pin, claimed);
        }

        let mut inputs = HashMap::new();
        for &pin in input_pins {
            let claimed = gpio
                .get(pin.as_u8())
                .map_err(|e| HardwareError::unavailable(format!("{pin} unavailable: {e}")))?
                .into_input();
            inputs.insert(pin, claimed);
        }

        Ok(Self { outputs, inputs })
    }

    fn output(&mut self, pin: Pin) -> Result<&mut OutputPin> {
        self.outputs
            .get_mut(&pin)
            .ok_or_else(|| HardwareError::unsupported(format!("{pin} is not an output")))
    }
}

impl HardwarePort for GpioPort {
    fn set_digital(&mut self, pin: Pin, level: PinLevel) -> Result<()> {
        let output = self.output(pin)?;
        output.write(match level {
            PinLevel::High => Level::High,
            PinLevel::Low => Level::Low,
        });
        Ok(())
    }

    fn read_digital(&self, pin: Pin) -> Result<PinLevel> {
        let input = self
            .inputs
            .get(&pin)
            .ok_or_else(|| HardwareError::unsupported(format!("{pin} is not an input")))?;
        Ok(match input.read() {
            Level::High => PinLevel::High,
            Level::Low => PinLevel::Low,
        })
    }

    fn set_pwm_duty_cycle(&mut self, pin: Pin, duty_percent: f64) -> Result<()> {
        if !(0.0..=100.0).contains(&duty_percent) {
            return Err(HardwareError::InvalidDuty { duty_percent });
        }
        self.output(pin)?
            .set_pwm_frequency(SERVO_PWM_FREQUENCY_HZ, duty_percent / 100.0)
            .map_err(|e| HardwareError::gpio(format!("PWM on {pin} failed: {e}")))
    }

    fn clear_pwm(&mut self, pin: Pin) -> Result<()> {
        self.output(pin)?
            .clear_pwm()
            .map_err(|e| HardwareError::gpio(format!("PWM clear on {pin} failed: {e}")))
    }

    fn now(&self) -> Instant {
        Instant::now()
    }
}
