//! Servo signal on a Raspberry Pi GPIO pin using rppal's software PWM.

use std::time::Duration;

use rppal::gpio::{Gpio, OutputPin};
use servo_traits::{Actuator, DriverError};
use tracing::{debug, trace};

use crate::error::{HwError, Result};

pub struct PwmServo {
    gpio: Gpio,
    pin: Option<OutputPin>,
    period: Duration,
    bounds: (u16, u16),
}

impl PwmServo {
    /// `period_ms` is the frame length; hobby servos expect 20 ms (50 Hz).
    pub fn new(period_ms: u64) -> Result<Self> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(format!("open gpio: {e}")))?;
        Ok(Self {
            gpio,
            pin: None,
            period: Duration::from_millis(period_ms),
            bounds: (0, u16::MAX),
        })
    }
}

impl Actuator for PwmServo {
    fn attach(
        &mut self,
        channel: u8,
        min_us: u16,
        max_us: u16,
    ) -> std::result::Result<(), DriverError> {
        let pin = self
            .gpio
            .get(channel)
            .map_err(|e| HwError::Gpio(format!("open pin {channel}: {e}")))?
            .into_output_low();
        self.pin = Some(pin);
        self.bounds = (min_us, max_us);
        debug!(channel, min_us, max_us, "pwm attach");
        Ok(())
    }

    fn write(&mut self, pulse_us: u16) -> std::result::Result<(), DriverError> {
        let (lo, hi) = self.bounds;
        let pulse_us = pulse_us.clamp(lo, hi);
        let pin = self.pin.as_mut().ok_or(HwError::NotAttached)?;
        pin.set_pwm(self.period, Duration::from_micros(u64::from(pulse_us)))
            .map_err(|e| HwError::Gpio(format!("set pwm: {e}")))?;
        trace!(pulse_us, "pwm write");
        Ok(())
    }

    fn detach(&mut self) -> std::result::Result<(), DriverError> {
        if let Some(mut pin) = self.pin.take() {
            pin.clear_pwm()
                .map_err(|e| HwError::Gpio(format!("clear pwm: {e}")))?;
            pin.set_low();
            debug!("pwm detach");
        }
        Ok(())
    }

    fn is_attached(&self) -> bool {
        self.pin.is_some()
    }
}
