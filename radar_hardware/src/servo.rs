//! Hobby servo on software PWM.

use std::time::Duration;

use rppal::gpio::OutputPin;

use radar_traits::{HwDynError, SweepServo};

use crate::error::Result;

const PERIOD: Duration = Duration::from_millis(20);
const PULSE_MIN_US: i64 = 500;
const PULSE_MAX_US: i64 = 2400;

pub struct PwmServo {
    pin: OutputPin,
}

impl PwmServo {
    pub fn new(mut pin: OutputPin) -> Result<Self> {
        pin.set_low();
        Ok(Self { pin })
    }

    fn pulse_for(degrees: i32) -> Duration {
        let deg = i64::from(degrees.clamp(0, 180));
        let us = PULSE_MIN_US + (PULSE_MAX_US - PULSE_MIN_US) * deg / 180;
        Duration::from_micros(us as u64)
    }
}

impl SweepServo for PwmServo {
    fn set_angle(&mut self, degrees: i32) -> std::result::Result<(), HwDynError> {
        let pulse = Self::pulse_for(degrees);
        self.pin
            .set_pwm(PERIOD, pulse)
            .map_err(crate::error::HwError::from)?;
        tracing::trace!(degrees, pulse_us = pulse.as_micros() as u64, "servo set-point");
        Ok(())
    }
}
