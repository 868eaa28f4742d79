//! LED + buzzer alert pair and the encoder push button.

use rppal::gpio::{InputPin, OutputPin};

use radar_traits::{AlertSink, HwDynError, ResetInput};

use crate::error::Result;

/// Visual and audible alert driven together, as one sink.
pub struct AlertOutputs {
    led: OutputPin,
    buzzer: OutputPin,
}

impl AlertOutputs {
    pub fn new(mut led: OutputPin, mut buzzer: OutputPin) -> Result<Self> {
        led.set_low();
        buzzer.set_low();
        Ok(Self { led, buzzer })
    }
}

impl AlertSink for AlertOutputs {
    fn set_active(&mut self, on: bool) -> std::result::Result<(), HwDynError> {
        if on {
            self.led.set_high();
            self.buzzer.set_high();
        } else {
            self.led.set_low();
            self.buzzer.set_low();
        }
        Ok(())
    }
}

/// Encoder push button, active low against the internal pull-up.
pub struct ResetButton {
    sw: InputPin,
}

impl ResetButton {
    pub fn new(sw: InputPin) -> Self {
        Self { sw }
    }
}

impl ResetInput for ResetButton {
    fn is_pressed(&mut self) -> bool {
        self.sw.is_low()
    }
}
