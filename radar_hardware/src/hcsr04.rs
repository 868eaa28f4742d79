//! HC-SR04 ultrasonic ranger on two GPIO lines.

use std::time::{Duration, Instant};

use rppal::gpio::{InputPin, OutputPin};

use radar_traits::{HwDynError, RangeSensor};

use crate::error::Result;

pub struct HcSr04 {
    trig: OutputPin,
    echo: InputPin,
}

impl HcSr04 {
    pub fn new(mut trig: OutputPin, echo: InputPin) -> Result<Self> {
        trig.set_low(); // trigger idle low
        Ok(Self { trig, echo })
    }

    /// 10 us trigger pulse, preceded by a short settle.
    fn trigger(&mut self) {
        self.trig.set_low();
        spin_for(Duration::from_micros(2));
        self.trig.set_high();
        spin_for(Duration::from_micros(10));
        self.trig.set_low();
    }

    /// Fire one ping and measure the echo pulse width. `None` when the
    /// echo never starts or never ends within `timeout`; both read as
    /// "nothing in range".
    pub fn measure(&mut self, timeout: Duration) -> Result<Option<Duration>> {
        self.trigger();

        let deadline = Instant::now() + timeout;
        while self.echo.is_low() {
            if Instant::now() >= deadline {
                return Ok(None);
            }
            std::hint::spin_loop();
        }
        let rising = Instant::now();
        let deadline = rising + timeout;
        while self.echo.is_high() {
            if Instant::now() >= deadline {
                tracing::trace!("echo line stuck high past the timeout");
                return Ok(None);
            }
            std::hint::spin_loop();
        }
        let width = rising.elapsed();
        tracing::trace!(echo_us = width.as_micros() as u64, "hcsr04 echo");
        Ok(Some(width))
    }
}

impl RangeSensor for HcSr04 {
    fn ping(&mut self, timeout: Duration) -> std::result::Result<Option<Duration>, HwDynError> {
        self.measure(timeout).map_err(Into::into)
    }
}

/// Busy-wait; the pulse timings are far below scheduler resolution.
#[inline(always)]
fn spin_for(d: Duration) {
    let until = Instant::now() + d;
    while Instant::now() < until {
        std::hint::spin_loop();
    }
}
