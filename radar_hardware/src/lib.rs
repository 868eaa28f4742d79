//! Device implementations behind the `radar_traits` seams.
//!
//! The simulated devices run anywhere and back the CLI's default mode
//! and the integration tests. The real GPIO devices live behind the
//! `hardware` feature (Linux + rppal).

pub mod error;

#[cfg(feature = "hardware")]
pub mod encoder;
#[cfg(feature = "hardware")]
pub mod hcsr04;
#[cfg(feature = "hardware")]
pub mod outputs;
#[cfg(feature = "hardware")]
pub mod servo;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::time::Duration;

use radar_traits::{AlertSink, Display, HwDynError, RangeSensor, ResetInput, SweepServo};

/// Simulated servo: records the commanded angle into a slot shared
/// with the simulated sensor so the synthetic scene tracks the sweep.
pub struct SimulatedServo {
    angle: Arc<AtomicI32>,
}

impl SimulatedServo {
    pub fn new(angle: Arc<AtomicI32>) -> Self {
        Self { angle }
    }
}

impl SweepServo for SimulatedServo {
    fn set_angle(&mut self, degrees: i32) -> Result<(), HwDynError> {
        self.angle.store(degrees, Ordering::Relaxed);
        Ok(())
    }
}

/// Simulated range sensor: a single synthetic object across an angular
/// window, empty room everywhere else. The object leaves the scene
/// after a bounded number of echoes so a held sweep always resumes.
pub struct SimulatedSensor {
    angle: Arc<AtomicI32>,
    object_from_deg: i32,
    object_to_deg: i32,
    object_cm: f32,
    remaining_echoes: Option<u32>,
    cm_per_us: f32,
}

impl SimulatedSensor {
    /// Scene with an object at `object_cm` between `from_deg` and
    /// `to_deg` inclusive. `dwell_echoes` bounds how many echoes the
    /// object returns before wandering off; `None` keeps it forever.
    pub fn new(
        angle: Arc<AtomicI32>,
        from_deg: i32,
        to_deg: i32,
        object_cm: f32,
        dwell_echoes: Option<u32>,
    ) -> Self {
        Self {
            angle,
            object_from_deg: from_deg,
            object_to_deg: to_deg,
            object_cm,
            remaining_echoes: dwell_echoes,
            cm_per_us: 0.0343,
        }
    }

    /// Convenience scene: an object at 25 cm across 60..=100 degrees,
    /// gone after nine echoes (three filtered samples).
    pub fn with_default_scene(angle: Arc<AtomicI32>) -> Self {
        Self::new(angle, 60, 100, 25.0, Some(9))
    }
}

impl RangeSensor for SimulatedSensor {
    fn ping(&mut self, _timeout: Duration) -> Result<Option<Duration>, HwDynError> {
        let at = self.angle.load(Ordering::Relaxed);
        let in_window = (self.object_from_deg..=self.object_to_deg).contains(&at);
        let present = match self.remaining_echoes {
            Some(0) => false,
            _ => in_window,
        };
        if present {
            if let Some(n) = self.remaining_echoes.as_mut() {
                *n -= 1;
            }
            let us = (self.object_cm * 2.0 / self.cm_per_us).round() as u64;
            Ok(Some(Duration::from_micros(us)))
        } else {
            // Nothing in range: no echo within the timeout.
            Ok(None)
        }
    }
}

/// Simulated alert: tracks the driven state and logs edges.
#[derive(Default)]
pub struct SimulatedAlert {
    active: Arc<AtomicBool>,
}

impl SimulatedAlert {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Arc<AtomicBool> {
        self.active.clone()
    }
}

impl AlertSink for SimulatedAlert {
    fn set_active(&mut self, on: bool) -> Result<(), HwDynError> {
        self.active.store(on, Ordering::Relaxed);
        tracing::info!(on, "alert (simulated)");
        Ok(())
    }
}

/// Console-backed stand-in for the two-line character display.
pub struct ConsoleDisplay;

impl Display for ConsoleDisplay {
    fn show(&mut self, line1: &str, line2: &str) -> Result<(), HwDynError> {
        if line2.is_empty() {
            println!("[lcd] {line1}");
        } else {
            println!("[lcd] {line1} | {line2}");
        }
        Ok(())
    }
}

/// Reset input that is never pressed.
pub struct SimulatedReset;

impl ResetInput for SimulatedReset {
    fn is_pressed(&mut self) -> bool {
        false
    }
}

/// BCM pin assignment for the GPIO rig.
#[cfg(feature = "hardware")]
pub struct GpioPins {
    pub trig: u8,
    pub echo: u8,
    pub servo: u8,
    pub led: u8,
    pub buzzer: u8,
    pub encoder_clk: u8,
    pub encoder_dt: u8,
    pub encoder_sw: Option<u8>,
}

/// All GPIO devices opened together. `encoder_guard` must stay alive
/// for as long as encoder interrupts should be delivered.
#[cfg(feature = "hardware")]
pub struct GpioRig {
    pub sensor: hcsr04::HcSr04,
    pub servo: servo::PwmServo,
    pub alert: outputs::AlertOutputs,
    pub reset: Option<outputs::ResetButton>,
    pub encoder_guard: encoder::QuadratureEncoder,
}

#[cfg(feature = "hardware")]
impl GpioRig {
    pub fn open(
        pins: &GpioPins,
        state: Arc<radar_core::EncoderState>,
    ) -> error::Result<Self> {
        use rppal::gpio::Gpio;
        let gpio = Gpio::new()?;
        let sensor = hcsr04::HcSr04::new(
            gpio.get(pins.trig)?.into_output(),
            gpio.get(pins.echo)?.into_input(),
        )?;
        let servo = servo::PwmServo::new(gpio.get(pins.servo)?.into_output())?;
        let alert = outputs::AlertOutputs::new(
            gpio.get(pins.led)?.into_output(),
            gpio.get(pins.buzzer)?.into_output(),
        )?;
        let reset = match pins.encoder_sw {
            Some(p) => Some(outputs::ResetButton::new(gpio.get(p)?.into_input_pullup())),
            None => None,
        };
        let encoder_guard = encoder::QuadratureEncoder::attach(
            gpio.get(pins.encoder_clk)?.into_input_pullup(),
            gpio.get(pins.encoder_dt)?.into_input_pullup(),
            state,
        )?;
        Ok(Self {
            sensor,
            servo,
            alert,
            reset,
            encoder_guard,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_scene_echoes_only_inside_the_window() {
        let angle = Arc::new(AtomicI32::new(0));
        let mut servo = SimulatedServo::new(angle.clone());
        let mut sensor = SimulatedSensor::new(angle, 60, 100, 25.0, None);

        servo.set_angle(30).unwrap();
        assert!(sensor.ping(Duration::from_millis(30)).unwrap().is_none());

        servo.set_angle(80).unwrap();
        let echo = sensor.ping(Duration::from_millis(30)).unwrap().unwrap();
        // 25 cm round trip at 0.0343 cm/us.
        assert_eq!(echo, Duration::from_micros(1458));
    }

    #[test]
    fn simulated_object_leaves_after_its_dwell() {
        let angle = Arc::new(AtomicI32::new(80));
        let mut sensor = SimulatedSensor::new(angle, 60, 100, 25.0, Some(2));
        assert!(sensor.ping(Duration::from_millis(30)).unwrap().is_some());
        assert!(sensor.ping(Duration::from_millis(30)).unwrap().is_some());
        assert!(sensor.ping(Duration::from_millis(30)).unwrap().is_none());
    }

    #[test]
    fn simulated_alert_tracks_driven_state() {
        let mut alert = SimulatedAlert::new();
        let state = alert.state();
        alert.set_active(true).unwrap();
        assert!(state.load(Ordering::Relaxed));
        alert.set_active(false).unwrap();
        assert!(!state.load(Ordering::Relaxed));
    }
}
