pub mod clock;

pub use clock::{Clock, MonotonicClock, TestClock};

use std::time::Duration;

/// Boxed error type shared by all hardware seams.
pub type HwDynError = Box<dyn std::error::Error + Send + Sync>;

/// Pulsed time-of-flight range sensor (HC-SR04 or compatible).
///
/// `ping` fires a trigger pulse and measures the width of the echo
/// pulse. `Ok(None)` means no echo arrived within `timeout`; that is a
/// normal reading ("nothing in range"), not an error.
pub trait RangeSensor {
    fn ping(&mut self, timeout: Duration) -> Result<Option<Duration>, HwDynError>;
}

/// Positioning actuator carrying the sensor across the scan arc.
///
/// Accepts an absolute angle in degrees within [0, 180]. The device is
/// assumed to move toward the set-point on its own; latency is not
/// modeled here.
pub trait SweepServo {
    fn set_angle(&mut self, degrees: i32) -> Result<(), HwDynError>;
}

/// Alert actuation (visual + audible outputs driven together).
pub trait AlertSink {
    fn set_active(&mut self, on: bool) -> Result<(), HwDynError>;
}

/// Two-line character display (~16 chars per line).
pub trait Display {
    fn show(&mut self, line1: &str, line2: &str) -> Result<(), HwDynError>;
}

/// Momentary reset contact (encoder push button or similar).
pub trait ResetInput {
    fn is_pressed(&mut self) -> bool;
}
