//! Test and helper doubles for radar_core.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use radar_traits::{AlertSink, Display, HwDynError, RangeSensor, ResetInput, SweepServo};

/// Round-trip echo time for a one-way distance, using the default
/// speed-of-sound constant (0.0343 cm/us).
pub fn echo_for_cm(cm: f32) -> Duration {
    Duration::from_micros((cm * 2.0 / 0.0343).round() as u64)
}

/// Sensor that replays a fixed list of readings, then repeats the last
/// one. `None` entries are no-echo timeouts.
pub struct ScriptedSensor {
    echoes: Vec<Option<Duration>>,
    idx: usize,
}

impl ScriptedSensor {
    pub fn new(echoes: impl Into<Vec<Option<Duration>>>) -> Self {
        Self {
            echoes: echoes.into(),
            idx: 0,
        }
    }

    /// One scripted distance per control-loop iteration: each entry is
    /// replicated three times to feed the median-of-three sampler.
    /// `None` entries are timeouts.
    pub fn from_cm_per_step(distances: &[Option<f32>]) -> Self {
        let echoes = distances
            .iter()
            .flat_map(|d| {
                let echo = d.map(echo_for_cm);
                [echo, echo, echo]
            })
            .collect::<Vec<_>>();
        Self::new(echoes)
    }
}

impl RangeSensor for ScriptedSensor {
    fn ping(&mut self, _timeout: Duration) -> Result<Option<Duration>, HwDynError> {
        let v = if self.idx < self.echoes.len() {
            self.echoes[self.idx]
        } else {
            self.echoes.last().copied().unwrap_or(None)
        };
        self.idx += 1;
        Ok(v)
    }
}

/// Servo that records every commanded angle.
#[derive(Default)]
pub struct SpyServo {
    log: Arc<Mutex<Vec<i32>>>,
}

impl SpyServo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle onto the command log, valid after the servo moves into
    /// the controller.
    pub fn log(&self) -> Arc<Mutex<Vec<i32>>> {
        self.log.clone()
    }
}

impl SweepServo for SpyServo {
    fn set_angle(&mut self, degrees: i32) -> Result<(), HwDynError> {
        if let Ok(mut log) = self.log.lock() {
            log.push(degrees);
        }
        Ok(())
    }
}

/// Alert sink recording every on/off edge it is driven through.
#[derive(Default)]
pub struct SpyAlert {
    edges: Arc<Mutex<Vec<bool>>>,
}

impl SpyAlert {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn edges(&self) -> Arc<Mutex<Vec<bool>>> {
        self.edges.clone()
    }
}

impl AlertSink for SpyAlert {
    fn set_active(&mut self, on: bool) -> Result<(), HwDynError> {
        if let Ok(mut edges) = self.edges.lock() {
            edges.push(on);
        }
        Ok(())
    }
}

/// Display capturing every two-line update.
#[derive(Default)]
pub struct SpyDisplay {
    lines: Arc<Mutex<Vec<(String, String)>>>,
}

impl SpyDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Arc<Mutex<Vec<(String, String)>>> {
        self.lines.clone()
    }
}

impl Display for SpyDisplay {
    fn show(&mut self, line1: &str, line2: &str) -> Result<(), HwDynError> {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push((line1.to_string(), line2.to_string()));
        }
        Ok(())
    }
}

/// Reset input replaying a scripted sequence of polls, then released.
pub struct ScriptedReset {
    polls: VecDeque<bool>,
}

impl ScriptedReset {
    pub fn new(polls: impl Into<VecDeque<bool>>) -> Self {
        Self {
            polls: polls.into(),
        }
    }
}

impl ResetInput for ScriptedReset {
    fn is_pressed(&mut self) -> bool {
        self.polls.pop_front().unwrap_or(false)
    }
}

/// Sinks that swallow output; used when a controller is built without
/// a display or alert wired up.
pub struct NullDisplay;

impl Display for NullDisplay {
    fn show(&mut self, _line1: &str, _line2: &str) -> Result<(), HwDynError> {
        Ok(())
    }
}

pub struct NullAlert;

impl AlertSink for NullAlert {
    fn set_active(&mut self, _on: bool) -> Result<(), HwDynError> {
        Ok(())
    }
}
