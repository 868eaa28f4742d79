#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Scan-and-detect control loop (hardware-agnostic).
//!
//! This crate drives a directional range sensor back and forth across
//! an arc, filters each distance reading, and raises an alert while an
//! object sits inside a user-adjustable detection zone. All hardware
//! interactions go through the `radar_traits` seams.
//!
//! ## Architecture
//!
//! - **Sampling**: median-of-three echo filtering (`sampler` module)
//! - **Sweep**: pure back-and-forth scheduling (`sweep` module)
//! - **Detection**: Idle/Detecting machine with edge-only side effects
//!   (`detect` module)
//! - **Input**: lock-free quadrature accumulator + debounce
//!   (`encoder`), consumed by the `threshold` controller
//! - **Telemetry**: copy-on-read snapshot plus a one-per-iteration
//!   query bus (`telemetry` module)
//!
//! ## Fixed-point arithmetic
//!
//! Internals operate in integer millimeters (`i32`) for deterministic
//! behavior; floating centimeters exist only at the config and
//! telemetry edges. See `util::quantize_cm_to_mm`.

pub mod conversions;
pub mod detect;
pub mod encoder;
pub mod error;
pub mod mocks;
pub mod runner;
pub mod sampler;
pub mod sweep;
pub mod telemetry;
pub mod threshold;
pub mod util;

pub use detect::{DetectionEdge, DetectionStateMachine, DetectionStatus};
pub use encoder::EncoderState;
pub use sampler::{DistanceSample, RangeSampler};
pub use sweep::{Direction, SweepPosition};
pub use telemetry::{TelemetryBus, TelemetryClient, TelemetryPublisher, TelemetrySnapshot};
pub use threshold::{ThresholdController, ThresholdUpdate};

pub use radar_traits::{Clock, MonotonicClock};

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use radar_traits::{AlertSink, Display, RangeSensor, ResetInput, SweepServo};

use crate::error::{BuildError, Result};
use crate::util::{mm_to_cm, quantize_cm_to_mm};

/// Poll interval while waiting for the reset button to be released.
const RESET_POLL_MS: u64 = 5;

/// Sweep pacing configuration.
#[derive(Debug, Clone)]
pub struct SweepCfg {
    /// Angular step per iteration (degrees)
    pub step_deg: i32,
    /// Arc bounds (degrees); direction flips exactly at these
    pub min_deg: i32,
    pub max_deg: i32,
    /// Servo settle delay after commanding an angle (ms)
    pub delay_ms: u64,
    /// Re-sample delay while holding on a detected object (ms)
    pub hold_ms: u64,
}

impl Default for SweepCfg {
    fn default() -> Self {
        Self {
            step_deg: 5,
            min_deg: 0,
            max_deg: 180,
            delay_ms: 200,
            hold_ms: 100,
        }
    }
}

/// Detection-zone configuration.
#[derive(Debug, Clone)]
pub struct DetectionCfg {
    pub default_range_cm: f32,
    pub min_range_cm: f32,
    /// Also the sensor saturation distance.
    pub max_range_cm: f32,
    pub range_increment_cm: f32,
    /// Deliberate display stall on a range change or reset (ms). The
    /// scan pauses for user feedback during manual adjustment.
    pub ui_stall_ms: u64,
}

impl Default for DetectionCfg {
    fn default() -> Self {
        Self {
            default_range_cm: 50.0,
            min_range_cm: 10.0,
            max_range_cm: 60.0,
            range_increment_cm: 5.0,
            ui_stall_ms: 300,
        }
    }
}

/// Echo measurement configuration.
#[derive(Debug, Clone)]
pub struct SensorCfg {
    pub echo_timeout_ms: u64,
    pub inter_sample_ms: u64,
    pub cm_per_us: f32,
}

impl Default for SensorCfg {
    fn default() -> Self {
        Self {
            echo_timeout_ms: 30,
            inter_sample_ms: 10,
            cm_per_us: 0.0343,
        }
    }
}

/// Manual-reset button timing.
#[derive(Debug, Clone)]
pub struct ResetCfg {
    /// Re-confirmation pause for the momentary contact (ms)
    pub confirm_ms: u64,
    /// Upper bound on waiting for release (ms)
    pub release_wait_ms: u64,
}

impl Default for ResetCfg {
    fn default() -> Self {
        Self {
            confirm_ms: 30,
            release_wait_ms: 5000,
        }
    }
}

/// Public status of a single control-loop iteration. The loop has no
/// terminal state; it alternates between these two forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStatus {
    /// Sampled at `angle_deg` and advanced the sweep.
    Swept { angle_deg: i32, distance_mm: i32 },
    /// Object within range; sweep frozen at `angle_deg`.
    Holding { angle_deg: i32, distance_mm: i32 },
}

/// The sweeping-radar controller.
///
/// Owns every piece of mutable scan state (position, detection status,
/// threshold) so the "sweep frozen while detecting" invariant is
/// enforced in one place. The encoder accumulator is the only state
/// shared with another execution context.
pub struct RadarCore {
    sensor: Box<dyn RangeSensor>,
    servo: Box<dyn SweepServo>,
    alert: Box<dyn AlertSink>,
    display: Box<dyn Display>,
    reset: Option<Box<dyn ResetInput>>,
    encoder: Option<Arc<EncoderState>>,
    clock: Arc<dyn Clock + Send + Sync>,

    sweep: SweepCfg,
    reset_cfg: ResetCfg,
    delay: Duration,
    hold: Duration,
    ui_stall: Duration,

    sampler: RangeSampler,
    threshold: ThresholdController,
    machine: DetectionStateMachine,
    position: SweepPosition,
    publisher: TelemetryPublisher,
    bus: TelemetryBus,

    last_sample: DistanceSample,
    sweeps_completed: u64,
    alert_on: bool,
}

impl core::fmt::Debug for RadarCore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RadarCore")
            .field("angle_deg", &self.position.angle_deg)
            .field("direction", &self.position.direction)
            .field("status", &self.machine.status())
            .field("range_cm", &self.threshold.range_cm())
            .field("last_distance_cm", &mm_to_cm(self.last_sample.filtered_mm))
            .finish()
    }
}

impl RadarCore {
    /// Start building a controller.
    pub fn builder() -> RadarBuilder<Missing, Missing> {
        RadarBuilder::default()
    }

    pub fn angle_deg(&self) -> i32 {
        self.position.angle_deg
    }

    pub fn status(&self) -> DetectionStatus {
        self.machine.status()
    }

    pub fn detection_range_cm(&self) -> f32 {
        self.threshold.range_cm()
    }

    pub fn last_distance_cm(&self) -> f32 {
        mm_to_cm(self.last_sample.filtered_mm)
    }

    /// Completed full forward-then-backward cycles since `begin`.
    pub fn sweeps_completed(&self) -> u64 {
        self.sweeps_completed
    }

    /// Handle onto the snapshot store for local observers.
    pub fn telemetry(&self) -> TelemetryPublisher {
        self.publisher.clone()
    }

    /// Client handle for the request/reply telemetry endpoint.
    pub fn telemetry_client(&self) -> TelemetryClient {
        self.bus.client()
    }

    /// Reset scan state and announce readiness: outputs low, servo at
    /// the arc start, startup banner on the display.
    pub fn begin(&mut self) {
        self.position = SweepPosition::start(self.sweep.min_deg);
        self.machine = DetectionStateMachine::new();
        self.sweeps_completed = 0;
        self.drive_alert(false);
        if let Err(e) = self.servo.set_angle(self.position.angle_deg) {
            tracing::warn!(error = %e, "servo command failed during begin");
        }
        self.show("Radar ready", "");
    }

    /// One control-loop iteration, in fixed order: service one
    /// telemetry query, poll the manual reset, consume encoder clicks,
    /// command and settle the servo, sample, publish, evaluate
    /// detection, drive outputs on edges, advance the sweep iff idle.
    ///
    /// Never fails: sink faults are logged and the scan degrades to
    /// "nothing detected" rather than halting.
    pub fn step(&mut self) -> ScanStatus {
        self.bus.serve_one(self.publisher.snapshot());
        self.poll_reset();
        self.consume_encoder();

        let angle = self.position.angle_deg;
        if let Err(e) = self.servo.set_angle(angle) {
            tracing::warn!(error = %e, angle, "servo command failed");
        }
        self.clock.sleep(self.delay);

        let sample = self
            .sampler
            .sample(self.sensor.as_mut(), self.clock.as_ref());
        self.last_sample = sample;
        let range_mm = self.threshold.range_mm();
        self.publisher.publish(TelemetrySnapshot {
            angle_deg: angle,
            distance_mm: sample.filtered_mm,
            range_mm,
        });
        let distance_cm = mm_to_cm(sample.filtered_mm);
        tracing::debug!(angle, distance_cm, "sample");

        match self.machine.evaluate(sample.filtered_mm, range_mm) {
            DetectionEdge::Entered => {
                tracing::info!(angle, distance_cm, "object detected; sweep held");
                self.drive_alert(true);
                let line2 = format!("{distance_cm:.1}cm @ {angle}");
                self.show("Object detected!", &line2);
                self.clock.sleep(self.hold);
                ScanStatus::Holding {
                    angle_deg: angle,
                    distance_mm: sample.filtered_mm,
                }
            }
            DetectionEdge::Unchanged if self.machine.is_detecting() => {
                self.clock.sleep(self.hold);
                ScanStatus::Holding {
                    angle_deg: angle,
                    distance_mm: sample.filtered_mm,
                }
            }
            DetectionEdge::Exited => {
                tracing::info!(angle, "object cleared; sweep resumes");
                self.drive_alert(false);
                self.show("Object cleared", "");
                self.clock.sleep(self.ui_stall);
                self.advance_sweep();
                ScanStatus::Swept {
                    angle_deg: angle,
                    distance_mm: sample.filtered_mm,
                }
            }
            DetectionEdge::Unchanged => {
                let line1 = format!("Angle: {angle} deg");
                let line2 = format!("{distance_cm:.1} cm");
                self.show(&line1, &line2);
                self.advance_sweep();
                ScanStatus::Swept {
                    angle_deg: angle,
                    distance_mm: sample.filtered_mm,
                }
            }
        }
    }

    /// Best-effort shutdown: drop the alert outputs.
    pub fn quiesce(&mut self) {
        if self.alert_on {
            self.drive_alert(false);
        }
    }

    fn advance_sweep(&mut self) {
        self.position = sweep::advance(
            self.position,
            self.sweep.step_deg,
            self.sweep.min_deg,
            self.sweep.max_deg,
        );
        if self.position == SweepPosition::start(self.sweep.min_deg) {
            self.sweeps_completed += 1;
        }
    }

    fn consume_encoder(&mut self) {
        let Some(enc) = self.encoder.clone() else {
            return;
        };
        match self.threshold.apply(enc.accumulator()) {
            ThresholdUpdate::Unchanged => {}
            ThresholdUpdate::Changed {
                range_mm,
                rolled_back,
            } => {
                if rolled_back {
                    enc.rewind_to(self.threshold.last_consumed());
                }
                let range_cm = mm_to_cm(range_mm);
                tracing::info!(range_cm, "detection range adjusted");
                let line1 = format!("Range: {range_cm:.1} cm");
                self.show(&line1, "");
                self.clock.sleep(self.ui_stall);
            }
        }
    }

    fn reset_pressed(&mut self) -> bool {
        match self.reset.as_mut() {
            Some(r) => r.is_pressed(),
            None => false,
        }
    }

    /// Manual range reset: held-low contact re-confirmed across a
    /// short pause, then a direct reset bypassing the per-click path.
    /// Waits for release afterwards, bounded by `release_wait_ms`;
    /// acceptable because this is an explicit user-paced maintenance
    /// action, not part of the steady-state cadence.
    fn poll_reset(&mut self) {
        if self.reset.is_none() || !self.reset_pressed() {
            return;
        }
        self.clock.sleep(Duration::from_millis(self.reset_cfg.confirm_ms));
        if !self.reset_pressed() {
            return; // contact bounce
        }
        if let Some(enc) = &self.encoder {
            enc.rewind_to(0);
        }
        self.threshold.reset();
        let range_cm = self.threshold.range_cm();
        tracing::info!(range_cm, "detection range reset");
        let line2 = format!("{range_cm:.1} cm");
        self.show("Range reset", &line2);
        self.clock.sleep(self.ui_stall);

        let held_since = self.clock.now();
        let bound = Duration::from_millis(self.reset_cfg.release_wait_ms);
        while self.reset_pressed() {
            if self.clock.now().saturating_duration_since(held_since) >= bound {
                tracing::warn!("reset button held past wait bound; resuming scan");
                break;
            }
            self.clock.sleep(Duration::from_millis(RESET_POLL_MS));
        }
    }

    fn drive_alert(&mut self, on: bool) {
        if let Err(e) = self.alert.set_active(on) {
            tracing::warn!(error = %e, on, "alert sink failed");
        }
        self.alert_on = on;
    }

    fn show(&mut self, line1: &str, line2: &str) {
        if let Err(e) = self.display.show(line1, line2) {
            tracing::warn!(error = %e, "display update failed");
        }
    }
}

// Type-state markers for the builder
pub struct Missing;
pub struct Set;

/// Builder for `RadarCore`. Sensor and servo are mandatory and tracked
/// in the type; everything else defaults (null sinks, monotonic clock,
/// stock configuration). All values are validated on `build()`.
pub struct RadarBuilder<S, V> {
    sensor: Option<Box<dyn RangeSensor>>,
    servo: Option<Box<dyn SweepServo>>,
    alert: Option<Box<dyn AlertSink>>,
    display: Option<Box<dyn Display>>,
    reset: Option<Box<dyn ResetInput>>,
    encoder: Option<Arc<EncoderState>>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    sweep: Option<SweepCfg>,
    detection: Option<DetectionCfg>,
    sensor_cfg: Option<SensorCfg>,
    reset_cfg: Option<ResetCfg>,
    _s: PhantomData<S>,
    _v: PhantomData<V>,
}

impl Default for RadarBuilder<Missing, Missing> {
    fn default() -> Self {
        Self {
            sensor: None,
            servo: None,
            alert: None,
            display: None,
            reset: None,
            encoder: None,
            clock: None,
            sweep: None,
            detection: None,
            sensor_cfg: None,
            reset_cfg: None,
            _s: PhantomData,
            _v: PhantomData,
        }
    }
}

/// Chainable setters that do not affect type-state
impl<S, V> RadarBuilder<S, V> {
    pub fn with_alert(mut self, alert: impl AlertSink + 'static) -> Self {
        self.alert = Some(Box::new(alert));
        self
    }
    pub fn with_display(mut self, display: impl Display + 'static) -> Self {
        self.display = Some(Box::new(display));
        self
    }
    pub fn with_reset_input(mut self, reset: impl ResetInput + 'static) -> Self {
        self.reset = Some(Box::new(reset));
        self
    }
    pub fn with_encoder(mut self, encoder: Arc<EncoderState>) -> Self {
        self.encoder = Some(encoder);
        self
    }
    pub fn with_sweep(mut self, sweep: SweepCfg) -> Self {
        self.sweep = Some(sweep);
        self
    }
    pub fn with_detection(mut self, detection: DetectionCfg) -> Self {
        self.detection = Some(detection);
        self
    }
    pub fn with_sensor_cfg(mut self, sensor_cfg: SensorCfg) -> Self {
        self.sensor_cfg = Some(sensor_cfg);
        self
    }
    pub fn with_reset_cfg(mut self, reset_cfg: ResetCfg) -> Self {
        self.reset_cfg = Some(reset_cfg);
        self
    }
    /// Provide a custom clock; defaults to `MonotonicClock`.
    pub fn with_clock(mut self, clock: Box<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Fallible build available in any type-state; returns a detailed
    /// `BuildError` for missing pieces.
    pub fn try_build(self) -> Result<RadarCore> {
        let RadarBuilder {
            sensor,
            servo,
            alert,
            display,
            reset,
            encoder,
            clock,
            sweep,
            detection,
            sensor_cfg,
            reset_cfg,
            _s: _,
            _v: _,
        } = self;

        let sensor = sensor.ok_or_else(|| eyre::Report::new(BuildError::MissingSensor))?;
        let servo = servo.ok_or_else(|| eyre::Report::new(BuildError::MissingServo))?;
        let sweep = sweep.unwrap_or_default();
        let detection = detection.unwrap_or_default();
        let sensor_cfg = sensor_cfg.unwrap_or_default();
        let reset_cfg = reset_cfg.unwrap_or_default();

        if sweep.step_deg <= 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "sweep step must be > 0",
            )));
        }
        if sweep.min_deg < 0 || sweep.max_deg > 180 || sweep.min_deg >= sweep.max_deg {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "sweep arc must be a non-empty range within [0, 180]",
            )));
        }
        if !(detection.min_range_cm > 0.0) || !detection.min_range_cm.is_finite() {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "min range must be > 0",
            )));
        }
        if !detection.max_range_cm.is_finite()
            || detection.min_range_cm >= detection.max_range_cm
        {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "min range must be below max range",
            )));
        }
        if detection.default_range_cm < detection.min_range_cm
            || detection.default_range_cm > detection.max_range_cm
        {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "default range must sit within [min, max]",
            )));
        }
        if !(detection.range_increment_cm > 0.0) {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "range increment must be > 0",
            )));
        }
        if sensor_cfg.echo_timeout_ms == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "echo timeout must be >= 1 ms",
            )));
        }
        if !(sensor_cfg.cm_per_us > 0.0) || !sensor_cfg.cm_per_us.is_finite() {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "propagation constant must be positive and finite",
            )));
        }
        if reset_cfg.confirm_ms == 0 || reset_cfg.release_wait_ms == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "reset timings must be >= 1 ms",
            )));
        }

        let clock: Arc<dyn Clock + Send + Sync> = match clock {
            Some(b) => Arc::from(b),
            None => Arc::new(MonotonicClock::new()),
        };

        let max_range_mm = quantize_cm_to_mm(detection.max_range_cm);
        let min_range_mm = quantize_cm_to_mm(detection.min_range_cm);
        let default_mm = quantize_cm_to_mm(detection.default_range_cm);
        let increment_mm = quantize_cm_to_mm(detection.range_increment_cm);

        let sampler = RangeSampler::new(
            Duration::from_millis(sensor_cfg.echo_timeout_ms),
            Duration::from_millis(sensor_cfg.inter_sample_ms),
            sensor_cfg.cm_per_us,
            max_range_mm,
        );
        let threshold =
            ThresholdController::new(default_mm, min_range_mm, max_range_mm, increment_mm);
        let position = SweepPosition::start(sweep.min_deg);
        let delay = Duration::from_millis(sweep.delay_ms);
        let hold = Duration::from_millis(sweep.hold_ms);
        let ui_stall = Duration::from_millis(detection.ui_stall_ms);

        Ok(RadarCore {
            sensor,
            servo,
            alert: alert.unwrap_or_else(|| Box::new(mocks::NullAlert)),
            display: display.unwrap_or_else(|| Box::new(mocks::NullDisplay)),
            reset,
            encoder,
            clock,
            sweep,
            reset_cfg,
            delay,
            hold,
            ui_stall,
            sampler,
            threshold,
            machine: DetectionStateMachine::new(),
            position,
            publisher: TelemetryPublisher::new(),
            bus: TelemetryBus::new(),
            last_sample: DistanceSample {
                raw_mm: 0,
                filtered_mm: 0,
            },
            sweeps_completed: 0,
            alert_on: false,
        })
    }
}

// Setters that advance type-state when providing mandatory components
impl<V> RadarBuilder<Missing, V> {
    pub fn with_sensor(self, sensor: impl RangeSensor + 'static) -> RadarBuilder<Set, V> {
        let RadarBuilder {
            sensor: _,
            servo,
            alert,
            display,
            reset,
            encoder,
            clock,
            sweep,
            detection,
            sensor_cfg,
            reset_cfg,
            _s: _,
            _v: _,
        } = self;
        RadarBuilder {
            sensor: Some(Box::new(sensor)),
            servo,
            alert,
            display,
            reset,
            encoder,
            clock,
            sweep,
            detection,
            sensor_cfg,
            reset_cfg,
            _s: PhantomData,
            _v: PhantomData,
        }
    }
}

impl<S> RadarBuilder<S, Missing> {
    pub fn with_servo(self, servo: impl SweepServo + 'static) -> RadarBuilder<S, Set> {
        let RadarBuilder {
            sensor,
            servo: _,
            alert,
            display,
            reset,
            encoder,
            clock,
            sweep,
            detection,
            sensor_cfg,
            reset_cfg,
            _s: _,
            _v: _,
        } = self;
        RadarBuilder {
            sensor,
            servo: Some(Box::new(servo)),
            alert,
            display,
            reset,
            encoder,
            clock,
            sweep,
            detection,
            sensor_cfg,
            reset_cfg,
            _s: PhantomData,
            _v: PhantomData,
        }
    }
}

impl RadarBuilder<Set, Set> {
    /// Validate and build. Only available once sensor and servo are set.
    pub fn build(self) -> Result<RadarCore> {
        self.try_build()
    }
}
