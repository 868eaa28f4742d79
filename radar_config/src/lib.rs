#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the radar controller.
//!
//! `Config` and its sub-structs are deserialized from TOML and
//! validated before anything is built. Bootstrap-only values (network
//! identity, pin numbers) live here too; the core never reads them.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Pins {
    pub trig: u8,
    pub echo: u8,
    pub servo: u8,
    pub led: u8,
    pub buzzer: u8,
    pub encoder_clk: u8,
    pub encoder_dt: u8,
    /// Encoder push button (manual range reset). Optional.
    pub encoder_sw: Option<u8>,
}

impl Default for Pins {
    fn default() -> Self {
        Self {
            trig: 4,
            echo: 2,
            servo: 13,
            led: 5,
            buzzer: 18,
            encoder_clk: 32,
            encoder_dt: 33,
            encoder_sw: Some(25),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SweepCfg {
    /// Angular step per iteration (degrees)
    pub step_deg: i32,
    /// Arc lower bound (degrees)
    pub min_deg: i32,
    /// Arc upper bound (degrees)
    pub max_deg: i32,
    /// Settle delay after commanding a new angle (ms)
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

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetectionCfg {
    /// Detection threshold at startup (cm)
    pub default_range_cm: f32,
    /// Lowest threshold the encoder can dial in (cm)
    pub min_range_cm: f32,
    /// Highest threshold, also the sensor saturation range (cm)
    pub max_range_cm: f32,
    /// Threshold change per encoder click (cm)
    pub range_increment_cm: f32,
    /// Display stall after a range change or reset (ms).
    /// Deliberately pauses the scan for user feedback.
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

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SensorCfg {
    /// Max wait for an echo per ping (ms)
    pub echo_timeout_ms: u64,
    /// Pause between the three pings of one sample (ms)
    pub inter_sample_ms: u64,
    /// Speed-of-sound propagation constant (cm per microsecond)
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

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EncoderCfg {
    /// Minimum time between accepted quadrature decisions (ms)
    pub debounce_ms: u64,
    /// Re-confirmation pause for the reset button contact (ms)
    pub reset_confirm_ms: u64,
    /// Upper bound on waiting for reset-button release (ms)
    pub release_wait_ms: u64,
}

impl Default for EncoderCfg {
    fn default() -> Self {
        Self {
            debounce_ms: 5,
            reset_confirm_ms: 30,
            release_wait_ms: 5000,
        }
    }
}

/// Access-point identity and telemetry port. Bootstrap-only.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkCfg {
    pub ssid: String,
    pub password: String,
    pub port: u16,
}

impl Default for NetworkCfg {
    fn default() -> Self {
        Self {
            ssid: "ESP32-Radar".to_string(),
            password: "12345678".to_string(),
            port: 80,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub pins: Pins,
    pub sweep: SweepCfg,
    pub detection: DetectionCfg,
    pub sensor: SensorCfg,
    pub encoder: EncoderCfg,
    pub network: NetworkCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Sweep
        if self.sweep.step_deg <= 0 {
            eyre::bail!("sweep.step_deg must be > 0");
        }
        if self.sweep.min_deg < 0 || self.sweep.max_deg > 180 {
            eyre::bail!("sweep arc must stay within [0, 180] degrees");
        }
        if self.sweep.min_deg >= self.sweep.max_deg {
            eyre::bail!("sweep.min_deg must be below sweep.max_deg");
        }
        if self.sweep.step_deg > self.sweep.max_deg - self.sweep.min_deg {
            eyre::bail!("sweep.step_deg exceeds the arc span");
        }

        // Detection
        if !self.detection.min_range_cm.is_finite()
            || !self.detection.max_range_cm.is_finite()
            || !self.detection.default_range_cm.is_finite()
        {
            eyre::bail!("detection ranges must be finite");
        }
        if self.detection.min_range_cm <= 0.0 {
            eyre::bail!("detection.min_range_cm must be > 0");
        }
        if self.detection.min_range_cm >= self.detection.max_range_cm {
            eyre::bail!("detection.min_range_cm must be below detection.max_range_cm");
        }
        if self.detection.default_range_cm < self.detection.min_range_cm
            || self.detection.default_range_cm > self.detection.max_range_cm
        {
            eyre::bail!("detection.default_range_cm must be within [min_range_cm, max_range_cm]");
        }
        if !(self.detection.range_increment_cm > 0.0) {
            eyre::bail!("detection.range_increment_cm must be > 0");
        }

        // Sensor
        if self.sensor.echo_timeout_ms == 0 {
            eyre::bail!("sensor.echo_timeout_ms must be >= 1");
        }
        if !(self.sensor.cm_per_us > 0.0) || !self.sensor.cm_per_us.is_finite() {
            eyre::bail!("sensor.cm_per_us must be a positive finite value");
        }

        // Encoder
        if self.encoder.debounce_ms == 0 {
            eyre::bail!("encoder.debounce_ms must be >= 1");
        }
        if self.encoder.reset_confirm_ms == 0 {
            eyre::bail!("encoder.reset_confirm_ms must be >= 1");
        }
        if self.encoder.release_wait_ms == 0 {
            eyre::bail!("encoder.release_wait_ms must be >= 1");
        }

        // Network (bootstrap only, still sanity-checked)
        if self.network.ssid.is_empty() {
            eyre::bail!("network.ssid must not be empty");
        }

        // Logging
        if let Some(level) = &self.logging.level {
            match level.as_str() {
                "error" | "warn" | "info" | "debug" | "trace" => {}
                other => eyre::bail!("logging.level '{other}' is not a valid level"),
            }
        }
        if let Some(rot) = &self.logging.rotation {
            match rot.as_str() {
                "never" | "daily" | "hourly" => {}
                other => eyre::bail!("logging.rotation '{other}' is not a valid policy"),
            }
        }

        Ok(())
    }
}
