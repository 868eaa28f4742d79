//! Mappings from the TOML-facing config schema into the core's own
//! configuration structs. Keeps `radar_config` a pure schema crate.

use crate::{DetectionCfg, ResetCfg, SensorCfg, SweepCfg};

impl From<&radar_config::SweepCfg> for SweepCfg {
    fn from(c: &radar_config::SweepCfg) -> Self {
        Self {
            step_deg: c.step_deg,
            min_deg: c.min_deg,
            max_deg: c.max_deg,
            delay_ms: c.delay_ms,
            hold_ms: c.hold_ms,
        }
    }
}

impl From<&radar_config::DetectionCfg> for DetectionCfg {
    fn from(c: &radar_config::DetectionCfg) -> Self {
        Self {
            default_range_cm: c.default_range_cm,
            min_range_cm: c.min_range_cm,
            max_range_cm: c.max_range_cm,
            range_increment_cm: c.range_increment_cm,
            ui_stall_ms: c.ui_stall_ms,
        }
    }
}

impl From<&radar_config::SensorCfg> for SensorCfg {
    fn from(c: &radar_config::SensorCfg) -> Self {
        Self {
            echo_timeout_ms: c.echo_timeout_ms,
            inter_sample_ms: c.inter_sample_ms,
            cm_per_us: c.cm_per_us,
        }
    }
}

impl From<&radar_config::EncoderCfg> for ResetCfg {
    fn from(c: &radar_config::EncoderCfg) -> Self {
        Self {
            confirm_ms: c.reset_confirm_ms,
            release_wait_ms: c.release_wait_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_across_the_schema_boundary() {
        let cfg = radar_config::Config::default();
        let sweep = SweepCfg::from(&cfg.sweep);
        assert_eq!(sweep.step_deg, 5);
        assert_eq!(sweep.max_deg, 180);
        let det = DetectionCfg::from(&cfg.detection);
        assert_eq!(det.default_range_cm, 50.0);
        let reset = ResetCfg::from(&cfg.encoder);
        assert_eq!(reset.confirm_ms, 30);
        assert_eq!(reset.release_wait_ms, 5000);
    }
}
