//! Scan execution: config mapping, device assembly, and loop driving.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use radar_core::{DetectionCfg, EncoderState, RadarCore, ResetCfg, SensorCfg, SweepCfg, runner};

use crate::cli::JSON_MODE;

pub struct ScanOverrides {
    pub sweeps: Option<u64>,
    pub range_cm: Option<f32>,
    pub step_deg: Option<i32>,
    pub delay_ms: Option<u64>,
    pub stats: bool,
}

pub fn run_scan(
    cfg: &radar_config::Config,
    ov: &ScanOverrides,
    shutdown: Arc<AtomicBool>,
) -> eyre::Result<()> {
    let mut sweep: SweepCfg = (&cfg.sweep).into();
    if let Some(deg) = ov.step_deg {
        sweep.step_deg = deg;
    }
    if let Some(ms) = ov.delay_ms {
        sweep.delay_ms = ms;
    }
    let mut detection: DetectionCfg = (&cfg.detection).into();
    if let Some(cm) = ov.range_cm {
        detection.default_range_cm = cm;
    }
    let sensor: SensorCfg = (&cfg.sensor).into();
    let reset: ResetCfg = (&cfg.encoder).into();

    // Expected iteration period: settle + one filtered sample + hold.
    let expected_us = (sweep.delay_ms
        + 3 * sensor.echo_timeout_ms
        + 2 * sensor.inter_sample_ms
        + sweep.hold_ms)
        .saturating_mul(1000)
        .max(1);

    let (mut core, _encoder_guard) = build_core(cfg, sweep, detection, sensor, reset)?;

    let steps = if ov.stats {
        run_with_stats(&mut core, &shutdown, ov.sweeps, expected_us)
    } else {
        runner::run(&mut core, &shutdown, ov.sweeps)
    };

    if JSON_MODE.get().copied().unwrap_or(false) {
        let summary = serde_json::json!({
            "steps": steps,
            "sweeps": core.sweeps_completed(),
            "range_cm": core.detection_range_cm(),
        });
        println!("{summary}");
    } else {
        println!(
            "Scan complete: {} iterations, {} sweeps, range {:.1} cm",
            steps,
            core.sweeps_completed(),
            core.detection_range_cm()
        );
    }
    Ok(())
}

pub fn self_check(cfg: &radar_config::Config) -> eyre::Result<()> {
    let (mut core, _encoder_guard) = build_core(
        cfg,
        (&cfg.sweep).into(),
        (&cfg.detection).into(),
        (&cfg.sensor).into(),
        (&cfg.encoder).into(),
    )?;
    core.begin();
    core.step();
    println!(
        "self-check ok: angle {} deg, range {:.1} cm",
        core.angle_deg(),
        core.detection_range_cm()
    );
    Ok(())
}

/// Stats variant of the loop: same ordering as `runner::run`, with
/// per-iteration latency collection.
fn run_with_stats(
    core: &mut RadarCore,
    shutdown: &AtomicBool,
    max_sweeps: Option<u64>,
    expected_us: u64,
) -> u64 {
    core.begin();
    tracing::info!(range_cm = core.detection_range_cm(), "scan started");
    let mut latencies: Vec<u64> = Vec::new();
    let mut missed_deadlines = 0usize;
    let mut steps = 0u64;
    while !shutdown.load(Ordering::Relaxed) {
        if let Some(limit) = max_sweeps {
            if core.sweeps_completed() >= limit {
                break;
            }
        }
        let t_start = Instant::now();
        core.step();
        let latency = t_start.elapsed().as_micros() as u64;
        latencies.push(latency);
        if latency > expected_us {
            missed_deadlines += 1;
        }
        steps += 1;
    }
    core.quiesce();
    tracing::info!(steps, sweeps = core.sweeps_completed(), "scan stopped");
    if !latencies.is_empty() {
        print_stats(&latencies, missed_deadlines, expected_us);
    }
    steps
}

/// Print iteration latency stats to stderr.
fn print_stats(latencies: &[u64], missed_deadlines: usize, expected_us: u64) {
    let min = *latencies.iter().min().unwrap_or(&0);
    let max = *latencies.iter().max().unwrap_or(&0);
    let avg = latencies.iter().sum::<u64>() as f64 / latencies.len() as f64;
    let stdev = if latencies.len() > 1 {
        let var = latencies
            .iter()
            .map(|&x| (x as f64 - avg).powi(2))
            .sum::<f64>()
            / (latencies.len() as f64 - 1.0);
        var.sqrt()
    } else {
        0.0
    };
    eprintln!("\n--- Scan Stats ---");
    eprintln!("Iterations: {}", latencies.len());
    eprintln!("Expected period (us): {expected_us}");
    eprintln!("Iteration min/avg/max/stdev (us): {min:.0} / {avg:.1} / {max:.0} / {stdev:.1}");
    eprintln!("Over budget (> expected): {missed_deadlines}");
    eprintln!("------------------\n");
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
fn build_core(
    cfg: &radar_config::Config,
    sweep: SweepCfg,
    detection: DetectionCfg,
    sensor: SensorCfg,
    reset: ResetCfg,
) -> eyre::Result<(RadarCore, ())> {
    use radar_hardware::{ConsoleDisplay, SimulatedAlert, SimulatedSensor, SimulatedServo};
    use std::sync::atomic::AtomicI32;

    let angle = Arc::new(AtomicI32::new(0));
    let encoder = Arc::new(EncoderState::new(cfg.encoder.debounce_ms));
    let core = RadarCore::builder()
        .with_sensor(SimulatedSensor::with_default_scene(angle.clone()))
        .with_servo(SimulatedServo::new(angle))
        .with_alert(SimulatedAlert::new())
        .with_display(ConsoleDisplay)
        .with_encoder(encoder)
        .with_sweep(sweep)
        .with_detection(detection)
        .with_sensor_cfg(sensor)
        .with_reset_cfg(reset)
        .build()?;
    Ok((core, ()))
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
fn build_core(
    cfg: &radar_config::Config,
    sweep: SweepCfg,
    detection: DetectionCfg,
    sensor: SensorCfg,
    reset: ResetCfg,
) -> eyre::Result<(RadarCore, radar_hardware::encoder::QuadratureEncoder)> {
    use radar_hardware::{ConsoleDisplay, GpioPins, GpioRig};

    let encoder = Arc::new(EncoderState::new(cfg.encoder.debounce_ms));
    let pins = GpioPins {
        trig: cfg.pins.trig,
        echo: cfg.pins.echo,
        servo: cfg.pins.servo,
        led: cfg.pins.led,
        buzzer: cfg.pins.buzzer,
        encoder_clk: cfg.pins.encoder_clk,
        encoder_dt: cfg.pins.encoder_dt,
        encoder_sw: cfg.pins.encoder_sw,
    };
    let rig = GpioRig::open(&pins, encoder.clone())?;
    let GpioRig {
        sensor: ranger,
        servo,
        alert,
        reset: reset_button,
        encoder_guard,
    } = rig;

    let builder = RadarCore::builder()
        .with_sensor(ranger)
        .with_servo(servo)
        .with_alert(alert)
        .with_display(ConsoleDisplay)
        .with_encoder(encoder)
        .with_sweep(sweep)
        .with_detection(detection)
        .with_sensor_cfg(sensor)
        .with_reset_cfg(reset);
    let builder = match reset_button {
        Some(button) => builder.with_reset_input(button),
        None => builder,
    };
    Ok((builder.build()?, encoder_guard))
}
