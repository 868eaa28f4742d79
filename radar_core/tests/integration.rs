//! End-to-end controller behavior over scripted devices and a
//! deterministic clock.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use radar_core::mocks::{ScriptedReset, ScriptedSensor, SpyAlert, SpyDisplay, SpyServo};
use radar_core::{
    DetectionStatus, EncoderState, RadarCore, ResetCfg, ScanStatus, TelemetrySnapshot, runner,
};
use radar_traits::{Clock, TestClock};

/// One full encoder detent: clock falls (direction decided by DT) and
/// rises again a few milliseconds later.
fn detent(enc: &EncoderState, clockwise: bool, at_ms: u64) {
    enc.on_clk_edge(false, clockwise, at_ms);
    enc.on_clk_edge(true, !clockwise, at_ms + 10);
}

fn core_with(
    sensor: ScriptedSensor,
    servo: SpyServo,
    alert: SpyAlert,
    display: SpyDisplay,
) -> RadarCore {
    RadarCore::builder()
        .with_sensor(sensor)
        .with_servo(servo)
        .with_alert(alert)
        .with_display(display)
        .with_clock(Box::new(TestClock::new()))
        .try_build()
        .unwrap()
}

#[test]
fn sweep_freezes_on_detection_and_resumes_on_clear() {
    // Empty room twice, object at 45 cm for three iterations, gone.
    let sensor = ScriptedSensor::from_cm_per_step(&[
        Some(60.0),
        Some(60.0),
        Some(45.0),
        Some(45.0),
        Some(45.0),
        Some(55.0),
    ]);
    let servo = SpyServo::new();
    let alert = SpyAlert::new();
    let display = SpyDisplay::new();
    let servo_log = servo.log();
    let alert_edges = alert.edges();

    let mut core = core_with(sensor, servo, alert, display);
    core.begin();

    let statuses: Vec<_> = (0..6).map(|_| core.step()).collect();

    assert!(matches!(statuses[0], ScanStatus::Swept { angle_deg: 0, .. }));
    assert!(matches!(statuses[1], ScanStatus::Swept { angle_deg: 5, .. }));
    assert!(matches!(
        statuses[2],
        ScanStatus::Holding {
            angle_deg: 10,
            distance_mm: 450
        }
    ));
    assert!(matches!(statuses[3], ScanStatus::Holding { angle_deg: 10, .. }));
    assert!(matches!(statuses[4], ScanStatus::Holding { angle_deg: 10, .. }));
    assert!(matches!(statuses[5], ScanStatus::Swept { angle_deg: 10, .. }));

    // Commanded angles: the hold repeats 10 until the zone clears.
    let log = servo_log.lock().unwrap();
    assert_eq!(*log, vec![0, 0, 5, 10, 10, 10, 10]);
    drop(log);

    // Alert toggles exactly once per edge: off at begin, on at entry,
    // off at exit.
    let edges = alert_edges.lock().unwrap();
    assert_eq!(*edges, vec![false, true, false]);
    drop(edges);

    // The sweep resumed after the clearing iteration.
    assert_eq!(core.angle_deg(), 15);
    assert_eq!(core.status(), DetectionStatus::Idle);
}

#[test]
fn detection_banner_appears_exactly_once_per_entry() {
    let sensor =
        ScriptedSensor::from_cm_per_step(&[Some(40.0), Some(40.0), Some(40.0), Some(60.0)]);
    let display = SpyDisplay::new();
    let lines = display.lines();
    let mut core = core_with(sensor, SpyServo::new(), SpyAlert::new(), display);
    core.begin();
    for _ in 0..4 {
        core.step();
    }
    let lines = lines.lock().unwrap();
    let banners = lines
        .iter()
        .filter(|(l1, _)| l1 == "Object detected!")
        .count();
    assert_eq!(banners, 1);
    let cleared = lines.iter().filter(|(l1, _)| l1 == "Object cleared").count();
    assert_eq!(cleared, 1);
}

#[test]
fn encoder_clicks_adjust_the_detection_range() {
    let sensor = ScriptedSensor::new(vec![None]);
    let enc = Arc::new(EncoderState::new(5));
    let mut core = RadarCore::builder()
        .with_sensor(sensor)
        .with_servo(SpyServo::new())
        .with_encoder(enc.clone())
        .with_clock(Box::new(TestClock::new()))
        .try_build()
        .unwrap();
    core.begin();
    assert_eq!(core.detection_range_cm(), 50.0);

    // One clockwise detent, then an iteration consumes it.
    detent(&enc, true, 100);
    core.step();
    assert_eq!(core.detection_range_cm(), 55.0);

    // Two counter-clockwise detents.
    detent(&enc, false, 200);
    detent(&enc, false, 300);
    core.step();
    assert_eq!(core.detection_range_cm(), 45.0);
}

#[test]
fn clamped_adjustment_does_not_accrue_click_debt() {
    let sensor = ScriptedSensor::new(vec![None]);
    let enc = Arc::new(EncoderState::new(5));
    let mut core = RadarCore::builder()
        .with_sensor(sensor)
        .with_servo(SpyServo::new())
        .with_encoder(enc.clone())
        .with_clock(Box::new(TestClock::new()))
        .try_build()
        .unwrap();
    core.begin();

    // Three clockwise detents push past the 60 cm ceiling.
    detent(&enc, true, 100);
    detent(&enc, true, 200);
    detent(&enc, true, 300);
    core.step();
    assert_eq!(core.detection_range_cm(), 60.0);
    // The overshoot was rolled back, so a single counter-clockwise
    // click moves the threshold immediately.
    assert_eq!(enc.accumulator(), 0);
    detent(&enc, false, 400);
    core.step();
    assert_eq!(core.detection_range_cm(), 55.0);
}

#[test]
fn reset_button_restores_the_default_range() {
    let sensor = ScriptedSensor::new(vec![None]);
    let enc = Arc::new(EncoderState::new(5));
    let display = SpyDisplay::new();
    let lines = display.lines();
    let mut core = RadarCore::builder()
        .with_sensor(sensor)
        .with_servo(SpyServo::new())
        .with_display(display)
        .with_encoder(enc.clone())
        .with_reset_input(ScriptedReset::new([false, true, true]))
        .with_clock(Box::new(TestClock::new()))
        .try_build()
        .unwrap();
    core.begin();

    // Dial the range away from the default first.
    enc.on_clk_edge(false, false, 100);
    core.step();
    assert_eq!(core.detection_range_cm(), 45.0);

    // Press held across the confirmation pause on the next iteration.
    core.step();
    assert_eq!(core.detection_range_cm(), 50.0);
    assert_eq!(enc.accumulator(), 0);
    let lines = lines.lock().unwrap();
    assert!(lines.iter().any(|(l1, l2)| l1 == "Range reset" && l2 == "50.0 cm"));
}

#[test]
fn bounced_reset_press_is_ignored() {
    let sensor = ScriptedSensor::new(vec![None]);
    let mut core = RadarCore::builder()
        .with_sensor(sensor)
        .with_servo(SpyServo::new())
        .with_reset_input(ScriptedReset::new([true, false]))
        .with_clock(Box::new(TestClock::new()))
        .try_build()
        .unwrap();
    core.begin();
    core.step();
    assert_eq!(core.detection_range_cm(), 50.0);
}

#[test]
fn held_reset_button_resumes_after_the_wait_bound() {
    // The script never releases the button; the release wait must give
    // up at the configured bound instead of spinning forever.
    let clock = TestClock::new();
    let start = clock.now();
    let mut core = RadarCore::builder()
        .with_sensor(ScriptedSensor::new(vec![None]))
        .with_servo(SpyServo::new())
        .with_reset_input(ScriptedReset::new(vec![true; 4096]))
        .with_reset_cfg(ResetCfg {
            confirm_ms: 30,
            release_wait_ms: 200,
        })
        .with_clock(Box::new(clock.clone()))
        .try_build()
        .unwrap();
    core.begin();

    core.step();
    assert_eq!(core.detection_range_cm(), 50.0);
    let waited = clock.now().saturating_duration_since(start);
    assert!(waited >= Duration::from_millis(200));
    // Well under the time a full drain of the script would take.
    assert!(waited < Duration::from_secs(2));
}

#[test]
fn local_telemetry_handle_starts_zeroed_and_tracks_the_loop() {
    let sensor = ScriptedSensor::from_cm_per_step(&[Some(30.0), Some(20.0)]);
    let mut core = core_with(sensor, SpyServo::new(), SpyAlert::new(), SpyDisplay::new());

    // Observer handle taken before any sample: zero snapshot.
    let observer = core.telemetry();
    assert_eq!(observer.snapshot(), TelemetrySnapshot::default());

    core.begin();
    core.step();
    let snap = observer.snapshot();
    assert_eq!(snap.angle_deg, 0);
    assert_eq!(snap.distance_mm, 300);
    assert_eq!(snap.range_mm, 500);

    core.step();
    assert_eq!(observer.snapshot().distance_mm, 200);
}

#[test]
fn telemetry_request_is_serviced_by_the_loop() {
    let sensor = ScriptedSensor::from_cm_per_step(&[Some(30.0)]);
    let mut core = core_with(sensor, SpyServo::new(), SpyAlert::new(), SpyDisplay::new());
    core.begin();
    core.step(); // publish the first snapshot

    let client = core.telemetry_client();
    let handle = std::thread::spawn(move || client.request(Duration::from_secs(5)));
    let mut budget = 10_000u32;
    while !handle.is_finished() {
        core.step();
        budget -= 1;
        assert!(budget > 0, "telemetry request never serviced");
    }
    let snap = handle.join().unwrap().unwrap();
    assert_eq!(snap.distance_mm, 300);
    assert_eq!(snap.range_mm, 500);
}

#[test]
fn quiesce_drops_an_active_alert() {
    let sensor = ScriptedSensor::from_cm_per_step(&[Some(20.0)]);
    let alert = SpyAlert::new();
    let edges = alert.edges();
    let mut core = core_with(sensor, SpyServo::new(), alert, SpyDisplay::new());
    core.begin();
    for _ in 0..3 {
        core.step();
    }
    assert_eq!(core.status(), DetectionStatus::Detecting);
    core.quiesce();
    let edges = edges.lock().unwrap();
    assert_eq!(*edges, vec![false, true, false]);
}

#[test]
fn runner_stops_after_the_sweep_budget_over_an_empty_room() {
    let mut core = core_with(
        ScriptedSensor::new(vec![None]),
        SpyServo::new(),
        SpyAlert::new(),
        SpyDisplay::new(),
    );
    let shutdown = AtomicBool::new(false);
    let steps = runner::run(&mut core, &shutdown, Some(2));
    assert_eq!(steps, 144);
    assert_eq!(core.sweeps_completed(), 2);
}
