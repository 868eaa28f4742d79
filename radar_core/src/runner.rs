//! Scan loop driver.
//!
//! Repeatedly steps the controller until a shutdown flag is raised or
//! an optional sweep budget is exhausted, then quiesces the outputs.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::RadarCore;

/// Drive the controller. Returns the number of iterations executed.
///
/// `shutdown` is polled between iterations, so the worst-case latency
/// from raising the flag to the outputs quiescing is one full
/// iteration (servo settle + three echo timeouts + hold).
pub fn run(core: &mut RadarCore, shutdown: &AtomicBool, max_sweeps: Option<u64>) -> u64 {
    core.begin();
    tracing::info!(
        range_cm = core.detection_range_cm(),
        angle = core.angle_deg(),
        "scan started"
    );
    let mut steps = 0u64;
    while !shutdown.load(Ordering::Relaxed) {
        if let Some(limit) = max_sweeps {
            if core.sweeps_completed() >= limit {
                break;
            }
        }
        core.step();
        steps += 1;
    }
    core.quiesce();
    tracing::info!(
        steps,
        sweeps = core.sweeps_completed(),
        "scan stopped"
    );
    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{ScriptedSensor, SpyServo};
    use crate::{RadarCore, SweepCfg};
    use radar_traits::TestClock;

    #[test]
    fn one_sweep_visits_every_angle_once_per_pass() {
        let servo = SpyServo::new();
        let log = servo.log();
        let mut core = RadarCore::builder()
            .with_sensor(ScriptedSensor::new(vec![None])) // empty room
            .with_servo(servo)
            .with_clock(Box::new(TestClock::new()))
            .try_build()
            .unwrap();

        let shutdown = AtomicBool::new(false);
        let steps = run(&mut core, &shutdown, Some(1));

        // 0..=180 forward (37 commands) plus 175..=5 backward (35).
        assert_eq!(steps, 72);
        let log = log.lock().unwrap();
        // begin() parks the servo at the arc start before the loop.
        assert_eq!(log[0], 0);
        assert_eq!(log[1..38], (0..=180).step_by(5).collect::<Vec<_>>()[..]);
        assert_eq!(
            log[38..],
            (5..=175).rev().step_by(5).collect::<Vec<_>>()[..]
        );
    }

    #[test]
    fn shutdown_flag_stops_the_loop_immediately() {
        let mut core = RadarCore::builder()
            .with_sensor(ScriptedSensor::new(vec![None]))
            .with_servo(SpyServo::new())
            .with_clock(Box::new(TestClock::new()))
            .with_sweep(SweepCfg::default())
            .try_build()
            .unwrap();

        let shutdown = AtomicBool::new(true);
        assert_eq!(run(&mut core, &shutdown, None), 0);
    }
}
