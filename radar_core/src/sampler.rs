//! Noise-filtered distance sampling.
//!
//! One sample is three pings in quick succession with a short pause
//! between them to avoid cross-talk; the median of the three suppresses
//! single-outlier echoes (spurious near-zero or saturated readings)
//! better than a mean would. A no-echo timeout becomes the max-range
//! sentinel *before* the median, keeping the filter well-defined over
//! exactly three values. This never fails: a faulty sensor degrades to
//! "nothing detected".

use std::time::Duration;

use radar_traits::{Clock, RangeSensor};

use crate::util::median3;

/// One filtered distance measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistanceSample {
    /// Median of the three raw conversions, before range clamping.
    pub raw_mm: i32,
    /// Final result, always in (0, max_range_mm].
    pub filtered_mm: i32,
}

#[derive(Debug, Clone)]
pub struct RangeSampler {
    echo_timeout: Duration,
    inter_sample: Duration,
    /// Derived from the speed of sound: mm of one-way distance per
    /// microsecond of round-trip echo time.
    mm_per_us: f32,
    max_range_mm: i32,
}

impl RangeSampler {
    pub fn new(
        echo_timeout: Duration,
        inter_sample: Duration,
        cm_per_us: f32,
        max_range_mm: i32,
    ) -> Self {
        Self {
            echo_timeout,
            inter_sample,
            mm_per_us: cm_per_us * 10.0 / 2.0,
            max_range_mm,
        }
    }

    /// Convert an echo round-trip time to millimeters, saturating.
    fn echo_to_mm(&self, echo: Duration) -> i32 {
        let mm = (echo.as_micros() as f32) * self.mm_per_us;
        if !mm.is_finite() || mm >= i32::MAX as f32 {
            i32::MAX
        } else {
            mm.round() as i32
        }
    }

    /// Take one filtered sample. Blocks for up to three echo timeouts
    /// plus two inter-sample pauses; bounded and predictable.
    pub fn sample<S: RangeSensor + ?Sized>(
        &self,
        sensor: &mut S,
        clock: &dyn Clock,
    ) -> DistanceSample {
        let mut raws = [0i32; 3];
        for (i, slot) in raws.iter_mut().enumerate() {
            if i > 0 {
                clock.sleep(self.inter_sample);
            }
            *slot = match sensor.ping(self.echo_timeout) {
                Ok(Some(echo)) => self.echo_to_mm(echo),
                // No echo within the timeout: nothing in range.
                Ok(None) => i32::MAX,
                Err(e) => {
                    tracing::warn!(error = %e, "range sensor fault; treating as max range");
                    i32::MAX
                }
            };
        }
        let raw_mm = median3(raws[0], raws[1], raws[2]);
        let filtered_mm = if raw_mm <= 0 || raw_mm > self.max_range_mm {
            self.max_range_mm
        } else {
            raw_mm
        };
        DistanceSample {
            raw_mm,
            filtered_mm,
        }
    }
}
