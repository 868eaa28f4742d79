//! Detection-range adjustment from encoder clicks.
//!
//! Consumes the encoder accumulator exactly once per control-loop
//! iteration. Clamping at either bound also rolls the accumulator
//! back, so turning past the floor accrues no "debt" that would have
//! to be unwound before the threshold starts moving again.

use crate::util::mm_to_cm;

/// Outcome of consuming the encoder delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdUpdate {
    /// No pending clicks; nothing to do.
    Unchanged,
    /// Threshold moved (or was re-confirmed at a clamped bound).
    Changed {
        range_mm: i32,
        /// The accumulator must be rewound to `last_consumed`.
        rolled_back: bool,
    },
}

#[derive(Debug)]
pub struct ThresholdController {
    range_mm: i32,
    default_mm: i32,
    min_mm: i32,
    max_mm: i32,
    increment_mm: i32,
    last_consumed: i32,
}

impl ThresholdController {
    pub fn new(default_mm: i32, min_mm: i32, max_mm: i32, increment_mm: i32) -> Self {
        Self {
            range_mm: default_mm.clamp(min_mm, max_mm),
            default_mm,
            min_mm,
            max_mm,
            increment_mm,
            last_consumed: 0,
        }
    }

    pub fn range_mm(&self) -> i32 {
        self.range_mm
    }

    pub fn range_cm(&self) -> f32 {
        mm_to_cm(self.range_mm)
    }

    pub fn last_consumed(&self) -> i32 {
        self.last_consumed
    }

    /// Apply the net clicks since the last consumption.
    ///
    /// In-bounds: threshold moves by `delta * increment` and
    /// `last_consumed` catches up to the accumulator. Out of bounds:
    /// threshold clamps, `last_consumed` stays put and the caller must
    /// rewind the accumulator to it, so the very next click moves the
    /// threshold off the bound. A clamped turn still reports `Changed`
    /// so the user sees a confirmation at the bound value.
    pub fn apply(&mut self, accumulator: i32) -> ThresholdUpdate {
        let delta = accumulator - self.last_consumed;
        if delta == 0 {
            return ThresholdUpdate::Unchanged;
        }
        let raw = self
            .range_mm
            .saturating_add(delta.saturating_mul(self.increment_mm));
        let clamped = raw.clamp(self.min_mm, self.max_mm);
        let rolled_back = raw != clamped;
        if rolled_back {
            tracing::debug!(
                raw_mm = raw,
                clamped_mm = clamped,
                "threshold clamped; rewinding encoder"
            );
        } else {
            self.last_consumed = accumulator;
        }
        self.range_mm = clamped;
        ThresholdUpdate::Changed {
            range_mm: clamped,
            rolled_back,
        }
    }

    /// Direct reset from the manual button: back to the configured
    /// default, click history discarded.
    pub fn reset(&mut self) {
        self.range_mm = self.default_mm.clamp(self.min_mm, self.max_mm);
        self.last_consumed = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller_at_min() -> ThresholdController {
        // min 30 cm, max 60 cm, 5 cm per click, starting at the floor.
        ThresholdController::new(300, 300, 600, 50)
    }

    #[test]
    fn clamp_at_floor_rolls_accumulator_back() {
        let mut t = controller_at_min();
        match t.apply(-2) {
            ThresholdUpdate::Changed {
                range_mm,
                rolled_back,
            } => {
                assert_eq!(range_mm, 300);
                assert!(rolled_back);
            }
            other => panic!("expected Changed, got {other:?}"),
        }
        // Caller rewinds the accumulator to last_consumed (0); one
        // clockwise click then raises the threshold immediately.
        assert_eq!(t.last_consumed(), 0);
        match t.apply(1) {
            ThresholdUpdate::Changed { range_mm, .. } => assert_eq!(range_mm, 350),
            other => panic!("expected Changed, got {other:?}"),
        }
    }

    #[test]
    fn clamp_at_ceiling_is_symmetric() {
        let mut t = ThresholdController::new(600, 300, 600, 50);
        match t.apply(3) {
            ThresholdUpdate::Changed {
                range_mm,
                rolled_back,
            } => {
                assert_eq!(range_mm, 600);
                assert!(rolled_back);
            }
            other => panic!("expected Changed, got {other:?}"),
        }
        match t.apply(-1) {
            ThresholdUpdate::Changed { range_mm, .. } => assert_eq!(range_mm, 550),
            other => panic!("expected Changed, got {other:?}"),
        }
    }

    #[test]
    fn delta_is_consumed_exactly_once() {
        let mut t = ThresholdController::new(400, 300, 600, 50);
        assert!(matches!(t.apply(2), ThresholdUpdate::Changed { .. }));
        assert_eq!(t.range_mm(), 500);
        // Same accumulator value again: no pending delta.
        assert_eq!(t.apply(2), ThresholdUpdate::Unchanged);
    }

    #[test]
    fn reset_restores_default_and_zeroes_history() {
        let mut t = ThresholdController::new(500, 300, 600, 50);
        let _ = t.apply(-3);
        t.reset();
        assert_eq!(t.range_mm(), 500);
        assert_eq!(t.last_consumed(), 0);
    }
}
