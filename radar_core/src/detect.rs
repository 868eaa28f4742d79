//! Hysteresis-based detection state machine.
//!
//! Side effects (alert outputs, one-shot display banners, sweep
//! freeze) key off the returned edge, so they fire exactly once per
//! transition regardless of how many iterations a state persists.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionStatus {
    Idle,
    Detecting,
}

/// Outcome of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionEdge {
    /// Idle -> Detecting: an object entered the detection zone.
    Entered,
    /// Detecting -> Idle: the zone is clear again.
    Exited,
    /// No transition this iteration.
    Unchanged,
}

#[derive(Debug)]
pub struct DetectionStateMachine {
    status: DetectionStatus,
}

impl Default for DetectionStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectionStateMachine {
    pub fn new() -> Self {
        Self {
            status: DetectionStatus::Idle,
        }
    }

    pub fn status(&self) -> DetectionStatus {
        self.status
    }

    pub fn is_detecting(&self) -> bool {
        self.status == DetectionStatus::Detecting
    }

    /// Compare the filtered distance against the detection range and
    /// report the transition edge, if any. Runs forever; there is no
    /// terminal state.
    pub fn evaluate(&mut self, distance_mm: i32, range_mm: i32) -> DetectionEdge {
        let within = distance_mm <= range_mm;
        match (self.status, within) {
            (DetectionStatus::Idle, true) => {
                self.status = DetectionStatus::Detecting;
                DetectionEdge::Entered
            }
            (DetectionStatus::Detecting, false) => {
                self.status = DetectionStatus::Idle;
                DetectionEdge::Exited
            }
            _ => DetectionEdge::Unchanged,
        }
    }
}
