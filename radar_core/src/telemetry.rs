//! Telemetry publication for external observers.
//!
//! Two pieces: a copy-on-read snapshot store (single writer, many
//! readers, last-write-wins) and a request/reply bus for the remote
//! observer. The control loop services at most one pending query per
//! iteration, so requests never queue against it.

use crossbeam_channel as xch;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::util::mm_to_cm;

/// Read-only projection of the latest completed sample. Always a full
/// triple from one iteration, never a half-updated mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TelemetrySnapshot {
    pub angle_deg: i32,
    pub distance_mm: i32,
    pub range_mm: i32,
}

impl TelemetrySnapshot {
    pub fn distance_cm(&self) -> f32 {
        mm_to_cm(self.distance_mm)
    }

    pub fn range_cm(&self) -> f32 {
        mm_to_cm(self.range_mm)
    }

    /// Flat wire record: integer degrees, one fractional cm digit.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "angle": self.angle_deg,
            "distance": self.distance_cm(),
            "range": self.range_cm(),
        })
    }
}

/// Shared snapshot store. Cloning yields another handle onto the same
/// slot; readers copy the whole triple under a short lock and never
/// observe a torn write. Before the first publication every read
/// returns the zero snapshot.
#[derive(Debug, Clone, Default)]
pub struct TelemetryPublisher {
    slot: Arc<Mutex<TelemetrySnapshot>>,
}

impl TelemetryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Control-loop side: replace the snapshot wholesale.
    pub fn publish(&self, snap: TelemetrySnapshot) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = snap;
        }
    }

    /// Observer side: copy of the latest triple. Side-effect free and
    /// idempotent between control-loop iterations.
    pub fn snapshot(&self) -> TelemetrySnapshot {
        self.slot.lock().map(|g| *g).unwrap_or_default()
    }
}

struct Query {
    reply: xch::Sender<TelemetrySnapshot>,
}

/// Request/reply endpoint for the remote observer.
pub struct TelemetryBus {
    tx: xch::Sender<Query>,
    rx: xch::Receiver<Query>,
}

impl Default for TelemetryBus {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryBus {
    pub fn new() -> Self {
        // Capacity 1: a second request while one is pending is refused
        // at the client, not queued against the control loop.
        let (tx, rx) = xch::bounded(1);
        Self { tx, rx }
    }

    pub fn client(&self) -> TelemetryClient {
        TelemetryClient {
            tx: self.tx.clone(),
        }
    }

    /// Serve at most one pending query. Never blocks.
    pub fn serve_one(&self, snap: TelemetrySnapshot) -> bool {
        match self.rx.try_recv() {
            Ok(q) => {
                // Client may have timed out and gone away; fine.
                let _ = q.reply.send(snap);
                true
            }
            Err(_) => false,
        }
    }
}

/// Cheap cloneable handle for observer threads.
#[derive(Clone)]
pub struct TelemetryClient {
    tx: xch::Sender<Query>,
}

impl TelemetryClient {
    /// Request the current snapshot, waiting up to `timeout` for the
    /// control loop to service it. `None` on timeout or when another
    /// request is already pending.
    pub fn request(&self, timeout: Duration) -> Option<TelemetrySnapshot> {
        let (reply_tx, reply_rx) = xch::bounded(1);
        if self.tx.try_send(Query { reply: reply_tx }).is_err() {
            return None;
        }
        reply_rx.recv_timeout(timeout).ok()
    }
}
