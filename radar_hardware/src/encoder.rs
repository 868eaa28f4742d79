//! KY-040 quadrature encoder wired through GPIO interrupts.
//!
//! The interrupt callback only reads pin levels and calls the
//! lock-free edge handler; all decoding policy lives in
//! `radar_core::EncoderState`.

use std::sync::Arc;
use std::time::Instant;

use rppal::gpio::{InputPin, Level, Trigger};

use radar_core::EncoderState;

use crate::error::Result;

pub struct QuadratureEncoder {
    // Held so the interrupt registration stays alive.
    _clk: InputPin,
}

impl QuadratureEncoder {
    /// Attach the edge handler to both transitions of the clock line.
    /// The DT line is sampled inside the callback at the instant of
    /// the edge.
    pub fn attach(mut clk: InputPin, dt: InputPin, state: Arc<EncoderState>) -> Result<Self> {
        let epoch = Instant::now();
        clk.set_async_interrupt(Trigger::Both, move |level: Level| {
            let now_ms = epoch.elapsed().as_millis() as u64;
            state.on_clk_edge(level == Level::High, dt.is_high(), now_ms);
        })?;
        Ok(Self { _clk: clk })
    }
}
