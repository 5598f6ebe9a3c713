//! Frame cadence driver.
//!
//! Turns a monotonically increasing timestamp (milliseconds since some
//! origin, as a display callback would deliver) into simulation deltas.

use crate::config::LoopConfig;
use std::time::Duration;

/// Decides when a simulation tick is due and how long it may be.
#[derive(Debug, Clone)]
pub struct LoopClock {
    frame_interval: Duration,
    max_delta: Duration,
    last: Option<Duration>,
}

impl LoopClock {
    pub fn new(frame_interval: Duration, max_delta: Duration) -> Self {
        Self {
            frame_interval,
            max_delta,
            last: None,
        }
    }

    pub fn from_config(config: &LoopConfig) -> Self {
        Self::new(config.frame_interval, config.max_delta)
    }

    /// Feed the current timestamp. Returns the tick delta once a full frame
    /// interval has passed since the previous tick, clamped to `max_delta`.
    ///
    /// The first call only anchors the clock. A timestamp that goes
    /// backwards re-anchors without producing a tick.
    pub fn advance(&mut self, now: Duration) -> Option<Duration> {
        let Some(last) = self.last else {
            self.last = Some(now);
            return None;
        };

        if now < last {
            self.last = Some(now);
            return None;
        }

        let elapsed = now - last;
        if elapsed < self.frame_interval {
            return None;
        }

        self.last = Some(now);
        Some(elapsed.min(self.max_delta))
    }

    /// Forget the anchor; the next `advance` starts over.
    pub fn reset(&mut self) {
        self.last = None;
    }

    pub fn max_delta(&self) -> Duration {
        self.max_delta
    }
}

impl Default for LoopClock {
    fn default() -> Self {
        Self::from_config(&LoopConfig::default())
    }
}
