//! Progress percentage tracking
//!
//! Each processed item (done or failed) adds a fixed floor share; while an
//! item is in flight its share is filled in gradually from a wall-clock
//! estimate. The value never decreases and stays at or below 95 until the
//! batch is finished.

use std::time::{Duration, Instant};

/// Ceiling for everything but the final value
pub const IN_FLIGHT_CEILING: f64 = 95.0;

/// Part of an item's share the estimate may fill before the result arrives
const MAX_ITEM_FILL: f64 = 0.9;

#[derive(Debug, Clone)]
pub struct ProgressTracker {
    total: usize,
    processed: usize,
    expected_item: Duration,
    item_started: Option<Instant>,
    last: f64,
}

impl ProgressTracker {
    /// `processed` lets a resumed run start from its checkpoint
    pub fn new(total: usize, processed: usize, expected_item: Duration) -> Self {
        let mut tracker = Self {
            total,
            processed: processed.min(total),
            expected_item,
            item_started: None,
            last: 0.0,
        };
        tracker.last = tracker.floor().min(IN_FLIGHT_CEILING);
        tracker
    }

    /// Never report less than `percent`, the value a checkpoint last showed
    pub fn resume_from(mut self, percent: f64) -> Self {
        self.emit(percent);
        self
    }

    fn share(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            100.0 / self.total as f64
        }
    }

    fn floor(&self) -> f64 {
        self.processed as f64 * self.share()
    }

    fn emit(&mut self, candidate: f64) -> f64 {
        let capped = candidate.min(IN_FLIGHT_CEILING);
        if capped > self.last {
            self.last = capped;
        }
        self.last
    }

    pub fn begin_item(&mut self, now: Instant) {
        self.item_started = Some(now);
    }

    /// Interpolated value for the item in flight
    pub fn tick(&mut self, now: Instant) -> f64 {
        let fill = match self.item_started {
            Some(started) if !self.expected_item.is_zero() => {
                let elapsed = now.saturating_duration_since(started).as_secs_f64();
                (elapsed / self.expected_item.as_secs_f64()).min(MAX_ITEM_FILL)
            }
            _ => 0.0,
        };
        self.emit(self.floor() + fill * self.share())
    }

    /// The current item reached a terminal state
    pub fn finish_item(&mut self) -> f64 {
        self.item_started = None;
        self.processed = (self.processed + 1).min(self.total);
        self.emit(self.floor())
    }

    /// Batch finished: exactly 100
    pub fn complete(&mut self) -> f64 {
        self.item_started = None;
        self.processed = self.total;
        self.last = 100.0;
        self.last
    }

    pub fn current(&self) -> f64 {
        self.last
    }
}
