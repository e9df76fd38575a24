//! # Sync Statistics
//!
//! Counters and timings for synchronization attempts, kept next to the sync
//! state for diagnostics.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncStats {
    /// Attempts that reached the API
    pub total_attempts: u64,
    /// Attempts that landed new records
    pub changed: u64,
    /// Checks that found nothing new
    pub unchanged: u64,
    pub failed: u64,
    /// Ticks or triggers rejected because another attempt was in flight
    pub skipped: u64,
    pub average_duration: Duration,
    pub last_duration: Option<Duration>,
    last_start: Option<Instant>,
}

impl SyncStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_start(&mut self) {
        self.last_start = Some(Instant::now());
        self.total_attempts += 1;
    }

    pub fn record_changed(&mut self) {
        self.changed += 1;
        self.record_completion();
    }

    pub fn record_unchanged(&mut self) {
        self.unchanged += 1;
        self.record_completion();
    }

    pub fn record_failure(&mut self) {
        self.failed += 1;
        self.record_completion();
    }

    pub fn record_skip(&mut self) {
        self.skipped += 1;
    }

    /// Share of attempts that did not fail
    pub fn success_rate(&self) -> f64 {
        if self.total_attempts == 0 {
            0.0
        } else {
            (self.changed + self.unchanged) as f64 / self.total_attempts as f64
        }
    }

    fn record_completion(&mut self) {
        if let Some(start) = self.last_start.take() {
            let duration = start.elapsed();
            self.last_duration = Some(duration);

            let completed = (self.changed + self.unchanged + self.failed) as u32;
            // Rolling average over completed attempts
            let total = self.average_duration * completed.saturating_sub(1) + duration;
            self.average_duration = total / completed.max(1);
        }
    }
}
