//! Cooperative cadence timer and loop timing.

use std::time::Duration;
use tokio::time::Instant;

/// Loop timing knobs. Defaults: hourly cycles, one-minute polling,
/// five-minute backoff after a failed cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopTiming {
    pub cadence: Duration,
    pub poll_interval: Duration,
    pub error_backoff: Duration,
    /// Run the first cycle immediately instead of one cadence after start
    pub run_on_start: bool,
}

impl Default for LoopTiming {
    fn default() -> Self {
        Self {
            cadence: Duration::from_secs(3600),
            poll_interval: Duration::from_secs(60),
            error_backoff: Duration::from_secs(300),
            run_on_start: false,
        }
    }
}

/// Fires once per cadence. Checked by polling; never wakes anyone itself.
#[derive(Debug, Clone)]
pub struct CadenceSchedule {
    cadence: Duration,
    next_run: Instant,
}

impl CadenceSchedule {
    pub fn new(cadence: Duration, now: Instant, run_on_start: bool) -> Self {
        let next_run = if run_on_start { now } else { now + cadence };
        Self { cadence, next_run }
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.next_run
    }

    /// Record a run; the next one is a full cadence from `now`
    pub fn mark_run(&mut self, now: Instant) {
        self.next_run = now + self.cadence;
    }

    pub fn time_until_due(&self, now: Instant) -> Duration {
        self.next_run.saturating_duration_since(now)
    }

    pub fn next_run(&self) -> Instant {
        self.next_run
    }
}
