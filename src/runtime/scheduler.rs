//! Fixed-period tick scheduler.
//!
//! Ticks are spaced by deadline rather than by sleeping after each pass, so
//! the cadence does not drift with computation time. When a tick overruns,
//! the next one is delayed by a full period instead of bursting to catch up.

use tokio::time::{interval, Duration, Interval, MissedTickBehavior};

/// Wakes the control loop once per period.
#[derive(Debug)]
pub struct TickScheduler {
    interval: Interval,
    period: Duration,
}

impl TickScheduler {
    /// Creates a scheduler. The first [`TickScheduler::wait`] completes immediately.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn new(period: Duration) -> Self {
        let mut interval = interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval, period }
    }

    /// Waits for the next tick deadline.
    pub async fn wait(&mut self) {
        self.interval.tick().await;
    }

    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }
}
