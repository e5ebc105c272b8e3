//! Reconnect backoff schedule for a dropped market-data connection.

use std::time::Duration;

/// Exponential backoff with a configurable ceiling, used by the live
/// wiring's reconnect loop: on a WebSocket drop, a backoff-retry connect
/// is scheduled rather than hammering the feed immediately.
#[derive(Clone, Copy, Debug)]
pub struct BackoffSchedule {
    base: Duration,
    max: Duration,
    attempt: u32,
}

impl BackoffSchedule {
    pub fn new(base: Duration, max: Duration) -> Self {
        BackoffSchedule { base, max, attempt: 0 }
    }

    /// Delay before the next reconnect attempt, doubling each call and
    /// clamped at `max`.
    pub fn next_delay(&mut self) -> Duration {
        let multiplier = 1u32.checked_shl(self.attempt).unwrap_or(u32::MAX);
        let scaled = self.base.checked_mul(multiplier).unwrap_or(self.max);
        self.attempt = self.attempt.saturating_add(1);
        scaled.min(self.max)
    }

    /// Reset the schedule after a successful reconnect.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}
