//! Timeout escalation for export link downloads.

use std::time::Duration;

/// Per-attempt timeout schedule.
///
/// Attempt `n` (0-based) runs with `initial_timeout * 2^n`. After a timed-out
/// attempt the client pauses for half of the timeout it just used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub initial_timeout: Duration,
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { initial_timeout: Duration::from_secs(30), max_retries: 3 }
    }
}

impl RetryPolicy {
    /// Total attempts, the first one included.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Timeout for the given 0-based attempt.
    pub fn timeout_for(&self, attempt: u32) -> Duration {
        self.initial_timeout.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Pause after an attempt that timed out with `timeout`.
    pub fn pause_after(timeout: Duration) -> Duration {
        timeout / 2
    }

    /// Timeouts of every attempt, in order.
    pub fn schedule(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.max_attempts()).map(|attempt| self.timeout_for(attempt))
    }
}
