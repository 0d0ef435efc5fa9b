//! Linear backoff between attempts

use std::time::Duration;

/// Linear backoff: the wait after failed attempt `n` is `interval * n`
///
/// There is no cap; with the small attempt counts used for establishment and
/// retried execution the schedule stays short.
///
/// ```
/// use std::time::Duration;
/// use steadydb_connection::LinearBackoff;
///
/// let backoff = LinearBackoff::new(Duration::from_secs(1));
/// assert_eq!(backoff.delay_for(1), Duration::from_secs(1));
/// assert_eq!(backoff.delay_for(3), Duration::from_secs(3));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearBackoff {
    interval: Duration,
}

impl LinearBackoff {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait after the failed attempt `attempt` (1-indexed)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.interval.saturating_mul(attempt)
    }

    /// Every wait taken when all `max_attempts` attempts fail
    ///
    /// No wait follows the final attempt, so this has `max_attempts - 1` entries.
    pub fn schedule(&self, max_attempts: u32) -> Vec<Duration> {
        (1..max_attempts).map(|attempt| self.delay_for(attempt)).collect()
    }

    /// Sum of `schedule(max_attempts)`
    pub fn total_wait(&self, max_attempts: u32) -> Duration {
        self.schedule(max_attempts)
            .into_iter()
            .fold(Duration::ZERO, Duration::saturating_add)
    }
}
