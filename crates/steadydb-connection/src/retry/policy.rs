//! Per-call retry parameters

use std::time::Duration;

use serde::{Deserialize, Serialize};
use steadydb_core::ConnectionConfig;

use super::LinearBackoff;

/// How many times `RetryExecutor::execute` tries an operation and how long it
/// waits between tries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    max_retries: u32,
    retry_interval_ms: u64,
}

impl RetryPolicy {
    /// `max_retries` below 1 is raised to 1; the operation always runs once
    pub fn new(max_retries: u32, retry_interval: Duration) -> Self {
        Self {
            max_retries: max_retries.max(1),
            retry_interval_ms: retry_interval.as_millis() as u64,
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    pub fn backoff(&self) -> LinearBackoff {
        LinearBackoff::new(self.retry_interval())
    }

    /// Wait after the failed attempt `attempt` (1-indexed)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff().delay_for(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

impl From<&ConnectionConfig> for RetryPolicy {
    fn from(config: &ConnectionConfig) -> Self {
        Self::new(config.max_retries(), config.retry_interval())
    }
}
