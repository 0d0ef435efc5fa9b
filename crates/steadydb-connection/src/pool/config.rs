//! Pool configuration types

use std::time::Duration;

use serde::{Deserialize, Serialize};
use steadydb_core::{ConnectionConfig, duration_to_millis};
use tokio::sync::Semaphore;

/// Configuration for a connection pool
///
/// Controls pool sizing, checkout timeout, and connection lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Maximum number of idle connections kept for reuse
    max_idle: usize,
    /// Maximum number of connections open at the same time; 0 is unbounded
    max_open: usize,
    /// Timeout in milliseconds when acquiring a connection from the pool
    acquire_timeout_ms: u64,
    /// Maximum lifetime of a connection in milliseconds before it's retired
    max_lifetime_ms: Option<u64>,
}

impl PoolConfig {
    /// Create a new pool configuration with the given idle and open limits
    ///
    /// # Panics
    ///
    /// Panics if `max_idle > max_open` while `max_open` is non-zero.
    pub fn new(max_idle: usize, max_open: usize) -> Self {
        assert!(
            max_open == 0 || max_idle <= max_open,
            "max_idle ({}) cannot exceed max_open ({})",
            max_idle,
            max_open
        );

        Self {
            max_idle,
            max_open,
            acquire_timeout_ms: 30_000,
            max_lifetime_ms: None,
        }
    }

    /// Set the acquire timeout
    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout_ms = duration_to_millis(timeout);
        self
    }

    /// Set the maximum connection lifetime
    ///
    /// A zero duration means connections are never retired for age.
    pub fn with_max_lifetime(mut self, lifetime: Duration) -> Self {
        self.max_lifetime_ms = (!lifetime.is_zero()).then(|| duration_to_millis(lifetime));
        self
    }

    pub fn max_idle(&self) -> usize {
        self.max_idle
    }

    pub fn max_open(&self) -> usize {
        self.max_open
    }

    /// Permits for the open-connection semaphore
    pub(crate) fn open_permits(&self) -> usize {
        match self.max_open {
            0 => Semaphore::MAX_PERMITS,
            limit => limit,
        }
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }

    pub fn max_lifetime(&self) -> Option<Duration> {
        self.max_lifetime_ms.map(Duration::from_millis)
    }
}

impl Default for PoolConfig {
    /// Defaults: 2 idle, 10 open, 30 second acquire timeout, no lifetime limit
    fn default() -> Self {
        Self::new(2, 10)
    }
}

impl From<&ConnectionConfig> for PoolConfig {
    fn from(config: &ConnectionConfig) -> Self {
        Self::new(
            config.max_idle_connections(),
            config.max_open_connections(),
        )
        .with_acquire_timeout(config.acquire_timeout())
        .with_max_lifetime(config.conn_max_lifetime())
    }
}
