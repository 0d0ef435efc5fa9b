//! Latency-based health classification

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::PingResult;

/// Health of a connection target as seen by the last probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    #[default]
    Healthy,
    /// Reachable, but slower than the healthy threshold
    Degraded,
    /// Too slow to rely on, or the probe failed
    Unhealthy,
}

impl HealthStatus {
    /// Classify a latency with the default thresholds (100ms / 500ms)
    ///
    /// ```
    /// use std::time::Duration;
    /// use steadydb_connection::HealthStatus;
    ///
    /// assert_eq!(HealthStatus::from_latency(Duration::from_millis(20)), HealthStatus::Healthy);
    /// assert_eq!(HealthStatus::from_latency(Duration::from_millis(300)), HealthStatus::Degraded);
    /// ```
    pub fn from_latency(latency: Duration) -> Self {
        Self::from_latency_with_thresholds(latency, &HealthThresholds::default())
    }

    pub fn from_latency_with_thresholds(latency: Duration, thresholds: &HealthThresholds) -> Self {
        if latency <= thresholds.healthy {
            HealthStatus::Healthy
        } else if latency <= thresholds.degraded {
            HealthStatus::Degraded
        } else {
            HealthStatus::Unhealthy
        }
    }

    /// A failed probe is always unhealthy
    pub fn from_ping(result: &PingResult, thresholds: &HealthThresholds) -> Self {
        match result {
            Ok(latency) => Self::from_latency_with_thresholds(*latency, thresholds),
            Err(_) => HealthStatus::Unhealthy,
        }
    }

    /// `Healthy` and `Degraded` are both usable
    pub fn is_usable(&self) -> bool {
        !matches!(self, HealthStatus::Unhealthy)
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Degraded => write!(f, "degraded"),
            HealthStatus::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Latency limits used by `HealthStatus::from_latency_with_thresholds`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthThresholds {
    /// Highest latency still considered healthy
    pub healthy: Duration,
    /// Highest latency still considered degraded
    pub degraded: Duration,
}

impl HealthThresholds {
    /// The degraded limit is raised to the healthy limit if given lower
    pub fn new(healthy: Duration, degraded: Duration) -> Self {
        Self {
            healthy,
            degraded: degraded.max(healthy),
        }
    }
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self::new(Duration::from_millis(100), Duration::from_millis(500))
    }
}
