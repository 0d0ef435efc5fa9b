use serde::{Deserialize, Serialize};

/// Point-in-time counters of a connection pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PoolStats {
    idle: usize,
    in_use: usize,
    /// Callers blocked in `get`
    waiting: usize,
}

impl PoolStats {
    pub fn new(idle: usize, in_use: usize, waiting: usize) -> Self {
        Self {
            idle,
            in_use,
            waiting,
        }
    }

    /// Open physical connections, idle or checked out
    pub fn total(&self) -> usize {
        self.idle + self.in_use
    }

    pub fn idle(&self) -> usize {
        self.idle
    }

    pub fn in_use(&self) -> usize {
        self.in_use
    }

    pub fn waiting(&self) -> usize {
        self.waiting
    }

    pub fn utilization(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.in_use as f64 / total as f64,
        }
    }
}
