//! steadydb connection - connection lifecycle, pooling and retried execution
//!
//! This crate keeps one pooled connection handle alive under unreliable
//! network conditions. `ConnectionManager` establishes the pool with bounded
//! retries and repairs it on access; `RetryExecutor` runs caller operations
//! against the current handle and escalates transient failures into a
//! reconnection.

mod error;
pub mod health;
mod manager;
pub mod pool;
pub mod retry;

#[cfg(test)]
mod testing;

pub use error::{ConnectionError, ConnectionErrorKind};
pub use health::{HealthStatus, HealthThresholds, PingError, PingResult, ping_connection};
pub use manager::{ConnectionManager, PoolHandle, ReconnectEvent};
pub use pool::{ConnectionPool, PoolConfig, PoolStats, PooledConnection};
pub use retry::{ExecutionContext, LinearBackoff, RetryExecutor, RetryPolicy};
