//! Connection pooling for physical store connections
//!
//! The pool bounds the number of open connections, keeps a limited number of
//! idle ones for reuse, and retires connections that outlive their maximum
//! lifetime.
//!
//! # Example
//!
//! ```ignore
//! use steadydb_connection::pool::{ConnectionPool, PoolConfig};
//!
//! let config = PoolConfig::new(2, 10)
//!     .with_max_lifetime(Duration::from_secs(3600));
//!
//! let pool = ConnectionPool::new(config, factory);
//! let conn = pool.get().await?;
//! // Use connection...
//! // Connection returned to pool on drop
//! ```

mod config;
mod pool;
mod stats;

#[cfg(test)]
mod tests;

pub use config::PoolConfig;
pub use pool::{ConnectionPool, PooledConnection};
pub use stats::PoolStats;
