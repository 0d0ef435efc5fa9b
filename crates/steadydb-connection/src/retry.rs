//! Retried execution of store operations
//!
//! `RetryExecutor` runs a caller-supplied operation against the manager's
//! current handle. Transport failures trigger a reconnect, a linear backoff
//! wait and another attempt; every other failure is returned at once.
//!
//! # Example
//!
//! ```ignore
//! use steadydb_connection::{ExecutionContext, RetryExecutor, RetryPolicy};
//!
//! let executor = RetryExecutor::new(manager.clone());
//! let ctx = ExecutionContext::with_timeout(Duration::from_secs(5));
//! let policy = RetryPolicy::new(3, Duration::from_secs(1));
//!
//! let rows = executor
//!     .execute(&ctx, &policy, |pool| async move {
//!         pool.execute("INSERT INTO users (name, email) VALUES ($1, $2)", &params).await
//!     })
//!     .await?;
//! ```

mod backoff;
mod context;
mod executor;
mod policy;


pub use backoff::LinearBackoff;
pub use context::ExecutionContext;
pub use executor::RetryExecutor;
pub use policy::RetryPolicy;
