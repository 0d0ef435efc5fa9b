//! Retry loop around caller operations

use std::future::Future;
use std::sync::Arc;

use super::{ExecutionContext, RetryPolicy};
use crate::ConnectionError;
use crate::manager::{ConnectionManager, PoolHandle};

/// Runs operations against the manager's handle, retrying transport failures
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    manager: Arc<ConnectionManager>,
}

impl RetryExecutor {
    pub fn new(manager: Arc<ConnectionManager>) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &Arc<ConnectionManager> {
        &self.manager
    }

    /// Run `operation` up to `policy.max_retries()` times
    ///
    /// Before every attempt the context is checked. A non-retryable failure is
    /// returned unchanged as `ConnectionError::Operation`. After a retryable
    /// failure the manager reconnects, the handle is fetched again and the
    /// executor waits `retry_interval * attempt` before the next attempt; a
    /// failed reconnect is only logged since fetching the handle will try
    /// again. Nothing happens after the final attempt fails.
    pub async fn execute<T, F, Fut>(
        &self,
        ctx: &ExecutionContext,
        policy: &RetryPolicy,
        mut operation: F,
    ) -> Result<T, ConnectionError>
    where
        F: FnMut(PoolHandle) -> Fut,
        Fut: Future<Output = steadydb_core::Result<T>>,
    {
        let max_attempts = policy.max_retries();
        let mut handle = self.manager.get_connection().await?;
        let mut attempt = 1;

        loop {
            if ctx.is_cancelled() {
                tracing::debug!(attempt, "execution cancelled before attempt");
                return Err(ConnectionError::Cancelled);
            }

            let err = match operation(Arc::clone(&handle)).await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!(attempt, "operation succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            if !err.is_retryable() {
                return Err(ConnectionError::Operation(err));
            }

            tracing::warn!(
                attempt,
                max_attempts,
                error = %err,
                "operation failed with retryable error"
            );
            if attempt >= max_attempts {
                tracing::error!(attempts = attempt, "operation failed after all retries");
                return Err(ConnectionError::Operation(err));
            }

            if let Err(reconnect_err) = self.manager.reconnect().await {
                tracing::warn!(error = %reconnect_err, "reconnect between attempts failed");
            }
            handle = self.manager.get_connection().await?;

            ctx.sleep(policy.delay_for(attempt)).await?;
            attempt += 1;
        }
    }
}
