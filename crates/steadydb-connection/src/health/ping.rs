//! Probe round-trip

use std::time::Duration;

use steadydb_core::{Connection, StoreError};
use thiserror::Error;
use tokio::time::Instant;

/// Statement used to verify that a connection still reaches the server
pub const PING_QUERY: &str = "SELECT 1";

/// Round-trip latency of a successful probe
pub type PingResult = Result<Duration, PingError>;

/// Why a probe failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PingError {
    #[error("connection is closed")]
    ConnectionClosed,

    /// No connection could be checked out to run the probe
    #[error("no connection available for probe: {0}")]
    Unavailable(StoreError),

    #[error("probe query failed: {0}")]
    QueryFailed(StoreError),

    #[error("probe timed out after {0:?}")]
    Timeout(Duration),
}

impl From<PingError> for StoreError {
    fn from(err: PingError) -> Self {
        match err {
            PingError::ConnectionClosed => StoreError::Connection("connection is closed".into()),
            PingError::Unavailable(source) | PingError::QueryFailed(source) => source,
            PingError::Timeout(after) => {
                StoreError::Timeout(format!("probe timed out after {:?}", after))
            }
        }
    }
}

/// Run one probe on `conn`, giving up after `timeout`
pub async fn ping_connection(conn: &dyn Connection, timeout: Duration) -> PingResult {
    if conn.is_closed() {
        return Err(PingError::ConnectionClosed);
    }

    let start = Instant::now();
    match tokio::time::timeout(timeout, conn.query(PING_QUERY, &[])).await {
        Ok(Ok(_)) => Ok(start.elapsed()),
        Ok(Err(err)) => Err(PingError::QueryFailed(err)),
        Err(_) => Err(PingError::Timeout(timeout)),
    }
}
