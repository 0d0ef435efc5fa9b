//! Connection pool implementation

use std::collections::VecDeque;
use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use steadydb_core::{
    Connection, ConnectionFactory, QueryResult, Result, StatementResult, StoreError, Value,
};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;

use super::config::PoolConfig;
use super::stats::PoolStats;
use crate::health::{PingResult, ping_connection};

/// A physical connection together with the time it was opened
struct PooledEntry {
    connection: Arc<dyn Connection>,
    created_at: Instant,
}

impl PooledEntry {
    fn new(connection: Arc<dyn Connection>) -> Self {
        Self {
            connection,
            created_at: Instant::now(),
        }
    }

    fn is_expired(&self, max_lifetime: Option<Duration>) -> bool {
        max_lifetime.is_some_and(|lifetime| self.created_at.elapsed() >= lifetime)
    }
}

/// A bounded pool of physical connections to one target
///
/// Connections are opened on demand through the factory, returned to the
/// idle queue when the `PooledConnection` wrapper is dropped, and closed
/// instead when the idle queue is full or the connection is too old.
pub struct ConnectionPool {
    config: PoolConfig,
    factory: Arc<dyn ConnectionFactory>,
    idle: Mutex<VecDeque<PooledEntry>>,
    /// Limits the number of connections open at once
    semaphore: Arc<Semaphore>,
    in_use: AtomicUsize,
    waiting: AtomicUsize,
    closed: AtomicBool,
}

impl ConnectionPool {
    /// Create an empty pool; connections are opened on first use
    pub fn new<F: ConnectionFactory>(config: PoolConfig, factory: F) -> Self {
        Self::from_shared_factory(config, Arc::new(factory))
    }

    /// Create a pool seeded with an already opened connection
    pub fn with_connection(
        config: PoolConfig,
        factory: Arc<dyn ConnectionFactory>,
        connection: Arc<dyn Connection>,
    ) -> Self {
        let pool = Self::from_shared_factory(config, factory);
        pool.idle.lock().push_back(PooledEntry::new(connection));
        pool
    }

    fn from_shared_factory(config: PoolConfig, factory: Arc<dyn ConnectionFactory>) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.open_permits()));
        Self {
            config,
            factory,
            idle: Mutex::new(VecDeque::new()),
            semaphore,
            in_use: AtomicUsize::new(0),
            waiting: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Check out a connection
    ///
    /// Reuses a valid idle connection when one exists, otherwise opens a new
    /// one if fewer than `max_open` are in use, otherwise waits up to the
    /// acquire timeout for one to be returned.
    pub async fn get(&self) -> Result<PooledConnection<'_>> {
        if self.is_closed() {
            return Err(StoreError::Connection("connection pool is closed".into()));
        }

        self.waiting.fetch_add(1, Ordering::SeqCst);
        let result = tokio::time::timeout(self.config.acquire_timeout(), async {
            let permit = self
                .semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| StoreError::Connection("connection pool is closed".into()))?;

            let entry = match self.try_get_idle().await {
                Some(entry) => entry,
                None => PooledEntry::new(self.factory.create().await?),
            };
            Ok::<_, StoreError>((permit, entry))
        })
        .await;
        self.waiting.fetch_sub(1, Ordering::SeqCst);

        match result {
            Ok(Ok((permit, entry))) => {
                self.in_use.fetch_add(1, Ordering::SeqCst);
                Ok(PooledConnection {
                    connection: entry.connection,
                    created_at: entry.created_at,
                    pool: self,
                    _permit: permit,
                })
            }
            Ok(Err(err)) => Err(err),
            Err(_) => Err(StoreError::Timeout(format!(
                "timed out waiting for a pooled connection (timeout: {:?})",
                self.config.acquire_timeout()
            ))),
        }
    }

    /// Pop idle connections until one is young enough and still valid
    async fn try_get_idle(&self) -> Option<PooledEntry> {
        loop {
            let entry = { self.idle.lock().pop_front() }?;

            if entry.is_expired(self.config.max_lifetime()) {
                tracing::debug!("retiring pooled connection past its max lifetime");
                close_quietly(&*entry.connection).await;
                continue;
            }

            if !self.factory.validate(&*entry.connection).await {
                tracing::debug!("discarding invalid idle connection");
                close_quietly(&*entry.connection).await;
                continue;
            }

            return Some(entry);
        }
    }

    fn return_connection(&self, entry: PooledEntry) {
        self.in_use.fetch_sub(1, Ordering::SeqCst);

        // Dropping the last reference releases the physical connection
        if self.is_closed()
            || entry.connection.is_closed()
            || entry.is_expired(self.config.max_lifetime())
        {
            return;
        }

        let mut idle = self.idle.lock();
        if idle.len() < self.config.max_idle() {
            idle.push_back(entry);
        }
    }

    /// Run one liveness probe through a checked-out connection
    pub async fn ping(&self, timeout: Duration) -> PingResult {
        let conn = self.get().await.map_err(crate::PingError::Unavailable)?;
        ping_connection(&*conn, timeout).await
    }

    /// Check out a connection and execute one statement on it
    pub async fn execute(&self, sql: &str, params: &[Value]) -> Result<StatementResult> {
        let conn = self.get().await?;
        conn.execute(sql, params).await
    }

    /// Check out a connection and run one query on it
    pub async fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        let conn = self.get().await?;
        conn.query(sql, params).await
    }

    /// Get current pool statistics
    pub fn stats(&self) -> PoolStats {
        PoolStats::new(
            self.idle.lock().len(),
            self.in_use.load(Ordering::SeqCst),
            self.waiting.load(Ordering::SeqCst),
        )
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Close the pool and every idle connection
    ///
    /// Checked-out connections are released when they are returned. Close
    /// failures are logged and otherwise ignored. Calling this twice is a no-op.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.semaphore.close();

        let connections: Vec<_> = { self.idle.lock().drain(..).collect() };
        tracing::debug!(idle = connections.len(), "closing connection pool");
        for entry in connections {
            close_quietly(&*entry.connection).await;
        }
    }
}

impl std::fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .field("closed", &self.is_closed())
            .finish()
    }
}

async fn close_quietly(conn: &dyn Connection) {
    if let Err(err) = conn.close().await {
        tracing::warn!(error = %err, driver = conn.driver_name(), "failed to close connection");
    }
}

/// A connection borrowed from the pool
///
/// When dropped, the connection is returned to the pool.
pub struct PooledConnection<'a> {
    connection: Arc<dyn Connection>,
    created_at: Instant,
    pool: &'a ConnectionPool,
    _permit: OwnedSemaphorePermit,
}

impl<'a> Deref for PooledConnection<'a> {
    type Target = dyn Connection;

    fn deref(&self) -> &Self::Target {
        self.connection.as_ref()
    }
}

impl<'a> Drop for PooledConnection<'a> {
    fn drop(&mut self) {
        self.pool.return_connection(PooledEntry {
            connection: Arc::clone(&self.connection),
            created_at: self.created_at,
        });
    }
}

impl<'a> PooledConnection<'a> {
    /// Get the underlying connection as an Arc
    pub fn inner(&self) -> &Arc<dyn Connection> {
        &self.connection
    }

    /// How long ago the physical connection was opened
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }
}
