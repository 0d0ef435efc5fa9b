//! Lifecycle of one pooled connection handle
//!
//! The manager establishes the pool with bounded retries, probes it on every
//! access and replaces it when the probe fails. Reconnection is single-flight:
//! callers that queue behind a reconnect in progress receive its outcome
//! instead of starting another one.

mod events;


use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use steadydb_core::{ConnectionConfig, ConnectionFactory, StoreError};
use tokio::sync::broadcast;

use crate::pool::{ConnectionPool, PoolConfig, PoolStats};
use crate::retry::LinearBackoff;
use crate::ConnectionError;

pub use events::ReconnectEvent;

/// The handle lent to callers: a shared pool of physical connections
pub type PoolHandle = Arc<ConnectionPool>;

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Clone)]
enum ManagerState {
    Uninitialized,
    Ready(PoolHandle),
    /// The last reconnect failed; the next access tries again
    Broken,
    Closed,
}

/// Owns the connection handle for one target
pub struct ConnectionManager {
    config: ConnectionConfig,
    factory: Arc<dyn ConnectionFactory>,
    state: RwLock<ManagerState>,

    /// Held across establishment, reconnection and close
    lifecycle: tokio::sync::Mutex<()>,
    /// Bumped every time an establishment or reconnect finishes
    generation: AtomicU64,
    last_outcome: Mutex<Option<Result<PoolHandle, ConnectionError>>>,
    reconnects: AtomicU64,

    events: broadcast::Sender<ReconnectEvent>,
}

impl ConnectionManager {
    /// Create an uninitialized manager; nothing is opened until `establish`
    pub fn new<F: ConnectionFactory>(
        config: ConnectionConfig,
        factory: F,
    ) -> Result<Self, ConnectionError> {
        config.validate().map_err(ConnectionError::InvalidConfig)?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            config,
            factory: Arc::new(factory),
            state: RwLock::new(ManagerState::Uninitialized),
            lifecycle: tokio::sync::Mutex::new(()),
            generation: AtomicU64::new(0),
            last_outcome: Mutex::new(None),
            reconnects: AtomicU64::new(0),
            events,
        })
    }

    /// Create a manager and establish its handle
    pub async fn connect<F: ConnectionFactory>(
        config: ConnectionConfig,
        factory: F,
    ) -> Result<Arc<Self>, ConnectionError> {
        let manager = Arc::new(Self::new(config, factory)?);
        manager.establish().await?;
        Ok(manager)
    }

    /// Open and probe the pool, retrying with linear backoff
    ///
    /// Returns the current handle without new work if the manager is already
    /// ready. A broken manager is repaired through `reconnect`.
    #[tracing::instrument(skip(self), fields(db = %self.config.redacted_target()))]
    pub async fn establish(&self) -> Result<PoolHandle, ConnectionError> {
        let observed = self.generation.load(Ordering::SeqCst);
        let state = self.state.read().clone();
        match state {
            ManagerState::Ready(pool) => return Ok(pool),
            ManagerState::Broken => return self.reconnect_from(observed).await,
            ManagerState::Uninitialized | ManagerState::Closed => {}
        }

        let _guard = self.lifecycle.lock().await;

        let state = self.state.read().clone();
        if let ManagerState::Ready(pool) = state {
            return Ok(pool);
        }

        let outcome = self.open_pool().await;
        if let Ok(pool) = &outcome {
            *self.state.write() = ManagerState::Ready(Arc::clone(pool));
        }
        self.finish(outcome)
    }

    /// Get a live handle, reconnecting if the probe on the current one fails
    pub async fn get_connection(&self) -> Result<PoolHandle, ConnectionError> {
        let observed = self.generation.load(Ordering::SeqCst);
        let state = self.state.read().clone();
        match state {
            ManagerState::Uninitialized | ManagerState::Closed => {
                Err(ConnectionError::NotInitialized)
            }
            ManagerState::Broken => self.reconnect_from(observed).await,
            ManagerState::Ready(pool) => match pool.ping(self.config.probe_timeout()).await {
                Ok(_) => Ok(pool),
                Err(err) => {
                    tracing::warn!(error = %err, "connection lost, attempting to reconnect");
                    self.reconnect_from(observed).await
                }
            },
        }
    }

    /// Close the current handle and establish a new one
    ///
    /// On failure the manager is left broken and the old handle is not restored.
    #[tracing::instrument(skip(self), fields(db = %self.config.redacted_target()))]
    pub async fn reconnect(&self) -> Result<(), ConnectionError> {
        let observed = self.generation.load(Ordering::SeqCst);
        self.reconnect_from(observed).await.map(|_| ())
    }

    /// Reconnect unless another reconnect finished after `observed` was read,
    /// in which case that reconnect's outcome is returned
    async fn reconnect_from(&self, observed: u64) -> Result<PoolHandle, ConnectionError> {
        let _guard = self.lifecycle.lock().await;

        if self.generation.load(Ordering::SeqCst) != observed {
            if let Some(outcome) = self.last_outcome.lock().clone() {
                tracing::debug!("reusing outcome of concurrent reconnect");
                return outcome;
            }
        }

        let state = self.state.read().clone();
        let previous = match state {
            ManagerState::Uninitialized | ManagerState::Closed => {
                return Err(ConnectionError::NotInitialized);
            }
            ManagerState::Ready(pool) => Some(pool),
            ManagerState::Broken => None,
        };

        *self.state.write() = ManagerState::Broken;
        if let Some(pool) = previous {
            pool.close().await;
        }

        self.reconnects.fetch_add(1, Ordering::SeqCst);
        tracing::info!("reconnecting");

        let outcome = self.open_pool().await;
        match &outcome {
            Ok(pool) => *self.state.write() = ManagerState::Ready(Arc::clone(pool)),
            Err(err) => tracing::error!(error = %err, "reconnect failed"),
        }
        self.finish(outcome)
    }

    fn finish(
        &self,
        outcome: Result<PoolHandle, ConnectionError>,
    ) -> Result<PoolHandle, ConnectionError> {
        *self.last_outcome.lock() = Some(outcome.clone());
        self.generation.fetch_add(1, Ordering::SeqCst);
        outcome
    }

    async fn open_pool(&self) -> Result<PoolHandle, ConnectionError> {
        let max_attempts = self.config.max_retries();
        let backoff = LinearBackoff::new(self.config.retry_interval());
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            self.emit(ReconnectEvent::Attempting {
                attempt,
                max_attempts,
            });

            let connection = match self.factory.create().await {
                Ok(connection) => connection,
                Err(err) => {
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        error = %err,
                        "failed to open connection"
                    );
                    self.emit(ReconnectEvent::Failed {
                        attempt,
                        error: err.to_string(),
                    });
                    last_error = Some(err);

                    if attempt < max_attempts {
                        tokio::time::sleep(backoff.delay_for(attempt)).await;
                    }
                    continue;
                }
            };

            let pool = Arc::new(ConnectionPool::with_connection(
                PoolConfig::from(&self.config),
                Arc::clone(&self.factory),
                connection,
            ));

            if let Err(err) = pool.ping(self.config.probe_timeout()).await {
                tracing::error!(error = %err, "probe on new connection failed");
                pool.close().await;
                self.emit(ReconnectEvent::ProbeFailed {
                    error: err.to_string(),
                });
                return Err(ConnectionError::ProbeFailed { source: err.into() });
            }

            tracing::info!(attempts = attempt, "connection established");
            self.emit(ReconnectEvent::Succeeded {
                attempts_taken: attempt,
            });
            return Ok(pool);
        }

        self.emit(ReconnectEvent::Exhausted {
            total_attempts: max_attempts,
        });
        Err(ConnectionError::Exhausted {
            attempts: max_attempts,
            source: last_error.unwrap_or_else(|| {
                StoreError::Connection("no connection attempts were made".into())
            }),
        })
    }

    fn emit(&self, event: ReconnectEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// Close the handle; later accesses fail with `NotInitialized`
    /// until `establish` is called again
    pub async fn close(&self) {
        let _guard = self.lifecycle.lock().await;
        let previous = std::mem::replace(&mut *self.state.write(), ManagerState::Closed);
        *self.last_outcome.lock() = None;
        if let ManagerState::Ready(pool) = previous {
            tracing::info!("closing connection manager");
            pool.close().await;
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReconnectEvent> {
        self.events.subscribe()
    }

    /// The held handle without probing it
    pub fn current_handle(&self) -> Option<PoolHandle> {
        match &*self.state.read() {
            ManagerState::Ready(pool) => Some(Arc::clone(pool)),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(&*self.state.read(), ManagerState::Ready(_))
    }

    pub fn stats(&self) -> Option<PoolStats> {
        self.current_handle().map(|pool| pool.stats())
    }

    /// Number of reconnects performed (not counting initial establishment)
    pub fn reconnect_count(&self) -> u64 {
        self.reconnects.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &*self.state.read() {
            ManagerState::Uninitialized => "uninitialized",
            ManagerState::Ready(_) => "ready",
            ManagerState::Broken => "broken",
            ManagerState::Closed => "closed",
        };
        f.debug_struct("ConnectionManager")
            .field("target", &self.config.redacted_target())
            .field("state", &state)
            .field("reconnects", &self.reconnect_count())
            .finish()
    }
}
