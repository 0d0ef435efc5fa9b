//! Liveness probing for pooled connections
//!
//! A probe is one `SELECT 1` round-trip bounded by a timeout. The manager uses
//! it after establishment and on every `get_connection`; the CLI uses the
//! measured latency to report a `HealthStatus`.
//!
//! # Example
//!
//! ```ignore
//! use steadydb_connection::health::{HealthStatus, ping_connection};
//!
//! let latency = ping_connection(&*conn, Duration::from_secs(5)).await?;
//! let status = HealthStatus::from_latency(latency);
//! ```

mod ping;
mod status;


pub use ping::{PING_QUERY, PingError, PingResult, ping_connection};
pub use status::{HealthStatus, HealthThresholds};
