//! steadydb core - store abstractions shared by the connection layer and drivers
//!
//! This crate defines:
//!
//! - `Connection` - a single physical connection to the store
//! - `ConnectionFactory` - how drivers open new physical connections
//! - `ConnectionConfig` - target descriptor, retry and pool settings
//! - `StoreError` / `ErrorCategory` - error taxonomy with transport classification
//! - Common types like `Value`, `Row`, `QueryResult`

mod config;
mod connection;
mod error;
mod types;

pub use config::*;
pub use connection::*;
pub use error::*;
pub use types::*;
