//! PostgreSQL driver for steadydb
//!
//! `PostgresConnectionFactory` opens `tokio-postgres` connections from a URL or
//! key/value descriptor. Driver errors are translated into `StoreError` so that
//! transport failures land in the retryable category.

mod connection;
mod error;
mod factory;
mod value;

pub use connection::PostgresConnection;
pub use error::{classify_sqlstate, map_postgres_error};
pub use factory::PostgresConnectionFactory;
