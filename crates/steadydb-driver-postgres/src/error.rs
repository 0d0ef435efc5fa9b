//! Translation of PostgreSQL errors into `StoreError`

use std::error::Error as _;

use steadydb_core::StoreError;
use tokio_postgres::error::{DbError, SqlState};

/// Classify an error returned by an open connection
pub fn map_postgres_error(err: &tokio_postgres::Error) -> StoreError {
    if let Some(db_error) = err.as_db_error() {
        return classify_sqlstate(db_error.code(), &format_db_error(db_error));
    }
    if err.is_closed() {
        return StoreError::Connection(err.to_string());
    }
    if let Some(io) = err
        .source()
        .and_then(|source| source.downcast_ref::<std::io::Error>())
    {
        return std::io::Error::new(io.kind(), err.to_string()).into();
    }
    StoreError::Driver(err.to_string())
}

/// Classify an error raised while opening a connection
///
/// Anything the server did not explicitly answer (refused, DNS, TLS handshake,
/// connect timeout) counts as a transport failure.
pub(crate) fn map_connect_error(err: &tokio_postgres::Error) -> StoreError {
    match err.as_db_error() {
        Some(db_error) => classify_sqlstate(db_error.code(), &format_db_error(db_error)),
        None => StoreError::Connection(format!("failed to connect to PostgreSQL: {}", err)),
    }
}

/// Map a SQLSTATE to the matching `StoreError` variant
///
/// Class 08 (connection exception), admin shutdown (57P01 to 57P03) and
/// too-many-connections (53300) are transport failures. Class 23 is an
/// integrity violation and class 22 is malformed data.
pub fn classify_sqlstate(code: &SqlState, message: &str) -> StoreError {
    let message = message.to_string();
    match code.code() {
        "57P01" | "57P02" | "57P03" | "53300" => StoreError::Connection(message),
        "28000" | "28P01" => StoreError::Authentication(message),
        class if class.starts_with("08") => StoreError::Connection(message),
        class if class.starts_with("23") => StoreError::Constraint(message),
        class if class.starts_with("22") => StoreError::InvalidInput(message),
        _ => StoreError::Query(message),
    }
}

fn format_db_error(db_error: &DbError) -> String {
    let mut message = db_error.message().to_string();

    if let Some(detail) = db_error.detail().filter(|d| !d.trim().is_empty()) {
        message.push_str(&format!(" (detail: {})", detail));
    }
    if let Some(hint) = db_error.hint().filter(|h| !h.trim().is_empty()) {
        message.push_str(&format!(" (hint: {})", hint));
    }
    if let Some(constraint) = db_error.constraint() {
        message.push_str(&format!(" (constraint: {})", constraint));
    }

    match db_error.code().code() {
        "23505" => format!("duplicate value violates unique constraint: {}", message),
        "23503" => format!("foreign key violation: {}", message),
        "23502" => format!("null value violates not-null constraint: {}", message),
        code => format!("{} (code: {})", message, code),
    }
}
