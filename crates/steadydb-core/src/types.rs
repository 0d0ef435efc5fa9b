//! Values, rows and statement results exchanged with drivers

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A parameter or column value
///
/// Drivers map their native types onto these variants; anything without a
/// variant is reported as a driver error rather than coerced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    String(String),
    Bytes(Vec<u8>),
    Uuid(Uuid),
    /// Timestamps without a zone are read as UTC
    DateTimeUtc(DateTime<Utc>),
    Json(serde_json::Value),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Any integer variant, widened
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Int16(v) => Some(i64::from(v)),
            Value::Int32(v) => Some(i64::from(v)),
            Value::Int64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::DateTimeUtc(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int64(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// One result row; column names are shared by every row of a result
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: impl Into<Arc<[String]>>, values: Vec<Value>) -> Self {
        Self {
            columns: columns.into(),
            values,
        }
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        let idx = self.columns.iter().position(|c| c == name)?;
        self.values.get(idx)
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

/// Name and driver-specific type name of a result column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub type_name: String,
}

/// Rows returned by a query
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    /// Present even when no rows matched
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
    pub execution_time_ms: u64,
}

impl QueryResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn into_first_row(self) -> Option<Row> {
        self.rows.into_iter().next()
    }
}

/// Outcome of INSERT, UPDATE or DELETE
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatementResult {
    pub affected_rows: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_lookup_by_name() {
        let row = Row::new(
            vec!["id".to_string(), "email".to_string()],
            vec![Value::Int32(2), Value::from("jane@example.com")],
        );
        assert_eq!(row.get_by_name("id").and_then(Value::as_i64), Some(2));
        assert_eq!(
            row.get_by_name("email").and_then(Value::as_str),
            Some("jane@example.com")
        );
        assert!(row.get_by_name("missing").is_none());
    }

    #[test]
    fn test_text_is_not_an_integer() {
        assert_eq!(Value::from("42").as_i64(), None);
    }

    #[test]
    fn test_optional_values() {
        assert_eq!(Value::from(None::<String>), Value::Null);
        assert_eq!(Value::from(Some(7_i64)), Value::Int64(7));
    }

    #[test]
    fn test_first_row_of_empty_result() {
        assert!(QueryResult::empty().into_first_row().is_none());
    }
}
