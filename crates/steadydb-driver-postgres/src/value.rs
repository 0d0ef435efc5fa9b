//! Conversion between `Value` and PostgreSQL wire types

use bytes::BytesMut;
use postgres_types::{IsNull, ToSql, Type, to_sql_checked};
use steadydb_core::{Result, StoreError, Value};
use tokio_postgres::Row as PgRow;

type BoxError = Box<dyn std::error::Error + Sync + Send>;

/// Owned parameter that tokio-postgres can bind
#[derive(Debug)]
pub(crate) enum PgValue {
    Null,
    Bool(bool),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    String(String),
    Bytes(Vec<u8>),
    Uuid(uuid::Uuid),
    Json(serde_json::Value),
    DateTimeUtc(chrono::DateTime<chrono::Utc>),
    DateTime(chrono::NaiveDateTime),
}

impl PgValue {
    /// Pick the variant that matches the prepared parameter type so the
    /// binary encoding has the width the server expects
    ///
    /// A number that does not fit the parameter type is rejected rather than
    /// truncated.
    pub(crate) fn for_type(value: &Value, target: &Type) -> Result<Self> {
        let value = match value {
            Value::Null => PgValue::Null,
            Value::Bool(v) => PgValue::Bool(*v),
            Value::Int16(v) => Self::narrow_int(i64::from(*v), target)?,
            Value::Int32(v) => Self::narrow_int(i64::from(*v), target)?,
            Value::Int64(v) => Self::narrow_int(*v, target)?,
            Value::Float32(v) if *target == Type::FLOAT8 => PgValue::Float64(f64::from(*v)),
            Value::Float32(v) => PgValue::Float32(*v),
            Value::Float64(v) if *target == Type::FLOAT4 => {
                if v.is_finite() && v.abs() > f64::from(f32::MAX) {
                    return Err(out_of_range(v, target));
                }
                PgValue::Float32(*v as f32)
            }
            Value::Float64(v) => PgValue::Float64(*v),
            Value::String(v) => PgValue::String(v.clone()),
            Value::Bytes(v) => PgValue::Bytes(v.clone()),
            Value::Uuid(v) => PgValue::Uuid(*v),
            Value::Json(v) => PgValue::Json(v.clone()),
            Value::DateTimeUtc(v) if *target == Type::TIMESTAMP => PgValue::DateTime(v.naive_utc()),
            Value::DateTimeUtc(v) => PgValue::DateTimeUtc(*v),
        };
        Ok(value)
    }

    fn narrow_int(value: i64, target: &Type) -> Result<Self> {
        match *target {
            Type::INT2 => i16::try_from(value)
                .map(PgValue::Int16)
                .map_err(|_| out_of_range(&value, target)),
            Type::INT4 => i32::try_from(value)
                .map(PgValue::Int32)
                .map_err(|_| out_of_range(&value, target)),
            _ => Ok(PgValue::Int64(value)),
        }
    }
}

fn out_of_range(value: &dyn std::fmt::Display, target: &Type) -> StoreError {
    StoreError::InvalidInput(format!("{} is out of range for type {}", value, target))
}

/// Convert `params` using the parameter types the server inferred
pub(crate) fn bind_params(types: &[Type], params: &[Value]) -> Result<Vec<PgValue>> {
    if types.len() != params.len() {
        return Err(StoreError::InvalidInput(format!(
            "statement expects {} parameters, got {}",
            types.len(),
            params.len()
        )));
    }
    params
        .iter()
        .zip(types)
        .map(|(value, ty)| PgValue::for_type(value, ty))
        .collect()
}

impl ToSql for PgValue {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> std::result::Result<IsNull, BoxError> {
        match self {
            PgValue::Null => Ok(IsNull::Yes),
            PgValue::Bool(v) => v.to_sql(ty, out),
            PgValue::Int16(v) => v.to_sql(ty, out),
            PgValue::Int32(v) => v.to_sql(ty, out),
            PgValue::Int64(v) => v.to_sql(ty, out),
            PgValue::Float32(v) => v.to_sql(ty, out),
            PgValue::Float64(v) => v.to_sql(ty, out),
            PgValue::String(v) => v.to_sql(ty, out),
            PgValue::Bytes(v) => v.to_sql(ty, out),
            PgValue::Uuid(v) => v.to_sql(ty, out),
            PgValue::Json(v) => v.to_sql(ty, out),
            PgValue::DateTimeUtc(v) => v.to_sql(ty, out),
            PgValue::DateTime(v) => v.to_sql(ty, out),
        }
    }

    fn accepts(_: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

/// Read column `idx` of `row` as a `Value`
pub(crate) fn postgres_to_value(row: &PgRow, idx: usize) -> Result<Value> {
    let column = &row.columns()[idx];
    let ty = column.type_();

    let value = match *ty {
        Type::BOOL => get(row, idx, Value::Bool)?,
        Type::INT2 => get(row, idx, Value::Int16)?,
        Type::INT4 => get(row, idx, Value::Int32)?,
        Type::INT8 => get(row, idx, Value::Int64)?,
        Type::FLOAT4 => get(row, idx, Value::Float32)?,
        Type::FLOAT8 => get(row, idx, Value::Float64)?,
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => get(row, idx, Value::String)?,
        Type::BYTEA => get(row, idx, Value::Bytes)?,
        Type::UUID => get(row, idx, Value::Uuid)?,
        Type::JSON | Type::JSONB => get(row, idx, Value::Json)?,
        Type::TIMESTAMPTZ => get(row, idx, Value::DateTimeUtc)?,
        Type::TIMESTAMP => get(row, idx, |v: chrono::NaiveDateTime| {
            Value::DateTimeUtc(v.and_utc())
        })?,
        _ => {
            return Err(StoreError::Driver(format!(
                "unsupported column type {} for column {}",
                ty,
                column.name()
            )));
        }
    };
    Ok(value)
}

fn get<'a, T, F>(row: &'a PgRow, idx: usize, wrap: F) -> Result<Value>
where
    T: postgres_types::FromSql<'a>,
    F: FnOnce(T) -> Value,
{
    row.try_get::<_, Option<T>>(idx)
        .map(|value| value.map(wrap).unwrap_or(Value::Null))
        .map_err(|e| StoreError::Driver(format!("failed to decode column {}: {}", idx, e)))
}
