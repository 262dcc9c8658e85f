//! Conversion between relational datums and engine values.

use crate::datum::{Datum, TypeId};
use crate::error::{ScanError, ScanResult};
use chrono::{DateTime, Utc};
use lexscan_engine::{DataType, Value};

fn from_micros(micros: i64) -> ScanResult<DateTime<Utc>> {
    let nanos = (micros.rem_euclid(1_000_000) * 1_000) as u32;
    DateTime::from_timestamp(micros.div_euclid(1_000_000), nanos)
        .ok_or_else(|| ScanError::Conversion(format!("timestamp out of range: {micros}")))
}

/// Engine column type used to store a relational type
pub fn engine_type(type_id: TypeId) -> DataType {
    match type_id {
        TypeId::Bool => DataType::Bool,
        TypeId::Int2 => DataType::Int16,
        TypeId::Int4 => DataType::Int32,
        TypeId::Int8 => DataType::Int64,
        TypeId::Float4 => DataType::Float32,
        TypeId::Float8 => DataType::Float,
        TypeId::Text => DataType::LongText,
        TypeId::Varchar => DataType::ShortText,
        TypeId::Timestamp | TypeId::Timestamptz => DataType::Time,
    }
}

pub fn to_engine_value(datum: &Datum) -> Value {
    match datum {
        Datum::Bool(b) => Value::Bool(*b),
        Datum::Int2(i) => Value::Int16(*i),
        Datum::Int4(i) => Value::Int32(*i),
        Datum::Int8(i) => Value::Int64(*i),
        Datum::Float4(f) => Value::Float32(*f),
        Datum::Float8(f) => Value::Float(*f),
        Datum::Text(s) | Datum::Varchar(s) => Value::Text(s.clone()),
        Datum::Timestamp(ts) => Value::Time(ts.and_utc().timestamp_micros()),
        Datum::Timestamptz(ts) => Value::Time(ts.timestamp_micros()),
    }
}

/// Convert a stored engine value into a datum of `type_id`. `Void` is NULL.
pub fn to_datum(value: &Value, type_id: TypeId) -> ScanResult<Option<Datum>> {
    if value.is_void() {
        return Ok(None);
    }
    let value = value.cast(engine_type(type_id)).map_err(|e| ScanError::Conversion(format!("{type_id:?}: {}", e.message)))?;
    let datum = match (value, type_id) {
        (Value::Bool(b), TypeId::Bool) => Datum::Bool(b),
        (Value::Int16(i), TypeId::Int2) => Datum::Int2(i),
        (Value::Int32(i), TypeId::Int4) => Datum::Int4(i),
        (Value::Int64(i), TypeId::Int8) => Datum::Int8(i),
        (Value::Float32(f), TypeId::Float4) => Datum::Float4(f),
        (Value::Float(f), TypeId::Float8) => Datum::Float8(f),
        (Value::Text(s), TypeId::Text) => Datum::Text(s),
        (Value::Text(s), TypeId::Varchar) => Datum::Varchar(s),
        (Value::Time(micros), TypeId::Timestamp) => Datum::Timestamp(from_micros(micros)?.naive_utc()),
        (Value::Time(micros), TypeId::Timestamptz) => Datum::Timestamptz(from_micros(micros)?),
        (other, _) => return Err(ScanError::Conversion(format!("cannot convert {other:?} to {type_id:?}"))),
    };
    Ok(Some(datum))
}
