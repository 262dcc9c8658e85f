use crate::catalog::Oid;
use crate::error::{ScanError, ScanResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use lexql::ast::Literal;
use serde::{Deserialize, Serialize};

/// Relational column types the scan understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeId {
    Bool,
    Int2,
    Int4,
    Int8,
    Float4,
    Float8,
    Text,
    Varchar,
    Timestamp,
    Timestamptz,
}

impl TypeId {
    pub fn oid(&self) -> Oid {
        match self {
            TypeId::Bool => 16,
            TypeId::Int8 => 20,
            TypeId::Int2 => 21,
            TypeId::Int4 => 23,
            TypeId::Text => 25,
            TypeId::Float4 => 700,
            TypeId::Float8 => 701,
            TypeId::Varchar => 1043,
            TypeId::Timestamp => 1114,
            TypeId::Timestamptz => 1184,
        }
    }

    pub fn from_oid(oid: Oid) -> Option<Self> {
        [
            TypeId::Bool,
            TypeId::Int2,
            TypeId::Int4,
            TypeId::Int8,
            TypeId::Float4,
            TypeId::Float8,
            TypeId::Text,
            TypeId::Varchar,
            TypeId::Timestamp,
            TypeId::Timestamptz,
        ]
        .into_iter()
        .find(|t| t.oid() == oid)
    }

    pub fn is_text(&self) -> bool { matches!(self, TypeId::Text | TypeId::Varchar) }
}

/// A relational value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Datum {
    Bool(bool),
    Int2(i16),
    Int4(i32),
    Int8(i64),
    Float4(f32),
    Float8(f64),
    Text(String),
    Varchar(String),
    Timestamp(NaiveDateTime),
    Timestamptz(DateTime<Utc>),
}

fn invalid(literal: &Literal, ty: TypeId) -> ScanError {
    ScanError::InvalidArgument(format!("invalid input syntax for type {ty:?}: {literal:?}"))
}

fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| NaiveDate::parse_from_str(text, "%Y-%m-%d").ok().and_then(|d| d.and_hms_opt(0, 0, 0)))
}

fn parse_timestamptz(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    DateTime::parse_from_rfc3339(text)
        .ok()
        .or_else(|| DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f%#z").ok())
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|| parse_timestamp(text).map(|naive| naive.and_utc()))
}

impl Datum {
    pub fn type_id(&self) -> TypeId {
        match self {
            Datum::Bool(_) => TypeId::Bool,
            Datum::Int2(_) => TypeId::Int2,
            Datum::Int4(_) => TypeId::Int4,
            Datum::Int8(_) => TypeId::Int8,
            Datum::Float4(_) => TypeId::Float4,
            Datum::Float8(_) => TypeId::Float8,
            Datum::Text(_) => TypeId::Text,
            Datum::Varchar(_) => TypeId::Varchar,
            Datum::Timestamp(_) => TypeId::Timestamp,
            Datum::Timestamptz(_) => TypeId::Timestamptz,
        }
    }

    /// The literal the predicate evaluator compares. Timestamps become microseconds since the epoch.
    pub fn to_literal(&self) -> Literal {
        match self {
            Datum::Bool(b) => Literal::Boolean(*b),
            Datum::Int2(i) => Literal::Integer(*i as i64),
            Datum::Int4(i) => Literal::Integer(*i as i64),
            Datum::Int8(i) => Literal::Integer(*i),
            Datum::Float4(f) => Literal::Float(*f as f64),
            Datum::Float8(f) => Literal::Float(*f),
            Datum::Text(s) | Datum::Varchar(s) => Literal::String(s.clone()),
            Datum::Timestamp(ts) => Literal::Integer(ts.and_utc().timestamp_micros()),
            Datum::Timestamptz(ts) => Literal::Integer(ts.timestamp_micros()),
        }
    }

    /// Read a string as a value of type `ty`, the way an untyped quoted constant is read
    pub fn parse(text: &str, ty: TypeId) -> ScanResult<Datum> {
        let literal = Literal::String(text.to_string());
        let trimmed = text.trim();
        Ok(match ty {
            TypeId::Text => Datum::Text(text.to_string()),
            TypeId::Varchar => Datum::Varchar(text.to_string()),
            TypeId::Bool => match trimmed.to_ascii_lowercase().as_str() {
                "t" | "true" | "yes" | "on" | "1" => Datum::Bool(true),
                "f" | "false" | "no" | "off" | "0" => Datum::Bool(false),
                _ => return Err(invalid(&literal, ty)),
            },
            TypeId::Int2 => Datum::Int2(trimmed.parse().map_err(|_| invalid(&literal, ty))?),
            TypeId::Int4 => Datum::Int4(trimmed.parse().map_err(|_| invalid(&literal, ty))?),
            TypeId::Int8 => Datum::Int8(trimmed.parse().map_err(|_| invalid(&literal, ty))?),
            TypeId::Float4 => Datum::Float4(trimmed.parse().map_err(|_| invalid(&literal, ty))?),
            TypeId::Float8 => Datum::Float8(trimmed.parse().map_err(|_| invalid(&literal, ty))?),
            TypeId::Timestamp => Datum::Timestamp(parse_timestamp(trimmed).ok_or_else(|| invalid(&literal, ty))?),
            TypeId::Timestamptz => Datum::Timestamptz(parse_timestamptz(trimmed).ok_or_else(|| invalid(&literal, ty))?),
        })
    }

    /// Resolve a predicate constant against a column of type `ty`.
    ///
    /// Quoted strings are untyped and are read as `ty`, failing with `InvalidArgument` when they do not
    /// parse. Numbers and booleans convert only when no precision is lost; otherwise the comparison is
    /// cross-type and `Ok(None)` is returned. NULL resolves to `None`.
    pub fn resolve(literal: &Literal, ty: TypeId) -> ScanResult<Option<Datum>> {
        Ok(match (literal, ty) {
            (Literal::Null, _) => None,
            (Literal::String(s), _) => Some(Datum::parse(s, ty)?),
            (Literal::Boolean(b), TypeId::Bool) => Some(Datum::Bool(*b)),
            (Literal::Integer(i), TypeId::Int2) => i16::try_from(*i).ok().map(Datum::Int2),
            (Literal::Integer(i), TypeId::Int4) => i32::try_from(*i).ok().map(Datum::Int4),
            (Literal::Integer(i), TypeId::Int8) => Some(Datum::Int8(*i)),
            (Literal::Integer(i), TypeId::Float4) => Some(*i as f32).filter(|f| *f as i64 == *i).map(Datum::Float4),
            (Literal::Integer(i), TypeId::Float8) => Some(*i as f64).filter(|f| *f as i64 == *i).map(Datum::Float8),
            (Literal::Float(f), TypeId::Float4) => Some(*f as f32).filter(|g| *g as f64 == *f).map(Datum::Float4),
            (Literal::Float(f), TypeId::Float8) => Some(Datum::Float8(*f)),
            _ => None,
        })
    }
}
