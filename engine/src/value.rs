use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Scalar types a column can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt32,
    Float32,
    Float,
    /// Microseconds since the Unix epoch
    Time,
    ShortText,
    Text,
    LongText,
}

impl DataType {
    pub fn is_text(&self) -> bool { matches!(self, DataType::ShortText | DataType::Text | DataType::LongText) }

    /// Largest value size in bytes the type can store, for text types
    pub fn max_text_size(&self) -> Option<usize> {
        match self {
            DataType::ShortText => Some(crate::TABLE_MAX_KEY_SIZE),
            DataType::Text => Some(65_536),
            DataType::LongText => Some(2_147_483_648),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// No value. Never equal to anything, including itself.
    Void,
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt32(u32),
    Float32(f32),
    Float(f64),
    Time(i64),
    Text(String),
}

enum Numeric {
    Int(i128),
    Float(f64),
}

impl Value {
    pub fn is_void(&self) -> bool { matches!(self, Value::Void) }

    pub fn data_type(&self) -> Option<DataType> {
        Some(match self {
            Value::Void => return None,
            Value::Bool(_) => DataType::Bool,
            Value::Int8(_) => DataType::Int8,
            Value::Int16(_) => DataType::Int16,
            Value::Int32(_) => DataType::Int32,
            Value::Int64(_) => DataType::Int64,
            Value::UInt32(_) => DataType::UInt32,
            Value::Float32(_) => DataType::Float32,
            Value::Float(_) => DataType::Float,
            Value::Time(_) => DataType::Time,
            Value::Text(_) => DataType::Text,
        })
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    fn numeric(&self) -> Option<Numeric> {
        Some(match self {
            Value::Int8(v) => Numeric::Int(*v as i128),
            Value::Int16(v) => Numeric::Int(*v as i128),
            Value::Int32(v) => Numeric::Int(*v as i128),
            Value::Int64(v) => Numeric::Int(*v as i128),
            Value::UInt32(v) => Numeric::Int(*v as i128),
            Value::Time(v) => Numeric::Int(*v as i128),
            Value::Float32(v) => Numeric::Float(*v as f64),
            Value::Float(v) => Numeric::Float(*v),
            _ => return None,
        })
    }

    /// Compare two values of compatible types. Integers and floats compare numerically,
    /// text compares bytewise. Anything involving `Void` or incompatible types is `None`.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Time(_), v) | (v, Value::Time(_)) if !matches!(v, Value::Time(_) | Value::Int64(_)) => None,
            _ => match (self.numeric()?, other.numeric()?) {
                (Numeric::Int(a), Numeric::Int(b)) => Some(a.cmp(&b)),
                (Numeric::Int(a), Numeric::Float(b)) => (a as f64).partial_cmp(&b),
                (Numeric::Float(a), Numeric::Int(b)) => a.partial_cmp(&(b as f64)),
                (Numeric::Float(a), Numeric::Float(b)) => a.partial_cmp(&b),
            },
        }
    }

    /// Convert to `to`, failing with `InvalidArgument` when the value does not fit or does not parse
    pub fn cast(&self, to: DataType) -> Result<Value> {
        if self.is_void() {
            return Ok(Value::Void);
        }
        if to.is_text() {
            let text = match self {
                Value::Text(s) => s.clone(),
                Value::Bool(b) => b.to_string(),
                Value::Float32(f) => f.to_string(),
                Value::Float(f) => f.to_string(),
                other => match other.numeric() {
                    Some(Numeric::Int(i)) => i.to_string(),
                    _ => return Err(self.cast_error(to)),
                },
            };
            if to.max_text_size().is_some_and(|max| text.len() > max) {
                return Err(EngineError::invalid_argument(format!("[cast] text too long for {to:?}: {} bytes", text.len())));
            }
            return Ok(Value::Text(text));
        }

        let numeric = match self {
            Value::Bool(b) => Numeric::Int(*b as i128),
            Value::Text(s) => {
                let s = s.trim();
                if let Ok(i) = s.parse::<i128>() {
                    Numeric::Int(i)
                } else if let Ok(f) = s.parse::<f64>() {
                    Numeric::Float(f)
                } else if to == DataType::Bool {
                    match s.to_ascii_lowercase().as_str() {
                        "true" => Numeric::Int(1),
                        "false" | "" => Numeric::Int(0),
                        _ => return Err(self.cast_error(to)),
                    }
                } else {
                    return Err(self.cast_error(to));
                }
            }
            other => other.numeric().ok_or_else(|| self.cast_error(to))?,
        };

        let integral = |min: i128, max: i128| -> Result<i128> {
            let i = match numeric {
                Numeric::Int(i) => i,
                Numeric::Float(f) if f.fract() == 0.0 && f.is_finite() => f as i128,
                Numeric::Float(_) => return Err(self.cast_error(to)),
            };
            if i < min || i > max {
                return Err(EngineError::invalid_argument(format!("[cast] {self:?} is out of range for {to:?}")));
            }
            Ok(i)
        };

        Ok(match to {
            DataType::Bool => Value::Bool(match numeric {
                Numeric::Int(i) => i != 0,
                Numeric::Float(f) => f != 0.0,
            }),
            DataType::Int8 => Value::Int8(integral(i8::MIN as i128, i8::MAX as i128)? as i8),
            DataType::Int16 => Value::Int16(integral(i16::MIN as i128, i16::MAX as i128)? as i16),
            DataType::Int32 => Value::Int32(integral(i32::MIN as i128, i32::MAX as i128)? as i32),
            DataType::Int64 => Value::Int64(integral(i64::MIN as i128, i64::MAX as i128)? as i64),
            DataType::UInt32 => Value::UInt32(integral(0, u32::MAX as i128)? as u32),
            DataType::Time => Value::Time(integral(i64::MIN as i128, i64::MAX as i128)? as i64),
            DataType::Float32 => Value::Float32(match numeric {
                Numeric::Int(i) => i as f32,
                Numeric::Float(f) => f as f32,
            }),
            DataType::Float => Value::Float(match numeric {
                Numeric::Int(i) => i as f64,
                Numeric::Float(f) => f,
            }),
            DataType::ShortText | DataType::Text | DataType::LongText => unreachable!("text handled above"),
        })
    }

    fn cast_error(&self, to: DataType) -> EngineError { EngineError::invalid_argument(format!("[cast] cannot cast {self:?} to {to:?}")) }
}
