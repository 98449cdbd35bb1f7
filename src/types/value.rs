//! Decoded telemetry values

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use super::{BitField, VariableType, time};

/// A decoded variable: a scalar or a fixed-length array of one declared type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Char(u8),
    CharArray(Vec<u8>),
    Bool(bool),
    BoolArray(Vec<bool>),
    Int32(i32),
    Int32Array(Vec<i32>),
    BitField(BitField),
    BitFieldArray(Vec<BitField>),
    Float32(f32),
    Float32Array(Vec<f32>),
    Float64(f64),
    Float64Array(Vec<f64>),
}

impl Value {
    /// The declared element type.
    pub fn variable_type(&self) -> VariableType {
        match self {
            Value::Char(_) | Value::CharArray(_) => VariableType::Char,
            Value::Bool(_) | Value::BoolArray(_) => VariableType::Bool,
            Value::Int32(_) | Value::Int32Array(_) => VariableType::Int32,
            Value::BitField(_) | Value::BitFieldArray(_) => VariableType::BitField,
            Value::Float32(_) | Value::Float32Array(_) => VariableType::Float32,
            Value::Float64(_) | Value::Float64Array(_) => VariableType::Float64,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(
            self,
            Value::CharArray(_)
                | Value::BoolArray(_)
                | Value::Int32Array(_)
                | Value::BitFieldArray(_)
                | Value::Float32Array(_)
                | Value::Float64Array(_)
        )
    }

    /// Element count (1 for scalars).
    pub fn len(&self) -> usize {
        match self {
            Value::CharArray(v) => v.len(),
            Value::BoolArray(v) => v.len(),
            Value::Int32Array(v) => v.len(),
            Value::BitFieldArray(v) => v.len(),
            Value::Float32Array(v) => v.len(),
            Value::Float64Array(v) => v.len(),
            _ => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_u8(&self) -> Option<u8> {
        match self {
            Value::Char(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bitfield(&self) -> Option<BitField> {
        match self {
            Value::BitField(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Value::Float32(v) => Some(*v),
            _ => None,
        }
    }

    /// Scalar float of either width, widened to f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float32(v) => Some(f64::from(*v)),
            Value::Float64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::CharArray(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool_slice(&self) -> Option<&[bool]> {
        match self {
            Value::BoolArray(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i32_slice(&self) -> Option<&[i32]> {
        match self {
            Value::Int32Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bitfield_slice(&self) -> Option<&[BitField]> {
        match self {
            Value::BitFieldArray(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f32_slice(&self) -> Option<&[f32]> {
        match self {
            Value::Float32Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64_slice(&self) -> Option<&[f64]> {
        match self {
            Value::Float64Array(v) => Some(v),
            _ => None,
        }
    }

    /// Scalar float interpreted as seconds. May be negative for "unset" sentinels.
    pub fn as_seconds(&self) -> Option<f64> {
        self.as_f64()
    }

    /// Scalar float as a [`Duration`] (`value * 1s`). `None` for negative or non-finite
    /// values, which a `Duration` cannot represent.
    pub fn as_duration(&self) -> Option<Duration> {
        self.as_seconds().and_then(time::seconds_to_duration)
    }

    /// `m:ss.mmm` rendering of a scalar float. `Float32` values are scaled in single
    /// precision.
    pub fn duration_text(&self) -> Option<String> {
        match self {
            Value::Float32(v) => Some(time::format_lap_time_f32(*v)),
            _ => self.as_seconds().map(time::format_lap_time),
        }
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    f.write_str("[")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{}", item)?;
    }
    f.write_str("]")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Char(v) => write!(f, "{}", v),
            Value::CharArray(v) => write_list(f, v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::BoolArray(v) => write_list(f, v),
            Value::Int32(v) => write!(f, "{}", v),
            Value::Int32Array(v) => write_list(f, v),
            Value::BitField(v) => write!(f, "{}", v),
            Value::BitFieldArray(v) => write_list(f, v),
            Value::Float32(v) => write!(f, "{}", v),
            Value::Float32Array(v) => write_list(f, v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::Float64Array(v) => write_list(f, v),
        }
    }
}
