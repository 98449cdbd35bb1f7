//! Variable data parsing trait and implementations

use super::{BitField, Value, VariableDescriptor, VariableType};
use crate::{Result, TelemetryError};

/// Trait for types that can be parsed from a telemetry row.
pub trait VarData: Sized {
    /// Parse this type from `row` using the descriptor's type, offset and count.
    fn from_bytes(row: &[u8], descriptor: &VariableDescriptor) -> Result<Self>;
}

/// Fixed-width little-endian element of one variable type.
trait Element: Sized {
    const TYPE: VariableType;

    /// Decode from exactly `TYPE.size()` bytes.
    fn from_le(bytes: &[u8]) -> Self;
}

fn le4(bytes: &[u8]) -> [u8; 4] {
    [bytes[0], bytes[1], bytes[2], bytes[3]]
}

fn le8(bytes: &[u8]) -> [u8; 8] {
    [bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7]]
}

impl Element for u8 {
    const TYPE: VariableType = VariableType::Char;

    fn from_le(bytes: &[u8]) -> Self {
        bytes[0]
    }
}

impl Element for bool {
    const TYPE: VariableType = VariableType::Bool;

    fn from_le(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }
}

impl Element for i32 {
    const TYPE: VariableType = VariableType::Int32;

    fn from_le(bytes: &[u8]) -> Self {
        i32::from_le_bytes(le4(bytes))
    }
}

impl Element for BitField {
    const TYPE: VariableType = VariableType::BitField;

    fn from_le(bytes: &[u8]) -> Self {
        BitField(u32::from_le_bytes(le4(bytes)))
    }
}

impl Element for f32 {
    const TYPE: VariableType = VariableType::Float32;

    fn from_le(bytes: &[u8]) -> Self {
        f32::from_le_bytes(le4(bytes))
    }
}

impl Element for f64 {
    const TYPE: VariableType = VariableType::Float64;

    fn from_le(bytes: &[u8]) -> Self {
        f64::from_le_bytes(le8(bytes))
    }
}

fn check_type(descriptor: &VariableDescriptor, expected: VariableType) -> Result<()> {
    if descriptor.data_type != expected {
        return Err(TelemetryError::TypeConversion {
            details: format!(
                "Variable '{}' is {:?}, expected {:?}",
                descriptor.name, descriptor.data_type, expected
            ),
        });
    }
    Ok(())
}

/// The variable's bytes in `row`, bounds checked.
fn variable_bytes<'a>(row: &'a [u8], descriptor: &VariableDescriptor) -> Result<&'a [u8]> {
    row.get(descriptor.offset..descriptor.end()).ok_or_else(|| {
        TelemetryError::geometry(format!(
            "Variable '{}' spans bytes {}..{} of a {}-byte row",
            descriptor.name,
            descriptor.offset,
            descriptor.end(),
            row.len()
        ))
    })
}

fn decode_elements<T: Element>(bytes: &[u8]) -> Vec<T> {
    bytes.chunks_exact(T::TYPE.size()).map(T::from_le).collect()
}

macro_rules! impl_scalar_var_data {
    ($($ty:ty),* $(,)?) => {
        $(
            impl VarData for $ty {
                fn from_bytes(row: &[u8], descriptor: &VariableDescriptor) -> Result<Self> {
                    check_type(descriptor, <$ty as Element>::TYPE)?;
                    let bytes = variable_bytes(row, descriptor)?;
                    Ok(<$ty as Element>::from_le(bytes))
                }
            }
        )*
    };
}

impl_scalar_var_data!(u8, bool, i32, BitField, f32, f64);

// Arrays decode all `count` elements; scalars read the first.
impl<T: Element> VarData for Vec<T> {
    fn from_bytes(row: &[u8], descriptor: &VariableDescriptor) -> Result<Self> {
        check_type(descriptor, T::TYPE)?;
        let bytes = variable_bytes(row, descriptor)?;
        Ok(decode_elements(bytes))
    }
}

impl VarData for Value {
    fn from_bytes(row: &[u8], descriptor: &VariableDescriptor) -> Result<Self> {
        let bytes = variable_bytes(row, descriptor)?;

        if descriptor.is_array() {
            return Ok(match descriptor.data_type {
                VariableType::Char => Value::CharArray(bytes.to_vec()),
                VariableType::Bool => Value::BoolArray(decode_elements(bytes)),
                VariableType::Int32 => Value::Int32Array(decode_elements(bytes)),
                VariableType::BitField => Value::BitFieldArray(decode_elements(bytes)),
                VariableType::Float32 => Value::Float32Array(decode_elements(bytes)),
                VariableType::Float64 => Value::Float64Array(decode_elements(bytes)),
            });
        }

        Ok(match descriptor.data_type {
            VariableType::Char => Value::Char(<u8 as Element>::from_le(bytes)),
            VariableType::Bool => Value::Bool(<bool as Element>::from_le(bytes)),
            VariableType::Int32 => Value::Int32(<i32 as Element>::from_le(bytes)),
            VariableType::BitField => Value::BitField(<BitField as Element>::from_le(bytes)),
            VariableType::Float32 => Value::Float32(<f32 as Element>::from_le(bytes)),
            VariableType::Float64 => Value::Float64(<f64 as Element>::from_le(bytes)),
        })
    }
}
