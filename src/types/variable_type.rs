//! Telemetry variable type definitions

use serde::{Deserialize, Serialize};

/// Value types a variable descriptor can declare.
/// Maps to iRacing SDK's irsdk_VarType enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariableType {
    /// 8-bit character (maps to irsdk_char)
    Char,
    /// Boolean stored as one byte (maps to irsdk_bool)
    Bool,
    /// 32-bit signed integer (maps to irsdk_int)
    Int32,
    /// 32-bit bitfield (maps to irsdk_bitField)
    BitField,
    /// 32-bit floating point (maps to irsdk_float)
    Float32,
    /// 64-bit floating point (maps to irsdk_double)
    Float64,
}

impl VariableType {
    /// Every variant, in type-code order.
    pub const ALL: [VariableType; 6] = [
        VariableType::Char,
        VariableType::Bool,
        VariableType::Int32,
        VariableType::BitField,
        VariableType::Float32,
        VariableType::Float64,
    ];

    /// Returns the size in bytes of one element of this type.
    /// Matches the irsdk_VarTypeBytes array from the iRacing SDK.
    pub const fn size(&self) -> usize {
        match self {
            VariableType::Char | VariableType::Bool => 1,
            VariableType::Int32 | VariableType::BitField | VariableType::Float32 => 4,
            VariableType::Float64 => 8,
        }
    }

    /// Map a raw irsdk_VarType code.
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(VariableType::Char),
            1 => Some(VariableType::Bool),
            2 => Some(VariableType::Int32),
            3 => Some(VariableType::BitField),
            4 => Some(VariableType::Float32),
            5 => Some(VariableType::Float64),
            _ => None,
        }
    }

    /// The raw irsdk_VarType code.
    pub const fn code(&self) -> i32 {
        match self {
            VariableType::Char => 0,
            VariableType::Bool => 1,
            VariableType::Int32 => 2,
            VariableType::BitField => 3,
            VariableType::Float32 => 4,
            VariableType::Float64 => 5,
        }
    }

    /// Whether values of this type may carry the "represents a time duration" flag.
    pub const fn is_float(&self) -> bool {
        matches!(self, VariableType::Float32 | VariableType::Float64)
    }
}
