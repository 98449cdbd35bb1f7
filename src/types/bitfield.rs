//! BitField type for handling iRacing bitfield variables

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque 32-bit mask. Callers test individual bits or flag masks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BitField(pub u32);

impl BitField {
    /// Create a new BitField from a u32 value.
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    /// Check if a specific bit is set. Bits past 31 are never set.
    pub fn is_set(&self, bit: u32) -> bool {
        bit < 32 && (self.0 & (1 << bit)) != 0
    }

    /// Check if any bit of `flag` is set.
    pub fn has_flag(&self, flag: u32) -> bool {
        (self.0 & flag) != 0
    }

    /// Check if every bit of `mask` is set.
    pub fn contains(&self, mask: u32) -> bool {
        (self.0 & mask) == mask
    }

    /// Number of set bits.
    pub fn count_set(&self) -> u32 {
        self.0.count_ones()
    }

    /// Get the raw u32 value.
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl From<u32> for BitField {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// Hex rendering, e.g. `0x80000000`.
impl fmt::Display for BitField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}
