//! Variable descriptor and descriptor table types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::VariableType;

/// Metadata describing one named variable's type, location and array shape in a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableDescriptor {
    /// Variable name as defined by iRacing (unique key)
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Units of measurement (e.g., "m/s", "C", "N*m")
    pub unit: String,
    /// Data type of each element
    pub data_type: VariableType,
    /// Byte offset within a buffer row
    pub offset: usize,
    /// Number of elements (1 for scalar, >1 for fixed-length arrays)
    pub count: usize,
    /// Whether the value represents a time duration in seconds
    pub count_as_time: bool,
}

impl VariableDescriptor {
    /// Total bytes the variable occupies in a row.
    pub fn byte_len(&self) -> usize {
        self.data_type.size() * self.count
    }

    /// First byte past the variable in a row.
    pub fn end(&self) -> usize {
        self.offset + self.byte_len()
    }

    /// Whether the variable is a fixed-length array.
    pub fn is_array(&self) -> bool {
        self.count > 1
    }

    /// Whether callers should interpret the value as a duration.
    pub fn is_time(&self) -> bool {
        self.count_as_time && self.data_type.is_float()
    }
}

/// Descriptor table for one header generation, keyed by name and kept in table order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DescriptorTable {
    entries: Vec<VariableDescriptor>,
    index: HashMap<String, usize>,
    /// Length in bytes of one buffer row
    row_len: usize,
}

impl DescriptorTable {
    /// Create an empty table for rows of `row_len` bytes.
    pub fn new(row_len: usize) -> Self {
        Self { entries: Vec::new(), index: HashMap::new(), row_len }
    }

    /// Insert a descriptor. A later descriptor with the same name replaces the earlier
    /// one and the replaced descriptor is returned.
    pub fn insert(&mut self, descriptor: VariableDescriptor) -> Option<VariableDescriptor> {
        match self.index.get(&descriptor.name) {
            Some(&slot) => Some(std::mem::replace(&mut self.entries[slot], descriptor)),
            None => {
                self.index.insert(descriptor.name.clone(), self.entries.len());
                self.entries.push(descriptor);
                None
            }
        }
    }

    /// Check every descriptor fits inside a row.
    pub fn validate(&self) -> crate::Result<()> {
        for descriptor in &self.entries {
            if descriptor.count == 0 {
                return Err(crate::TelemetryError::parse(
                    "Descriptor validation",
                    format!("Variable '{}' has count of 0", descriptor.name),
                ));
            }

            if descriptor.end() > self.row_len {
                return Err(crate::TelemetryError::geometry(format!(
                    "Variable '{}' spans bytes {}..{} but rows are {} bytes",
                    descriptor.name,
                    descriptor.offset,
                    descriptor.end(),
                    self.row_len
                )));
            }
        }

        Ok(())
    }

    /// Get a descriptor by name (O(1) lookup).
    pub fn get(&self, name: &str) -> Option<&VariableDescriptor> {
        self.index.get(name).map(|&slot| &self.entries[slot])
    }

    /// Check if a variable exists.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Number of distinct variables.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Length in bytes of one buffer row.
    pub fn row_len(&self) -> usize {
        self.row_len
    }

    /// Descriptors in table order.
    pub fn iter(&self) -> impl Iterator<Item = &VariableDescriptor> {
        self.entries.iter()
    }
}
