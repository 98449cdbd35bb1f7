//! Immutable decoded telemetry snapshot

use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;

use super::{DescriptorTable, Value, VarData, VariableDescriptor};
use crate::{Result, TelemetryError};

/// A fully decoded, point-in-time view of every variable in one buffer row.
///
/// Snapshots are never mutated after construction; a newer poll produces a new
/// snapshot. Share them behind [`Arc`].
#[derive(Debug, Clone)]
pub struct Snapshot {
    tick: i32,
    buffer_index: usize,
    session_version: i32,
    captured_at: SystemTime,
    values: HashMap<String, Value>,
    descriptors: Arc<DescriptorTable>,
    header_bytes: Arc<[u8]>,
    row: Arc<[u8]>,
}

impl Snapshot {
    /// Assemble a snapshot from a decoded row.
    pub fn new(
        tick: i32,
        buffer_index: usize,
        session_version: i32,
        values: HashMap<String, Value>,
        descriptors: Arc<DescriptorTable>,
        header_bytes: Arc<[u8]>,
        row: Arc<[u8]>,
    ) -> Self {
        Self {
            tick,
            buffer_index,
            session_version,
            captured_at: SystemTime::now(),
            values,
            descriptors,
            header_bytes,
            row,
        }
    }

    /// Tick count of the buffer this snapshot was decoded from.
    pub fn tick(&self) -> i32 {
        self.tick
    }

    pub fn buffer_index(&self) -> usize {
        self.buffer_index
    }

    /// Session info update counter at capture time.
    pub fn session_version(&self) -> i32 {
        self.session_version
    }

    /// Wall-clock capture time.
    pub fn captured_at(&self) -> SystemTime {
        self.captured_at
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Decoded value of `name`.
    pub fn get(&self, name: &str) -> Result<&Value> {
        self.values.get(name).ok_or_else(|| TelemetryError::unknown_variable(name))
    }

    /// Decode `name` straight from the captured row as `T`.
    ///
    /// ```rust
    /// # fn demo(snapshot: &paddock::Snapshot) -> paddock::Result<()> {
    /// let rpm: f32 = snapshot.value("RPM")?;
    /// let lap_dist: Vec<f32> = snapshot.value("CarIdxLapDistPct")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn value<T: VarData>(&self, name: &str) -> Result<T> {
        let descriptor = self.descriptor(name)?;
        T::from_bytes(&self.row, descriptor)
    }

    pub fn descriptor(&self, name: &str) -> Result<&VariableDescriptor> {
        self.descriptors.get(name).ok_or_else(|| TelemetryError::unknown_variable(name))
    }

    pub fn descriptors(&self) -> &Arc<DescriptorTable> {
        &self.descriptors
    }

    /// `m:ss.mmm` text for a float variable.
    pub fn time_text(&self, name: &str) -> Result<String> {
        let value = self.get(name)?;
        value.duration_text().ok_or_else(|| TelemetryError::TypeConversion {
            details: format!("Variable '{}' is {:?}, not a scalar float", name, value.variable_type()),
        })
    }

    /// Values in descriptor table order.
    pub fn iter(&self) -> impl Iterator<Item = (&VariableDescriptor, &Value)> {
        self.descriptors
            .iter()
            .filter_map(|descriptor| self.values.get(&descriptor.name).map(|value| (descriptor, value)))
    }

    /// The raw row bytes the values were decoded from.
    pub fn row(&self) -> &[u8] {
        &self.row
    }

    /// The header bytes as read for this snapshot.
    pub fn header_bytes(&self) -> &[u8] {
        &self.header_bytes
    }

    /// Header bytes followed by row bytes, for persistence.
    pub fn export_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.header_bytes.len() + self.row.len());
        bytes.extend_from_slice(&self.header_bytes);
        bytes.extend_from_slice(&self.row);
        bytes
    }
}
