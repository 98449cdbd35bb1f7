//! Synthetic shared-memory regions for tests and benchmarks.
//!
//! [`RegionBuilder`] lays out a region the way the simulator does: header at offset 0,
//! descriptor table straight after it, then the session text, then the rotating buffer
//! rows. Offsets are deterministic so tests can poke individual bytes through
//! [`RegionLayout`].

#![cfg(any(test, feature = "benchmark"))]

use std::collections::HashMap;

use crate::VariableType;
use crate::schema::header::{HEADER_SIZE, IRSDK_STATUS_CONNECTED, IRSDK_VER};
use crate::schema::variables::{IRSDK_MAX_DESC, IRSDK_MAX_STRING, VAR_HEADER_SIZE};
use crate::source::MemorySource;

/// Encode one 144-byte descriptor record.
pub fn encode_descriptor(
    name: &str,
    type_code: i32,
    offset: i32,
    count: i32,
    count_as_time: bool,
    description: &str,
    unit: &str,
) -> Vec<u8> {
    let mut record = vec![0u8; VAR_HEADER_SIZE];
    record[0..4].copy_from_slice(&type_code.to_le_bytes());
    record[4..8].copy_from_slice(&offset.to_le_bytes());
    record[8..12].copy_from_slice(&count.to_le_bytes());
    record[12] = u8::from(count_as_time);

    let mut put = |at: usize, max: usize, text: &str| {
        let bytes = text.as_bytes();
        let len = bytes.len().min(max);
        record[at..at + len].copy_from_slice(&bytes[..len]);
    };
    put(16, IRSDK_MAX_STRING, name);
    put(16 + IRSDK_MAX_STRING, IRSDK_MAX_DESC, description);
    put(16 + IRSDK_MAX_STRING + IRSDK_MAX_DESC, IRSDK_MAX_STRING, unit);
    record
}

/// Offset of buffer `index`'s tick counter in the header.
pub fn tick_offset(index: usize) -> usize {
    48 + index * 16
}

fn align(value: usize, to: usize) -> usize {
    value.div_ceil(to) * to
}

#[derive(Debug, Clone)]
struct VariableSpec {
    name: String,
    data_type: VariableType,
    count: usize,
    count_as_time: bool,
    description: String,
    unit: String,
}

/// Where everything landed in a built region.
#[derive(Debug, Clone)]
pub struct RegionLayout {
    pub region_len: usize,
    pub var_header_offset: usize,
    pub session_offset: usize,
    pub session_len: usize,
    pub buf_len: usize,
    pub buffer_offsets: Vec<usize>,
    /// Row offset of each variable
    pub offsets: HashMap<String, usize>,
}

impl RegionLayout {
    /// Absolute offset of `name` inside buffer `index`.
    pub fn value_offset(&self, index: usize, name: &str) -> usize {
        self.buffer_offsets[index] + self.offsets[name]
    }
}

/// Builder for synthetic regions.
#[derive(Debug, Clone)]
pub struct RegionBuilder {
    region_len: Option<usize>,
    ver: i32,
    status: i32,
    tick_rate: i32,
    session_info_update: i32,
    session: Vec<u8>,
    variables: Vec<VariableSpec>,
    ticks: Vec<i32>,
    values: Vec<(Option<usize>, String, Vec<u8>)>,
}

impl Default for RegionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RegionBuilder {
    /// Connected, version 2, one buffer at tick 1, no variables.
    pub fn new() -> Self {
        Self {
            region_len: None,
            ver: IRSDK_VER,
            status: IRSDK_STATUS_CONNECTED,
            tick_rate: 60,
            session_info_update: 1,
            session: Vec::new(),
            variables: Vec::new(),
            ticks: vec![1],
            values: Vec::new(),
        }
    }

    /// Fix the region length instead of sizing it to fit.
    pub fn region_len(mut self, len: usize) -> Self {
        self.region_len = Some(len);
        self
    }

    pub fn version(mut self, ver: i32) -> Self {
        self.ver = ver;
        self
    }

    pub fn status(mut self, status: i32) -> Self {
        self.status = status;
        self
    }

    pub fn disconnected(self) -> Self {
        self.status(0)
    }

    pub fn tick_rate(mut self, tick_rate: i32) -> Self {
        self.tick_rate = tick_rate;
        self
    }

    /// One buffer per tick count, in directory order.
    pub fn buffer_ticks(mut self, ticks: &[i32]) -> Self {
        self.ticks = ticks.to_vec();
        self
    }

    pub fn variable(self, name: &str, data_type: VariableType, count: usize) -> Self {
        self.described(name, data_type, count, "", "")
    }

    /// Add a float variable flagged as a duration in seconds.
    pub fn time_variable(mut self, name: &str, data_type: VariableType) -> Self {
        self = self.described(name, data_type, 1, "", "s");
        if let Some(spec) = self.variables.last_mut() {
            spec.count_as_time = true;
        }
        self
    }

    pub fn described(
        mut self,
        name: &str,
        data_type: VariableType,
        count: usize,
        description: &str,
        unit: &str,
    ) -> Self {
        self.variables.push(VariableSpec {
            name: name.to_string(),
            data_type,
            count,
            count_as_time: false,
            description: description.to_string(),
            unit: unit.to_string(),
        });
        self
    }

    /// Raw session bytes, copied verbatim (include any trailing NULs).
    pub fn session_bytes(mut self, bytes: &[u8]) -> Self {
        self.session = bytes.to_vec();
        self
    }

    pub fn session_text(self, text: &str) -> Self {
        self.session_bytes(text.as_bytes())
    }

    pub fn session_update(mut self, counter: i32) -> Self {
        self.session_info_update = counter;
        self
    }

    /// Write `bytes` at `name` in every buffer.
    pub fn value(mut self, name: &str, bytes: &[u8]) -> Self {
        self.values.push((None, name.to_string(), bytes.to_vec()));
        self
    }

    /// Write `bytes` at `name` in buffer `index` only.
    pub fn value_in(mut self, index: usize, name: &str, bytes: &[u8]) -> Self {
        self.values.push((Some(index), name.to_string(), bytes.to_vec()));
        self
    }

    pub fn layout(&self) -> RegionLayout {
        let mut offsets = HashMap::new();
        let mut row_len = 0;
        for spec in &self.variables {
            offsets.insert(spec.name.clone(), row_len);
            row_len += spec.data_type.size() * spec.count;
        }
        let buf_len = align(row_len.max(1), 16);

        let var_header_offset = HEADER_SIZE;
        let session_offset = align(var_header_offset + self.variables.len() * VAR_HEADER_SIZE, 16);
        let session_len = self.session.len();
        let buffers_start = align(session_offset + session_len, 16);
        let buffer_offsets: Vec<usize> =
            (0..self.ticks.len()).map(|index| buffers_start + index * buf_len).collect();
        let needed = buffers_start + self.ticks.len() * buf_len;

        RegionLayout {
            region_len: self.region_len.unwrap_or_else(|| align(needed, 4096)),
            var_header_offset,
            session_offset,
            session_len,
            buf_len,
            buffer_offsets,
            offsets,
        }
    }

    pub fn build(&self) -> Vec<u8> {
        let layout = self.layout();
        let mut region = vec![0u8; layout.region_len.max(HEADER_SIZE)];

        let mut put = |at: usize, bytes: &[u8]| {
            if at + bytes.len() <= region.len() {
                region[at..at + bytes.len()].copy_from_slice(bytes);
            }
        };

        let fields = [
            self.ver,
            self.status,
            self.tick_rate,
            self.session_info_update,
            layout.session_len as i32,
            layout.session_offset as i32,
            self.variables.len() as i32,
            layout.var_header_offset as i32,
            self.ticks.len() as i32,
            layout.buf_len as i32,
        ];
        for (index, value) in fields.iter().enumerate() {
            put(index * 4, &value.to_le_bytes());
        }

        for (index, tick) in self.ticks.iter().enumerate() {
            put(tick_offset(index), &tick.to_le_bytes());
            put(tick_offset(index) + 4, &(layout.buffer_offsets[index] as i32).to_le_bytes());
        }

        for (index, spec) in self.variables.iter().enumerate() {
            let record = encode_descriptor(
                &spec.name,
                spec.data_type.code(),
                layout.offsets[&spec.name] as i32,
                spec.count as i32,
                spec.count_as_time,
                &spec.description,
                &spec.unit,
            );
            put(layout.var_header_offset + index * VAR_HEADER_SIZE, &record);
        }

        put(layout.session_offset, &self.session);

        for (target, name, bytes) in &self.values {
            let buffers: Vec<usize> = match target {
                Some(index) => vec![*index],
                None => (0..self.ticks.len()).collect(),
            };
            for index in buffers {
                put(layout.value_offset(index, name), bytes);
            }
        }

        region
    }

    pub fn build_source(&self) -> MemorySource {
        MemorySource::new(self.build())
    }
}
