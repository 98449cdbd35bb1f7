//! iRacing Variable Descriptor Parsing
//!
//! Decodes the `irsdk_varHeader` records that describe every variable in a telemetry
//! row.
//!
//! # iRacing Variable Header Layout
//!
//! ```c
//! typedef struct irsdk_varHeader
//! {
//!     int type;                           // irsdk_VarType enum value
//!     int offset;                         // offset in bytes from buffer start
//!     int count;                          // number of elements (1 for scalar)
//!     bool countAsTime;                   // value is a duration in seconds
//!     char pad[3];
//!     char name[IRSDK_MAX_STRING];        // variable name (32 bytes)
//!     char desc[IRSDK_MAX_DESC];          // description (64 bytes)
//!     char unit[IRSDK_MAX_STRING];        // units (32 bytes)
//! } irsdk_varHeader;
//! ```
//!
//! `numVars` records of 144 bytes each start at `varHeaderOffset`. String fields are
//! NUL-padded; trailing NULs are trimmed and the remainder converted lossily to UTF-8.
//!
//! # Type Mapping
//!
//! - `irsdk_char` (0) → `VariableType::Char`
//! - `irsdk_bool` (1) → `VariableType::Bool`
//! - `irsdk_int` (2) → `VariableType::Int32`
//! - `irsdk_bitField` (3) → `VariableType::BitField`
//! - `irsdk_float` (4) → `VariableType::Float32`
//! - `irsdk_double` (5) → `VariableType::Float64`
//!
//! Any other code fails the whole table with a parse error.

use crate::schema::header::Header;
use crate::source::ByteSource;
use crate::{DescriptorTable, Result, TelemetryError, VariableDescriptor, VariableType};
use tracing::{debug, trace, warn};

/// Size of the name and unit fields
pub const IRSDK_MAX_STRING: usize = 32;
/// Size of the description field
pub const IRSDK_MAX_DESC: usize = 64;
/// Size in bytes of one encoded descriptor record
pub const VAR_HEADER_SIZE: usize = 144;

const NAME_OFFSET: usize = 16;
const DESC_OFFSET: usize = NAME_OFFSET + IRSDK_MAX_STRING;
const UNIT_OFFSET: usize = DESC_OFFSET + IRSDK_MAX_DESC;

/// Raw fields of one record before validation.
#[derive(Debug)]
struct RawDescriptor {
    var_type: i32,
    offset: i32,
    count: i32,
    count_as_time: u8,
    name: String,
    desc: String,
    unit: String,
}

impl RawDescriptor {
    fn parse(record: &[u8]) -> Self {
        let int = |at: usize| {
            i32::from_le_bytes([record[at], record[at + 1], record[at + 2], record[at + 3]])
        };

        Self {
            var_type: int(0),
            offset: int(4),
            count: int(8),
            count_as_time: record[12],
            name: trim_c_string(&record[NAME_OFFSET..NAME_OFFSET + IRSDK_MAX_STRING]),
            desc: trim_c_string(&record[DESC_OFFSET..DESC_OFFSET + IRSDK_MAX_DESC]),
            unit: trim_c_string(&record[UNIT_OFFSET..UNIT_OFFSET + IRSDK_MAX_STRING]),
        }
    }

    fn into_descriptor(self, index: usize) -> Result<VariableDescriptor> {
        let data_type = VariableType::from_code(self.var_type).ok_or_else(|| {
            TelemetryError::parse(
                "Variable descriptor",
                format!("Record {} ('{}') has unknown type code {}", index, self.name, self.var_type),
            )
        })?;

        if self.count < 1 {
            return Err(TelemetryError::parse(
                "Variable descriptor",
                format!("Record {} ('{}') has element count {}", index, self.name, self.count),
            ));
        }

        if self.offset < 0 {
            return Err(TelemetryError::geometry(format!(
                "Variable '{}' has negative offset {}",
                self.name, self.offset
            )));
        }

        Ok(VariableDescriptor {
            name: self.name,
            description: self.desc,
            unit: self.unit,
            data_type,
            offset: self.offset as usize,
            count: self.count as usize,
            count_as_time: self.count_as_time != 0,
        })
    }
}

/// Convert a NUL-padded C string field, trimming trailing NULs.
pub fn trim_c_string(bytes: &[u8]) -> String {
    let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |last| last + 1);
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// Read the raw descriptor table bytes located by `header`.
pub fn read_table_bytes<S: ByteSource + ?Sized>(source: &S, header: &Header) -> Result<Vec<u8>> {
    let num_vars = usize::try_from(header.num_vars)
        .map_err(|_| TelemetryError::geometry(format!("Invalid num_vars: {}", header.num_vars)))?;
    let offset = u64::try_from(header.var_header_offset).map_err(|_| {
        TelemetryError::geometry(format!("Invalid var header offset: {}", header.var_header_offset))
    })?;

    trace!(num_vars, offset, "Reading descriptor table");
    source.read_at(offset, num_vars * VAR_HEADER_SIZE)
}

/// Decode `num_vars` records from `bytes` into a validated table for rows of `row_len`.
pub fn parse_descriptor_table(bytes: &[u8], num_vars: usize, row_len: usize) -> Result<DescriptorTable> {
    let needed = num_vars * VAR_HEADER_SIZE;
    if bytes.len() < needed {
        return Err(TelemetryError::read_failed(
            0,
            needed,
            format!("descriptor table is {} bytes", bytes.len()),
        ));
    }

    let mut table = DescriptorTable::new(row_len);

    for (index, record) in bytes[..needed].chunks_exact(VAR_HEADER_SIZE).enumerate() {
        let raw = RawDescriptor::parse(record);

        // Padding slot
        if raw.name.is_empty() {
            continue;
        }

        let descriptor = raw.into_descriptor(index)?;
        if let Some(previous) = table.insert(descriptor) {
            warn!(name = %previous.name, index, "Duplicate variable name, later record wins");
        }
    }

    table.validate()?;

    debug!(variables = table.len(), row_len, "Parsed descriptor table");
    Ok(table)
}

/// Read and decode the descriptor table located by `header`.
pub fn read_descriptor_table<S: ByteSource + ?Sized>(
    source: &S,
    header: &Header,
) -> Result<DescriptorTable> {
    let bytes = read_table_bytes(source, header)?;
    parse_descriptor_table(&bytes, bytes.len() / VAR_HEADER_SIZE, header.buf_len.max(0) as usize)
}
