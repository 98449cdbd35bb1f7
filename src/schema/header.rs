//! iRacing Header Structure Parsing
//!
//! This module decodes iRacing's `irsdk_header` structure from the start of the shared
//! memory region. The header locates everything else: the session text, the variable
//! descriptor table and the rotating telemetry buffers.
//!
//! # iRacing Header Layout
//!
//! ```c
//! typedef struct irsdk_header
//! {
//!     int ver;                    // api version 1 for older clients, 2 for newer
//!     int status;                 // bitfield for status
//!     int tickRate;               // ticks per second (60hz)
//!     int sessionInfoUpdate;      // incremented when session info changes
//!     int sessionInfoLen;         // length in bytes of session info string
//!     int sessionInfoOffset;      // offset to session info string
//!     int numVars;                // length of iarVarHeader array
//!     int varHeaderOffset;        // offset to iarVarHeader[0]
//!     int numBuf;                 // num of buffers (<= 4)
//!     int bufLen;                 // length in bytes for each buffer
//!     int pad1[2];
//!     irsdk_varBuf varBuf[4];     // buffers
//! } irsdk_header;
//! ```
//!
//! All fields are little-endian. The header is 112 bytes: 40 bytes of fields, 8 bytes of
//! padding, then four 16-byte buffer entries starting at offset 48.
//!
//! # Buffer Directory
//!
//! Each `varBuf` entry carries the tick count of the last completed write into that
//! buffer and the buffer's byte offset from the start of the region. Only the first
//! `numBuf` entries are live. [`Header::read_tick_counts`] re-reads just the tick
//! counters, which is all the snapshot reader needs to detect a buffer being recycled
//! underneath it.

use crate::source::ByteSource;
use crate::{Result, TelemetryError};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// The current iRacing SDK version
pub const IRSDK_VER: i32 = 2;

/// Status flag indicating that the simulator is actively publishing telemetry
pub const IRSDK_STATUS_CONNECTED: i32 = 0x1;

/// Maximum number of rotating telemetry buffers
pub const IRSDK_MAX_BUFS: usize = 4;

/// Size in bytes of the encoded header
pub const HEADER_SIZE: usize = 112;

/// Size in bytes of the shared memory region published by the simulator
pub const IRSDK_MEMMAP_SIZE: usize = 1164 * 1024;

/// Name of the shared memory mapping
pub const IRSDK_MEMMAP_FILENAME: &str = "Local\\IRSDKMemMapFileName";

/// Name of the "new data available" event
pub const IRSDK_DATAVALID_EVENTNAME: &str = "Local\\IRSDKDataValidEvent";

const VAR_BUF_OFFSET: usize = 48;
const VAR_BUF_SIZE: usize = 16;

/// Header generations the decoder knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeaderVersion {
    /// Older clients
    V1,
    /// Current SDK
    V2,
}

impl HeaderVersion {
    pub const LATEST: HeaderVersion = HeaderVersion::V2;

    pub fn from_raw(ver: i32) -> Option<Self> {
        match ver {
            1 => Some(HeaderVersion::V1),
            2 => Some(HeaderVersion::V2),
            _ => None,
        }
    }

    pub fn raw(self) -> i32 {
        match self {
            HeaderVersion::V1 => 1,
            HeaderVersion::V2 => 2,
        }
    }

    /// Decode a header of this generation. Both generations share one layout.
    fn decode(self, bytes: &[u8; HEADER_SIZE]) -> Header {
        match self {
            HeaderVersion::V1 | HeaderVersion::V2 => decode_layout(bytes),
        }
    }
}

/// One entry of the rotating buffer directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarBuf {
    /// Tick count of the last completed write into this buffer
    pub tick_count: i32,
    /// Offset from the start of the region to the buffer row
    pub buf_offset: i32,
}

/// Decoded `irsdk_header`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// API version
    pub ver: i32,
    /// Status bitfield
    pub status: i32,
    /// Ticks per second (typically 60Hz)
    pub tick_rate: i32,
    /// Incremented when session info changes
    pub session_info_update: i32,
    /// Length in bytes of session info string
    pub session_info_len: i32,
    /// Offset to session info string
    pub session_info_offset: i32,
    /// Number of variable descriptors
    pub num_vars: i32,
    /// Offset to the variable descriptor table
    pub var_header_offset: i32,
    /// Number of live buffers
    pub num_buf: i32,
    /// Length in bytes of each buffer row
    pub buf_len: i32,
    /// Buffer directory
    pub var_buf: [VarBuf; IRSDK_MAX_BUFS],
}

fn i32_at(bytes: &[u8], offset: usize) -> i32 {
    i32::from_le_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
}

fn decode_layout(bytes: &[u8; HEADER_SIZE]) -> Header {
    let field = |index: usize| i32_at(bytes, index * 4);

    let mut var_buf = [VarBuf::default(); IRSDK_MAX_BUFS];
    for (index, entry) in var_buf.iter_mut().enumerate() {
        let base = VAR_BUF_OFFSET + index * VAR_BUF_SIZE;
        entry.tick_count = i32_at(bytes, base);
        entry.buf_offset = i32_at(bytes, base + 4);
    }

    Header {
        ver: field(0),
        status: field(1),
        tick_rate: field(2),
        session_info_update: field(3),
        session_info_len: field(4),
        session_info_offset: field(5),
        num_vars: field(6),
        var_header_offset: field(7),
        num_buf: field(8),
        buf_len: field(9),
        var_buf,
    }
}

/// Check `[offset, offset + len)` lies inside `[0, region_len)`.
fn check_span(what: &str, offset: i64, len: i64, region_len: usize) -> Result<()> {
    let end = offset + len;
    if offset < 0 || len < 0 || end > region_len as i64 {
        return Err(TelemetryError::geometry(format!(
            "{} spans bytes {}..{} outside the {}-byte region",
            what, offset, end, region_len
        )));
    }
    Ok(())
}

impl Header {
    /// Decode a header from the first [`HEADER_SIZE`] bytes of `bytes`.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let raw: &[u8; HEADER_SIZE] = bytes
            .get(..HEADER_SIZE)
            .and_then(|span| span.try_into().ok())
            .ok_or_else(|| {
                TelemetryError::read_failed(0, HEADER_SIZE, format!("only {} header bytes", bytes.len()))
            })?;

        let ver = i32_at(raw, 0);
        let header = HeaderVersion::from_raw(ver).unwrap_or(HeaderVersion::LATEST).decode(raw);

        trace!(
            ver = header.ver,
            status = header.status,
            tick_rate = header.tick_rate,
            session_info_update = header.session_info_update,
            num_vars = header.num_vars,
            num_buf = header.num_buf,
            buf_len = header.buf_len,
            "Decoded header"
        );

        Ok(header)
    }

    /// Read the raw header span at offset 0.
    pub fn read_raw<S: ByteSource + ?Sized>(source: &S) -> Result<[u8; HEADER_SIZE]> {
        let mut raw = [0u8; HEADER_SIZE];
        source.read_into(0, &mut raw)?;
        Ok(raw)
    }

    /// Read and decode the header.
    pub fn read_from<S: ByteSource + ?Sized>(source: &S) -> Result<Self> {
        Self::parse(&Self::read_raw(source)?)
    }

    /// Re-read only the buffer directory tick counters.
    pub fn read_tick_counts<S: ByteSource + ?Sized>(source: &S) -> Result<[i32; IRSDK_MAX_BUFS]> {
        let mut raw = [0u8; IRSDK_MAX_BUFS * VAR_BUF_SIZE];
        source.read_into(VAR_BUF_OFFSET as u64, &mut raw)?;

        let mut ticks = [0i32; IRSDK_MAX_BUFS];
        for (index, tick) in ticks.iter_mut().enumerate() {
            *tick = i32_at(&raw, index * VAR_BUF_SIZE);
        }
        Ok(ticks)
    }

    /// Returns true when iRacing reports the shared memory is live
    pub fn is_connected(&self) -> bool {
        (self.status & IRSDK_STATUS_CONNECTED) != 0
    }

    /// Check if session info has been updated since last check
    pub fn session_info_changed(&self, last_update: i32) -> bool {
        self.session_info_update != last_update
    }

    /// The known header generation, or a `Version` error.
    pub fn version(&self) -> Result<HeaderVersion> {
        HeaderVersion::from_raw(self.ver)
            .ok_or(TelemetryError::Version { expected: IRSDK_VER, found: self.ver })
    }

    /// The live buffer directory entries (`numBuf`, clamped to `0..=4`).
    pub fn buffers(&self) -> &[VarBuf] {
        let live = self.num_buf.clamp(0, IRSDK_MAX_BUFS as i32) as usize;
        &self.var_buf[..live]
    }

    /// Tick rate in Hz, or `None` when the writer has not published one.
    pub fn tick_rate_hz(&self) -> Option<f64> {
        (self.tick_rate > 0).then_some(f64::from(self.tick_rate))
    }

    /// Check the header describes a layout that fits a region of `region_len` bytes.
    pub fn validate(&self, region_len: usize) -> Result<()> {
        self.version()?;

        if self.num_buf < 1 || self.num_buf > IRSDK_MAX_BUFS as i32 {
            return Err(TelemetryError::geometry(format!(
                "Expected 1-{} buffers, found {}",
                IRSDK_MAX_BUFS, self.num_buf
            )));
        }

        if self.buf_len <= 0 {
            return Err(TelemetryError::geometry(format!("Invalid buffer length: {}", self.buf_len)));
        }

        if self.num_vars < 0 {
            return Err(TelemetryError::geometry(format!("Invalid num_vars: {}", self.num_vars)));
        }

        check_span(
            "Session info",
            i64::from(self.session_info_offset),
            i64::from(self.session_info_len),
            region_len,
        )?;

        check_span(
            "Variable descriptor table",
            i64::from(self.var_header_offset),
            i64::from(self.num_vars) * super::variables::VAR_HEADER_SIZE as i64,
            region_len,
        )?;

        for (index, buf) in self.buffers().iter().enumerate() {
            check_span(
                &format!("Buffer {}", index),
                i64::from(buf.buf_offset),
                i64::from(self.buf_len),
                region_len,
            )?;
        }

        debug!(num_buf = self.num_buf, buf_len = self.buf_len, region_len, "Header geometry valid");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::RegionBuilder;
    use proptest::prelude::*;

    fn encode(header: &Header) -> Vec<u8> {
        let mut bytes = vec![0u8; HEADER_SIZE];
        let fields = [
            header.ver,
            header.status,
            header.tick_rate,
            header.session_info_update,
            header.session_info_len,
            header.session_info_offset,
            header.num_vars,
            header.var_header_offset,
            header.num_buf,
            header.buf_len,
        ];
        for (index, value) in fields.iter().enumerate() {
            bytes[index * 4..index * 4 + 4].copy_from_slice(&value.to_le_bytes());
        }
        for (index, buf) in header.var_buf.iter().enumerate() {
            let base = VAR_BUF_OFFSET + index * VAR_BUF_SIZE;
            bytes[base..base + 4].copy_from_slice(&buf.tick_count.to_le_bytes());
            bytes[base + 4..base + 8].copy_from_slice(&buf.buf_offset.to_le_bytes());
        }
        bytes
    }

    fn sample_header() -> Header {
        Header {
            ver: IRSDK_VER,
            status: IRSDK_STATUS_CONNECTED,
            tick_rate: 60,
            session_info_update: 3,
            session_info_len: 1000,
            session_info_offset: 1024,
            num_vars: 4,
            var_header_offset: 112,
            num_buf: 3,
            buf_len: 256,
            var_buf: [
                VarBuf { tick_count: 10, buf_offset: 4096 },
                VarBuf { tick_count: 11, buf_offset: 4352 },
                VarBuf { tick_count: 12, buf_offset: 4608 },
                VarBuf::default(),
            ],
        }
    }

    prop_compose! {
        fn arb_header()(
            fields in prop::array::uniform10(any::<i32>()),
            ticks in prop::array::uniform4(any::<i32>()),
            offsets in prop::array::uniform4(any::<i32>()),
        ) -> Header {
            let mut var_buf = [VarBuf::default(); IRSDK_MAX_BUFS];
            for index in 0..IRSDK_MAX_BUFS {
                var_buf[index] = VarBuf { tick_count: ticks[index], buf_offset: offsets[index] };
            }
            Header {
                ver: fields[0],
                status: fields[1],
                tick_rate: fields[2],
                session_info_update: fields[3],
                session_info_len: fields[4],
                session_info_offset: fields[5],
                num_vars: fields[6],
                var_header_offset: fields[7],
                num_buf: fields[8],
                buf_len: fields[9],
                var_buf,
            }
        }
    }

    proptest! {
        #[test]
        fn decoding_is_deterministic(header in arb_header()) {
            let bytes = encode(&header);
            let first = Header::parse(&bytes).unwrap();
            let second = Header::parse(&bytes).unwrap();
            prop_assert_eq!(first, second);
            prop_assert_eq!(first, header);
        }

        #[test]
        fn unknown_versions_fail_validation(ver in any::<i32>().prop_filter("known", |v| !(1..=2).contains(v))) {
            let header = Header { ver, ..sample_header() };
            let result = header.validate(IRSDK_MEMMAP_SIZE);
            prop_assert!(
                matches!(result, Err(TelemetryError::Version { expected: IRSDK_VER, found }) if found == ver),
                "unexpected result: {:?}", result
            );
        }

        #[test]
        fn session_info_counter_changes(update_sequence in prop::collection::vec(0..1_000_000_i32, 1..20)) {
            let mut last_update = -1;
            for update_counter in update_sequence {
                let header = Header { session_info_update: update_counter, ..sample_header() };
                prop_assert_eq!(header.session_info_changed(last_update), update_counter != last_update);
                last_update = update_counter;
            }
        }
    }

    #[test]
    fn short_input_is_a_read_error() {
        let result = Header::parse(&[0u8; 10]);
        assert!(matches!(result, Err(TelemetryError::Read { len: HEADER_SIZE, .. })));
    }

    #[test]
    fn legacy_version_decodes_and_validates() {
        let header = Header { ver: 1, ..sample_header() };
        let parsed = Header::parse(&encode(&header)).unwrap();
        assert_eq!(parsed.version().unwrap(), HeaderVersion::V1);
        assert!(parsed.validate(IRSDK_MEMMAP_SIZE).is_ok());
    }

    #[test]
    fn buffers_are_clamped_to_num_buf() {
        let header = sample_header();
        assert_eq!(header.buffers().len(), 3);

        let header = Header { num_buf: 9, ..sample_header() };
        assert_eq!(header.buffers().len(), IRSDK_MAX_BUFS);

        let header = Header { num_buf: -1, ..sample_header() };
        assert!(header.buffers().is_empty());
    }

    #[test]
    fn geometry_outside_region_is_rejected() {
        let header = sample_header();
        assert!(header.validate(8192).is_ok());

        // Last buffer ends at 4864
        assert!(matches!(header.validate(4800), Err(TelemetryError::Geometry { .. })));

        let negative = Header { session_info_offset: -4, ..sample_header() };
        assert!(matches!(negative.validate(8192), Err(TelemetryError::Geometry { .. })));

        let no_buffers = Header { num_buf: 0, ..sample_header() };
        assert!(matches!(no_buffers.validate(8192), Err(TelemetryError::Geometry { .. })));

        let empty_rows = Header { buf_len: 0, ..sample_header() };
        assert!(matches!(empty_rows.validate(8192), Err(TelemetryError::Geometry { .. })));
    }

    #[test]
    fn oversized_descriptor_table_is_rejected() {
        let header = Header { num_vars: i32::MAX, ..sample_header() };
        assert!(matches!(header.validate(IRSDK_MEMMAP_SIZE), Err(TelemetryError::Geometry { .. })));
    }

    #[test]
    fn connected_bit_is_bit_zero() {
        assert!(sample_header().is_connected());
        assert!(!Header { status: 0x2, ..sample_header() }.is_connected());
    }

    #[test]
    fn tick_counts_read_from_directory_only() {
        let region = RegionBuilder::new()
            .buffer_ticks(&[7, 9, 8])
            .variable("Gear", crate::VariableType::Int32, 1)
            .build();

        assert_eq!(Header::read_tick_counts(&region).unwrap(), [7, 9, 8, 0]);
        let header = Header::read_from(&region).unwrap();
        assert_eq!(header.buffers().iter().map(|b| b.tick_count).collect::<Vec<_>>(), vec![7, 9, 8]);
    }
}
