//! Snapshot Reader: buffer selection, fence-and-retry, row decode.
//!
//! The writer cycles through up to four buffer rows and bumps each row's tick count
//! once the row is complete. A poll:
//!
//! 1. reads the header and picks the buffer with the strictly highest tick count (ties
//!    go to the lowest index; no positive tick means no data yet),
//! 2. copies that buffer's row,
//! 3. re-reads only the tick counters and compares the chosen slot with the tick seen
//!    in step 1.
//!
//! A changed tick means the writer recycled the buffer while it was being copied, so
//! the copy may be torn and the poll starts over. After the configured number of
//! attempts the poll fails with [`TelemetryError::TornRead`]. Polls never block and never
//! take a lock shared with the writer.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace, warn};

use crate::config::ReaderConfig;
use crate::schema::header::{Header, VarBuf};
use crate::schema::variables::{parse_descriptor_table, read_table_bytes};
use crate::source::ByteSource;
use crate::{DescriptorTable, Result, Snapshot, TelemetryError, Value, VarData};

/// Index of the buffer with the strictly highest positive tick count.
///
/// Ties keep the first index. Returns `None` when no tick is above zero.
pub fn select_latest_buffer(buffers: &[VarBuf]) -> Option<usize> {
    let mut latest: Option<(usize, i32)> = None;
    for (index, buf) in buffers.iter().enumerate() {
        if buf.tick_count > latest.map_or(0, |(_, tick)| tick) {
            latest = Some((index, buf.tick_count));
        }
    }
    latest.map(|(index, _)| index)
}

/// Decode every descriptor in `table` from `row`.
pub fn decode_row(row: &[u8], table: &DescriptorTable) -> Result<HashMap<String, Value>> {
    let mut values = HashMap::with_capacity(table.len());
    for descriptor in table.iter() {
        values.insert(descriptor.name.clone(), Value::from_bytes(row, descriptor)?);
    }
    Ok(values)
}

/// Result of one poll.
#[derive(Debug, Clone)]
pub enum ReadOutcome {
    /// A snapshot for a tick not seen before
    Fresh(Arc<Snapshot>),
    /// The latest buffer still carries the previous snapshot's tick
    Unchanged,
    /// Connected, but no buffer has been written yet
    NoData,
    /// The header's connected bit is clear
    Disconnected,
}

impl ReadOutcome {
    pub fn snapshot(&self) -> Option<&Arc<Snapshot>> {
        match self {
            ReadOutcome::Fresh(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, ReadOutcome::Fresh(_))
    }
}

/// Polls a [`ByteSource`] for tear-free snapshots.
#[derive(Debug)]
pub struct SnapshotReader {
    max_attempts: u32,
    last_tick: Option<i32>,
    table_cache: Option<(Vec<u8>, Arc<DescriptorTable>)>,
}

impl Default for SnapshotReader {
    fn default() -> Self {
        Self::new(&ReaderConfig::default())
    }
}

impl SnapshotReader {
    pub fn new(config: &ReaderConfig) -> Self {
        Self { max_attempts: config.max_read_attempts.max(1), last_tick: None, table_cache: None }
    }

    /// Tick of the last fresh snapshot.
    pub fn last_tick(&self) -> Option<i32> {
        self.last_tick
    }

    /// Forget the last tick and the cached descriptor table.
    pub fn reset(&mut self) {
        self.last_tick = None;
        self.table_cache = None;
    }

    /// Poll once.
    pub fn read<S: ByteSource + ?Sized>(&mut self, source: &S) -> Result<ReadOutcome> {
        let mut torn_index = 0;

        for attempt in 1..=self.max_attempts {
            let raw = Header::read_raw(source)?;
            let header = Header::parse(&raw)?;

            if !header.is_connected() {
                trace!(status = header.status, "Connected bit clear");
                return Ok(ReadOutcome::Disconnected);
            }

            header.validate(source.region_len())?;

            let Some(index) = select_latest_buffer(header.buffers()) else {
                trace!("No buffer written yet");
                return Ok(ReadOutcome::NoData);
            };

            let buf = header.var_buf[index];
            let tick = buf.tick_count;
            if self.last_tick == Some(tick) {
                return Ok(ReadOutcome::Unchanged);
            }

            let row = source.read_at(buf.buf_offset as u64, header.buf_len as usize)?;
            let ticks = Header::read_tick_counts(source)?;

            if ticks[index] != tick {
                warn!(
                    buffer_index = index,
                    expected_tick = tick,
                    observed_tick = ticks[index],
                    attempt,
                    "Buffer rewritten during copy, retrying"
                );
                torn_index = index;
                continue;
            }

            let table = self.descriptor_table(source, &header)?;
            let values = decode_row(&row, &table)?;

            if let Some(previous) = self.last_tick
                && tick < previous
            {
                warn!(previous, tick, "Tick count went backwards, writer restarted");
            }
            self.last_tick = Some(tick);

            debug!(tick, buffer_index = index, variables = values.len(), attempt, "Captured snapshot");

            let snapshot = Snapshot::new(
                tick,
                index,
                header.session_info_update,
                values,
                table,
                Arc::from(raw.as_slice()),
                Arc::from(row),
            );
            return Ok(ReadOutcome::Fresh(Arc::new(snapshot)));
        }

        Err(TelemetryError::torn_read(torn_index, self.max_attempts))
    }

    /// The descriptor table for `header`, re-decoded only when its bytes changed.
    fn descriptor_table<S: ByteSource + ?Sized>(
        &mut self,
        source: &S,
        header: &Header,
    ) -> Result<Arc<DescriptorTable>> {
        let bytes = read_table_bytes(source, header)?;
        let row_len = header.buf_len as usize;

        if let Some((cached, table)) = &self.table_cache
            && *cached == bytes
            && table.row_len() == row_len
        {
            return Ok(Arc::clone(table));
        }

        let table = Arc::new(parse_descriptor_table(&bytes, header.num_vars as usize, row_len)?);
        debug!(variables = table.len(), row_len, "Descriptor table changed");
        self.table_cache = Some((bytes, Arc::clone(&table)));
        Ok(table)
    }
}
