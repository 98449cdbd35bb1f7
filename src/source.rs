//! Byte sources and the new-data notification primitive.
//!
//! The snapshot reader never touches shared memory directly. It reads through
//! [`ByteSource`], a random-access view over a fixed-size region, and blocks only in
//! [`DataSignal::wait_for_signal`]. The live Windows mapping lives in
//! [`crate::windows`]; [`MemorySource`] backs tests, offline replay of exported dumps,
//! and in-process writers.

use std::path::Path;
use std::sync::{Arc, Condvar, Mutex, RwLock};
use std::time::Duration;
use tracing::trace;

use crate::{Result, TelemetryError};

/// Random-access, read-only view over a fixed-size byte region.
pub trait ByteSource {
    /// Total length of the region in bytes.
    fn region_len(&self) -> usize;

    /// Copy `buf.len()` bytes starting at `offset` into `buf`.
    ///
    /// Implementations must fail with [`TelemetryError::Read`] rather than return a
    /// partially filled buffer.
    fn read_into(&self, offset: u64, buf: &mut [u8]) -> Result<()>;

    /// Read `len` bytes starting at `offset` into a new buffer.
    fn read_at(&self, offset: u64, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.read_into(offset, &mut buf)?;
        Ok(buf)
    }
}

impl<T: ByteSource + ?Sized> ByteSource for &T {
    fn region_len(&self) -> usize {
        (**self).region_len()
    }

    fn read_into(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        (**self).read_into(offset, buf)
    }
}

impl<T: ByteSource + ?Sized> ByteSource for Arc<T> {
    fn region_len(&self) -> usize {
        (**self).region_len()
    }

    fn read_into(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        (**self).read_into(offset, buf)
    }
}

impl ByteSource for [u8] {
    fn region_len(&self) -> usize {
        self.len()
    }

    fn read_into(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let src = checked_span(self, offset, buf.len())?;
        buf.copy_from_slice(src);
        Ok(())
    }
}

impl ByteSource for Vec<u8> {
    fn region_len(&self) -> usize {
        self.len()
    }

    fn read_into(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        self.as_slice().read_into(offset, buf)
    }
}

/// Result of waiting for the writer's new-data notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitResult {
    Signaled,
    TimedOut,
}

/// Blocking wait on the writer's "new data available" notification.
pub trait DataSignal {
    /// Block until the writer signals or `timeout` elapses.
    fn wait_for_signal(&self, timeout: Duration) -> Result<WaitResult>;
}

impl<T: DataSignal + ?Sized> DataSignal for &T {
    fn wait_for_signal(&self, timeout: Duration) -> Result<WaitResult> {
        (**self).wait_for_signal(timeout)
    }
}

impl<T: DataSignal + ?Sized> DataSignal for Arc<T> {
    fn wait_for_signal(&self, timeout: Duration) -> Result<WaitResult> {
        (**self).wait_for_signal(timeout)
    }
}

/// Owned in-memory region with an in-process data-valid signal.
///
/// Readers use it through [`ByteSource`] and [`DataSignal`]; a writer on another thread
/// mutates it with [`MemorySource::write_at`] and wakes readers with
/// [`MemorySource::signal`].
#[derive(Debug, Default)]
pub struct MemorySource {
    bytes: RwLock<Vec<u8>>,
    pending: Mutex<bool>,
    notify: Condvar,
}

impl MemorySource {
    /// Create a source over an existing byte image.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes: RwLock::new(bytes), pending: Mutex::new(false), notify: Condvar::new() }
    }

    /// Create a zero-filled region of `len` bytes.
    pub fn zeroed(len: usize) -> Self {
        Self::new(vec![0u8; len])
    }

    /// Load a region image previously written by an export.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            std::fs::read(path).map_err(|e| TelemetryError::io_error(path.to_path_buf(), e))?;
        trace!(path = %path.display(), len = bytes.len(), "Loaded region image");
        Ok(Self::new(bytes))
    }

    /// Overwrite bytes at `offset`, as the simulator would.
    pub fn write_at(&self, offset: usize, data: &[u8]) -> Result<()> {
        let mut bytes = self
            .bytes
            .write()
            .map_err(|_| TelemetryError::read_failed(offset as u64, data.len(), "region lock poisoned"))?;

        let end = offset.checked_add(data.len()).filter(|&end| end <= bytes.len()).ok_or_else(
            || TelemetryError::read_failed(offset as u64, data.len(), "write past end of region"),
        )?;
        bytes[offset..end].copy_from_slice(data);
        Ok(())
    }

    /// Wake one waiter, or let the next wait return immediately.
    pub fn signal(&self) {
        if let Ok(mut pending) = self.pending.lock() {
            *pending = true;
            self.notify.notify_all();
        }
    }

    /// Copy of the whole region.
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        self.bytes
            .read()
            .map(|bytes| bytes.clone())
            .map_err(|_| TelemetryError::read_failed(0, 0, "region lock poisoned"))
    }
}

impl ByteSource for MemorySource {
    fn region_len(&self) -> usize {
        self.bytes.read().map(|bytes| bytes.len()).unwrap_or(0)
    }

    fn read_into(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let bytes = self
            .bytes
            .read()
            .map_err(|_| TelemetryError::read_failed(offset, buf.len(), "region lock poisoned"))?;
        bytes.as_slice().read_into(offset, buf)
    }
}

impl DataSignal for MemorySource {
    fn wait_for_signal(&self, timeout: Duration) -> Result<WaitResult> {
        let pending =
            self.pending.lock().map_err(|_| TelemetryError::wait_failed("signal lock poisoned"))?;

        let (mut pending, wait) = self
            .notify
            .wait_timeout_while(pending, timeout, |pending| !*pending)
            .map_err(|_| TelemetryError::wait_failed("signal lock poisoned"))?;

        if wait.timed_out() && !*pending {
            trace!(timeout_ms = timeout.as_millis() as u64, "Wait timed out");
            return Ok(WaitResult::TimedOut);
        }

        *pending = false;
        Ok(WaitResult::Signaled)
    }
}

fn checked_span(region: &[u8], offset: u64, len: usize) -> Result<&[u8]> {
    let start = usize::try_from(offset)
        .map_err(|_| TelemetryError::read_failed(offset, len, "offset exceeds address space"))?;
    start
        .checked_add(len)
        .and_then(|end| region.get(start..end))
        .ok_or_else(|| {
            TelemetryError::read_failed(
                offset,
                len,
                format!("read past end of {}-byte region", region.len()),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn slice_source_reads_exact_span() {
        let region: Vec<u8> = (0u8..16).collect();
        let bytes = region.read_at(4, 4).unwrap();
        assert_eq!(bytes, vec![4, 5, 6, 7]);
    }

    #[test]
    fn short_read_is_an_error_not_a_partial_buffer() {
        let region = vec![0u8; 8];
        let result = region.read_at(6, 4);
        assert!(matches!(result, Err(TelemetryError::Read { offset: 6, len: 4, .. })));
    }

    #[test]
    fn offset_overflow_is_rejected() {
        let region = vec![0u8; 8];
        assert!(region.read_at(u64::MAX, 1).is_err());
    }

    #[test]
    fn memory_source_write_then_read() {
        let source = MemorySource::zeroed(32);
        source.write_at(8, &42i32.to_le_bytes()).unwrap();
        assert_eq!(source.read_at(8, 4).unwrap(), vec![42, 0, 0, 0]);
        assert!(source.write_at(30, &[1, 2, 3]).is_err());
    }

    #[test]
    fn wait_times_out_without_signal() {
        let source = MemorySource::zeroed(4);
        let result = source.wait_for_signal(Duration::from_millis(5)).unwrap();
        assert_eq!(result, WaitResult::TimedOut);
    }

    #[test]
    fn pending_signal_is_consumed_once() {
        let source = MemorySource::zeroed(4);
        source.signal();
        assert_eq!(source.wait_for_signal(Duration::from_millis(5)).unwrap(), WaitResult::Signaled);
        assert_eq!(source.wait_for_signal(Duration::from_millis(5)).unwrap(), WaitResult::TimedOut);
    }

    #[test]
    fn signal_from_writer_thread_wakes_reader() {
        let source = Arc::new(MemorySource::zeroed(4));
        let writer = Arc::clone(&source);

        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(10));
            writer.signal();
        });

        let result = source.wait_for_signal(Duration::from_secs(5)).unwrap();
        handle.join().unwrap();
        assert_eq!(result, WaitResult::Signaled);
    }
}
