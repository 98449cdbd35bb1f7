//! Read-only mapping of the simulator's shared memory

use std::ptr::NonNull;
use std::time::Duration;
use tracing::{debug, trace};
use windows::Win32::Foundation::{CloseHandle, HANDLE, WAIT_OBJECT_0, WAIT_TIMEOUT};
use windows::Win32::System::Memory::{
    FILE_MAP_READ, MEMORY_MAPPED_VIEW_ADDRESS, MapViewOfFile, OpenFileMappingW, UnmapViewOfFile,
};
use windows::Win32::System::Threading::{
    OpenEventW, SYNCHRONIZATION_ACCESS_RIGHTS, WaitForSingleObject,
};
use windows::core::PCWSTR;

use crate::schema::header::{IRSDK_DATAVALID_EVENTNAME, IRSDK_MEMMAP_FILENAME, IRSDK_MEMMAP_SIZE};
use crate::source::{ByteSource, DataSignal, WaitResult};
use crate::{Result, TelemetryError};

/// SYNCHRONIZE access right
const SYNCHRONIZE: u32 = 0x0010_0000;

/// Mapped view of the simulator's telemetry region plus its data-valid event.
pub struct SharedMemory {
    mapping: HANDLE,
    base: NonNull<u8>,
    len: usize,
    event: HANDLE,
}

impl SharedMemory {
    /// Open the region and event. Fails if the simulator has not created them yet.
    pub fn open() -> Result<Self> {
        trace!("Opening iRacing shared memory");

        let mapping = unsafe {
            let name = wide_string(IRSDK_MEMMAP_FILENAME);
            OpenFileMappingW(FILE_MAP_READ.0, false, PCWSTR::from_raw(name.as_ptr()))
                .map_err(|e| TelemetryError::windows_api_error("OpenFileMappingW", e))?
        };

        let view = unsafe { MapViewOfFile(mapping, FILE_MAP_READ, 0, 0, IRSDK_MEMMAP_SIZE) };
        let Some(base) = NonNull::new(view.Value as *mut u8) else {
            let err = windows::core::Error::from_thread();
            unsafe {
                let _ = CloseHandle(mapping);
            }
            return Err(TelemetryError::windows_api_error("MapViewOfFile", err));
        };

        let event = unsafe {
            let name = wide_string(IRSDK_DATAVALID_EVENTNAME);
            OpenEventW(SYNCHRONIZATION_ACCESS_RIGHTS(SYNCHRONIZE), false, PCWSTR::from_raw(name.as_ptr()))
        };
        let event = match event {
            Ok(event) => event,
            Err(e) => {
                unsafe {
                    let _ = UnmapViewOfFile(MEMORY_MAPPED_VIEW_ADDRESS { Value: base.as_ptr() as *mut _ });
                    let _ = CloseHandle(mapping);
                }
                return Err(TelemetryError::windows_api_error("OpenEventW", e));
            }
        };

        debug!(len = IRSDK_MEMMAP_SIZE, "Mapped iRacing shared memory");
        Ok(Self { mapping, base, len: IRSDK_MEMMAP_SIZE, event })
    }
}

impl ByteSource for SharedMemory {
    fn region_len(&self) -> usize {
        self.len
    }

    fn read_into(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let start = usize::try_from(offset)
            .ok()
            .filter(|start| start.checked_add(buf.len()).is_some_and(|end| end <= self.len))
            .ok_or_else(|| TelemetryError::read_failed(offset, buf.len(), "read past end of mapping"))?;

        // SAFETY: the span lies inside the mapped view, which lives as long as self.
        // The writer may change bytes underneath us; the fence in the reader detects that.
        unsafe {
            std::ptr::copy_nonoverlapping(self.base.as_ptr().add(start), buf.as_mut_ptr(), buf.len());
        }
        Ok(())
    }
}

impl DataSignal for SharedMemory {
    fn wait_for_signal(&self, timeout: Duration) -> Result<WaitResult> {
        let ms = timeout.as_millis().min(u32::MAX as u128) as u32;

        match unsafe { WaitForSingleObject(self.event, ms) } {
            WAIT_OBJECT_0 => Ok(WaitResult::Signaled),
            WAIT_TIMEOUT => Ok(WaitResult::TimedOut),
            _ => {
                let err = windows::core::Error::from_thread();
                Err(TelemetryError::windows_api_error("WaitForSingleObject", err))
            }
        }
    }
}

impl std::fmt::Debug for SharedMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedMemory").field("len", &self.len).finish_non_exhaustive()
    }
}

impl Drop for SharedMemory {
    fn drop(&mut self) {
        unsafe {
            let addr = MEMORY_MAPPED_VIEW_ADDRESS { Value: self.base.as_ptr() as *mut _ };
            let _ = UnmapViewOfFile(addr);
            let _ = CloseHandle(self.mapping);
            let _ = CloseHandle(self.event);
        }
    }
}

// SAFETY: only kernel handles and a pointer into a read-only view are held.
unsafe impl Send for SharedMemory {}
unsafe impl Sync for SharedMemory {}

fn wide_string(s: &str) -> Vec<u16> {
    use std::ffi::OsStr;
    use std::os::windows::ffi::OsStrExt;
    OsStr::new(s).encode_wide().chain(std::iter::once(0)).collect()
}
