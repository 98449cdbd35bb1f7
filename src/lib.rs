//! Tear-free snapshots of iRacing shared-memory telemetry.
//!
//! The simulator writes a fixed-size region: a small header, a table of variable
//! descriptors, a session-info YAML document, and up to four rotating buffer rows that
//! it overwrites at the tick rate. Paddock reads that region without any lock shared
//! with the writer and turns the newest complete row into an immutable [`Snapshot`].
//!
//! # Features
//!
//! - **Consistent reads**: newest-buffer selection with a tick fence and bounded retry
//! - **Typed values**: a closed [`Value`] set plus [`VarData`] for direct typed reads
//! - **Session text**: Windows-1252 decoding, dotted path lookup, serde hand-off
//! - **Liveness**: connected only while the status bit is set and data keeps arriving
//! - **Async feed**: optional tokio worker with throttled snapshot streams
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use paddock::{MemorySource, Telemetry};
//! use std::time::Duration;
//!
//! # fn main() -> paddock::Result<()> {
//! // Any ByteSource + DataSignal works; on Windows use `windows::SharedMemory::open()`.
//! let source = MemorySource::from_file("session.bin")?;
//! let mut telemetry = Telemetry::new(source);
//!
//! if let Some(snapshot) = telemetry.wait_for_data(Duration::from_millis(100))? {
//!     println!("Speed: {}", snapshot.value::<f32>("Speed")?);
//!     println!("Last lap: {}", snapshot.time_text("LapLastLapTime")?);
//! }
//! println!("Track: {}", telemetry.session_value("WeekendInfo.TrackName")?);
//! # Ok(())
//! # }
//! ```

// Core types and error handling
mod error;
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Region decoding
pub mod config;
pub mod liveness;
pub mod reader;
pub mod schema;
pub mod session;
pub mod source;
pub mod telemetry;

// Outbound commands
pub mod broadcast;

// Stream-based telemetry
pub mod driver;
pub mod feed;
pub mod stream;

// Platform-specific modules
#[cfg(windows)]
pub mod windows;

// Core exports
pub use error::*;
pub use types::*;

pub use broadcast::{BroadcastCommand, BroadcastKind, BroadcastSink};
pub use config::ReaderConfig;
pub use driver::{Driver, DriverChannels};
pub use feed::Feed;
pub use liveness::{ConnectionState, LivenessMonitor};
pub use reader::{ReadOutcome, SnapshotReader};
pub use session::SessionText;
pub use source::{ByteSource, DataSignal, MemorySource, WaitResult};
pub use telemetry::Telemetry;

#[cfg(windows)]
pub use windows::SharedMemory;
