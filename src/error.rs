//! Error types for telemetry snapshot reading.
//!
//! Every failure is returned to the caller; nothing is logged and dropped. Errors raised
//! while reading one poll cycle never poison the reader, so the next poll starts clean.
//!
//! ## Error Categories
//!
//! - **Read Errors**: the byte source failed or returned a short read
//! - **Torn Reads**: the writer recycled the selected buffer during every attempt
//! - **Geometry Errors**: header offsets or sizes that do not fit the region
//! - **Lookup Errors**: unknown variables and missing session paths
//! - **Parse Errors**: malformed descriptor records or session text
//! - **Wait Errors**: the new-data notification primitive failed
//!
//! ## Recovery and Retry
//!
//! ```rust
//! use paddock::TelemetryError;
//!
//! let error = TelemetryError::torn_read(2, 3);
//! if error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

#[cfg(windows)]
use windows_core as core;

/// Result type alias for telemetry operations.
pub type Result<T, E = TelemetryError> = std::result::Result<T, E>;

/// Main error type for telemetry operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TelemetryError {
    #[error("Failed to read {len} bytes at offset {offset:#x}: {reason}")]
    Read {
        offset: u64,
        len: usize,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Buffer {buffer_index} was rewritten during all {attempts} read attempts")]
    TornRead { buffer_index: usize, attempts: u32 },

    #[error("Invalid header geometry: {details}")]
    Geometry { details: String },

    #[error("SDK version mismatch: expected {expected}, found {found}")]
    Version { expected: i32, found: i32 },

    #[error("Parse error in {context}: {details}")]
    Parse { context: String, details: String },

    #[error("Session path '{path}' not found")]
    PathNotFound { path: String },

    #[error("Variable '{name}' not found in telemetry data")]
    UnknownVariable { name: String },

    #[error("Type conversion error: {details}")]
    TypeConversion { details: String },

    #[error("Simulator is not connected")]
    NotConnected,

    #[error("Waiting for new data failed: {reason}")]
    Wait {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("I/O error on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Windows API error: {operation}")]
    #[cfg(windows)]
    WindowsApi {
        operation: String,
        #[source]
        source: core::Error,
    },
}

impl TelemetryError {
    /// Returns whether this error is potentially recoverable through retry.
    ///
    /// Header and descriptor errors (geometry, version, parse) count as retryable: they
    /// abort one poll, and the writer may publish a valid header once the session restarts.
    pub fn is_retryable(&self) -> bool {
        match self {
            TelemetryError::Read { .. } => true,
            TelemetryError::TornRead { .. } => true,
            TelemetryError::Geometry { .. } => true,
            TelemetryError::NotConnected => true,
            TelemetryError::Wait { .. } => true,
            TelemetryError::Version { .. } => true,
            TelemetryError::Parse { .. } => true,
            TelemetryError::PathNotFound { .. } => false,
            TelemetryError::UnknownVariable { .. } => false,
            TelemetryError::TypeConversion { .. } => false,
            TelemetryError::Io { .. } => false,
            #[cfg(windows)]
            TelemetryError::WindowsApi { .. } => true,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            TelemetryError::Read { .. } => vec![
                "Retry on the next poll cycle",
                "Verify the shared memory mapping is still open",
            ],
            TelemetryError::TornRead { .. } => vec![
                "Skip this cycle and poll again",
                "Increase the read attempt budget if this happens often",
            ],
            TelemetryError::Geometry { .. } => vec![
                "Poll again after the simulator finishes loading a session",
                "Check the configured region length matches the simulator",
            ],
            TelemetryError::Version { .. } => vec![
                "Update the simulator to a supported SDK version",
                "Update this library to a compatible version",
            ],
            TelemetryError::Parse { .. } => vec![
                "Verify source data integrity",
                "Capture a region dump and report the malformed record",
            ],
            TelemetryError::PathNotFound { .. } => vec![
                "Check the path spelling and list indices",
                "Fall back to a default value for optional session fields",
            ],
            TelemetryError::UnknownVariable { .. } => vec![
                "Check variable name spelling",
                "Verify the variable exists for the current car and session",
            ],
            TelemetryError::TypeConversion { .. } => vec![
                "Check the variable's declared type",
                "Use the dynamic Value accessor instead of a typed getter",
            ],
            TelemetryError::NotConnected => vec![
                "Ensure iRacing is running and in a session",
                "Wait for the connection to come back",
            ],
            TelemetryError::Wait { .. } => vec![
                "Retry the wait",
                "Reopen the data-valid event",
            ],
            TelemetryError::Io { .. } => vec![
                "Check file exists and is readable",
                "Check file permissions",
                "Ensure sufficient disk space",
            ],
            #[cfg(windows)]
            TelemetryError::WindowsApi { .. } => vec![
                "Check Windows API permissions",
                "Verify iRacing is running",
            ],
        }
    }

    /// Helper constructor for short or failed reads.
    pub fn read_failed(offset: u64, len: usize, reason: impl Into<String>) -> Self {
        TelemetryError::Read { offset, len, reason: reason.into(), source: None }
    }

    /// Helper constructor for torn reads.
    pub fn torn_read(buffer_index: usize, attempts: u32) -> Self {
        TelemetryError::TornRead { buffer_index, attempts }
    }

    /// Helper constructor for header geometry errors.
    pub fn geometry(details: impl Into<String>) -> Self {
        TelemetryError::Geometry { details: details.into() }
    }

    /// Helper constructor for parse errors.
    pub fn parse(context: impl Into<String>, details: impl Into<String>) -> Self {
        TelemetryError::Parse { context: context.into(), details: details.into() }
    }

    /// Helper constructor for missing session paths.
    pub fn path_not_found(path: impl Into<String>) -> Self {
        TelemetryError::PathNotFound { path: path.into() }
    }

    /// Helper constructor for unknown variables.
    pub fn unknown_variable(name: impl Into<String>) -> Self {
        TelemetryError::UnknownVariable { name: name.into() }
    }

    /// Helper constructor for wait primitive failures.
    pub fn wait_failed(reason: impl Into<String>) -> Self {
        TelemetryError::Wait { reason: reason.into(), source: None }
    }

    /// Helper constructor for file errors with path context.
    pub fn io_error(path: PathBuf, source: std::io::Error) -> Self {
        TelemetryError::Io { path, source }
    }

    /// Helper constructor for Windows API errors.
    #[cfg(windows)]
    pub fn windows_api_error(operation: impl Into<String>, source: core::Error) -> Self {
        TelemetryError::WindowsApi { operation: operation.into(), source }
    }
}

impl From<std::io::Error> for TelemetryError {
    fn from(err: std::io::Error) -> Self {
        TelemetryError::Io { path: PathBuf::from("<unknown>"), source: err }
    }
}

#[cfg(windows)]
impl From<core::Error> for TelemetryError {
    fn from(err: core::Error) -> Self {
        TelemetryError::WindowsApi {
            operation: "Unknown Windows operation".to_string(),
            source: err,
        }
    }
}
