//! Session Text Extraction
//!
//! The simulator publishes session metadata (track, drivers, sectors, ...) as a YAML
//! document in a byte range located by the header. The text is written in the Windows
//! 1252 code page and padded with trailing NULs. [`SessionText`] copies that range,
//! converts it to UTF-8 and strips the padding. Structural parsing is left to callers:
//! [`SessionText::lookup`] resolves dotted paths against the line structure, and
//! [`SessionText::deserialize`] hands the text to `serde_yaml_ng`.
//!
//! The header's `sessionInfoUpdate` counter versions the text; owners re-extract only
//! when the counter changes.

mod path;
mod yaml;

pub use path::lookup;
pub use yaml::{from_session_yaml, preprocess_iracing_yaml};

use encoding_rs::WINDOWS_1252;
use serde::de::DeserializeOwned;
use std::str::FromStr;
use tracing::{debug, trace};

use crate::schema::header::Header;
use crate::source::ByteSource;
use crate::{Result, TelemetryError};

/// Decoded session text, versioned by the header's update counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionText {
    text: String,
    version: i32,
}

impl SessionText {
    /// Copy and decode the session range located by `header`.
    pub fn extract<S: ByteSource + ?Sized>(source: &S, header: &Header) -> Result<Self> {
        let len = usize::try_from(header.session_info_len).unwrap_or(0);
        if len == 0 {
            return Ok(Self::from_raw_bytes(&[], header.session_info_update));
        }

        let offset = u64::try_from(header.session_info_offset).map_err(|_| {
            TelemetryError::geometry(format!(
                "Invalid session info offset: {}",
                header.session_info_offset
            ))
        })?;

        trace!(offset, len, "Reading session text");
        let raw = source.read_at(offset, len)?;
        let session = Self::from_raw_bytes(&raw, header.session_info_update);

        debug!(
            version = session.version,
            bytes = session.text.len(),
            "Extracted session text"
        );
        Ok(session)
    }

    /// Decode Windows-1252 bytes and strip trailing NULs.
    pub fn from_raw_bytes(raw: &[u8], version: i32) -> Self {
        let (decoded, _) = WINDOWS_1252.decode_without_bom_handling(raw);
        let text = decoded.trim_end_matches('\0').to_string();
        Self { text, version }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The `sessionInfoUpdate` counter this text was extracted under.
    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Resolve a dotted path such as `DriverInfo.Drivers.{0}.CarNumber` to scalar text.
    pub fn lookup(&self, path: &str) -> Result<String> {
        path::lookup(&self.text, path)
    }

    /// Resolve a path and parse the scalar, e.g. `session.value::<i32>("WeekendInfo.TrackID")`.
    pub fn value<T>(&self, path: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self.lookup(path)?;
        raw.parse().map_err(|e: T::Err| TelemetryError::TypeConversion {
            details: format!("Session value '{}' = '{}': {}", path, raw, e),
        })
    }

    /// Deserialize the whole document into caller-defined types.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        yaml::from_session_yaml(&self.text)
    }

    /// Trimmed UTF-8 bytes, for persistence.
    pub fn export_bytes(&self) -> Vec<u8> {
        self.text.as_bytes().to_vec()
    }
}

impl AsRef<str> for SessionText {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

impl std::fmt::Display for SessionText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}
