//! YAML hand-off for callers that want structural decoding.
//!
//! iRacing's session YAML carries stray control characters that standard YAML parsers
//! reject. This module cleans them out without parsing and hands the result to
//! `serde_yaml_ng`.

use serde::de::DeserializeOwned;

use crate::{Result, TelemetryError};

/// Remove control characters other than `\n`, `\r` and `\t`.
///
/// Returns a parse error when nothing but whitespace remains.
pub fn preprocess_iracing_yaml(yaml: &str) -> Result<String> {
    let cleaned: String = yaml
        .chars()
        .filter(|ch| !matches!(ch, '\x00'..='\x08' | '\x0B'..='\x0C' | '\x0E'..='\x1F' | '\x7F'))
        .collect();

    if cleaned.trim().is_empty() {
        return Err(TelemetryError::parse("YAML preprocessing", "YAML is empty after preprocessing"));
    }

    Ok(cleaned)
}

/// Preprocess `yaml` and deserialize it into `T`.
pub fn from_session_yaml<T: DeserializeOwned>(yaml: &str) -> Result<T> {
    let cleaned = preprocess_iracing_yaml(yaml)?;
    serde_yaml_ng::from_str(&cleaned)
        .map_err(|e| TelemetryError::parse("Session YAML", e.to_string()))
}
