//! Lap and session time helpers for variables flagged as durations.

use std::time::Duration;

/// Convert seconds into a [`Duration`].
///
/// Returns `None` for negative, NaN or infinite input. Lap-time variables carry a
/// negative sentinel while unset, so callers must handle the `None` case.
pub fn seconds_to_duration(seconds: f64) -> Option<Duration> {
    if seconds.is_finite() && seconds >= 0.0 {
        Duration::try_from_secs_f64(seconds).ok()
    } else {
        None
    }
}

/// Render seconds as `minutes:ss.mmm`.
///
/// Minutes are floored; seconds and milliseconds are the truncated remainders of the
/// whole-second and whole-millisecond counts, zero-padded to two and three digits.
/// Negative input keeps its sign in every component, e.g. `-1.5` renders as
/// `-1:-1.-500`.
pub fn format_lap_time(seconds: f64) -> String {
    // Saturating cast; NaN becomes 0.
    format_nanos((seconds * 1e9) as i64)
}

/// [`format_lap_time`] for single-precision values.
///
/// The nanosecond count is taken from the `f32` product, so `0.7` renders as
/// `0:00.700` where the widened `f64` would truncate to `0:00.699`.
pub fn format_lap_time_f32(seconds: f32) -> String {
    format_nanos((seconds * 1e9_f32) as i64)
}

fn format_nanos(nanos: i64) -> String {
    let minutes = (nanos as f64 / 60e9).floor() as i64;
    let secs = (nanos / 1_000_000_000) % 60;
    let millis = (nanos / 1_000_000) % 1000;
    format!("{}:{:02}.{:03}", minutes, secs, millis)
}
