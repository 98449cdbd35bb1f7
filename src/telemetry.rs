//! Owned telemetry context.
//!
//! [`Telemetry`] ties a [`ByteSource`] to the snapshot reader, the session text cache and
//! the liveness monitor. It is synchronous and cooperative: nothing happens between
//! calls, and only [`Telemetry::wait_for_data`] blocks.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

use crate::config::ReaderConfig;
use crate::liveness::{ConnectionState, LivenessMonitor};
use crate::reader::{ReadOutcome, SnapshotReader};
use crate::schema::header::Header;
use crate::session::SessionText;
use crate::source::{ByteSource, DataSignal, WaitResult};
use crate::{Result, Snapshot, TelemetryError, Value};

/// Reader state for one shared region.
#[derive(Debug)]
pub struct Telemetry<S> {
    source: S,
    config: ReaderConfig,
    reader: SnapshotReader,
    liveness: LivenessMonitor,
    latest: Option<Arc<Snapshot>>,
    session: Option<Arc<SessionText>>,
}

impl<S: ByteSource> Telemetry<S> {
    /// Create a context with default configuration.
    pub fn new(source: S) -> Self {
        Self::with_config(source, ReaderConfig::default())
    }

    pub fn with_config(source: S, config: ReaderConfig) -> Self {
        debug!(region_len = source.region_len(), "Opening telemetry context");

        Self {
            reader: SnapshotReader::new(&config),
            liveness: LivenessMonitor::new(config.liveness_window),
            source,
            config,
            latest: None,
            session: None,
        }
    }

    /// Poll the source once.
    pub fn poll(&mut self) -> Result<ReadOutcome> {
        self.poll_at(Instant::now())
    }

    /// Poll the source once, evaluating liveness at `now`.
    pub fn poll_at(&mut self, now: Instant) -> Result<ReadOutcome> {
        let result = self.reader.read(&self.source);

        match &result {
            Ok(ReadOutcome::Fresh(snapshot)) => {
                self.liveness.record_capture(now);
                self.liveness.observe(true, now);
                self.latest = Some(Arc::clone(snapshot));
            }
            Ok(ReadOutcome::Unchanged) | Ok(ReadOutcome::NoData) => {
                self.liveness.observe(true, now);
            }
            Ok(ReadOutcome::Disconnected) => {
                self.liveness.observe(false, now);
            }
            Err(_) => {
                self.refresh_connection_at(now);
            }
        }

        result
    }

    /// Re-read the status bit and re-evaluate liveness at `now`.
    pub fn refresh_connection_at(&mut self, now: Instant) -> ConnectionState {
        let status = Header::read_from(&self.source).map(|h| h.is_connected()).unwrap_or(false);
        self.liveness.observe(status, now)
    }

    /// Connection state as of the last poll.
    pub fn connection_state(&self) -> ConnectionState {
        self.liveness.state()
    }

    pub fn is_connected(&self) -> bool {
        self.connection_state().is_connected()
    }

    /// The most recent fresh snapshot, even if the connection has since dropped.
    pub fn latest(&self) -> Option<&Arc<Snapshot>> {
        self.latest.as_ref()
    }

    /// Value of `name` in the latest snapshot. Fails with `NotConnected` while
    /// disconnected.
    pub fn variable(&self, name: &str) -> Result<&Value> {
        if !self.is_connected() {
            return Err(TelemetryError::NotConnected);
        }
        self.latest.as_ref().ok_or(TelemetryError::NotConnected)?.get(name)
    }

    /// Current session text, re-extracted only when the update counter has changed.
    pub fn session_text(&mut self) -> Result<Arc<SessionText>> {
        let header = Header::read_from(&self.source)?;
        if !header.is_connected() {
            return Err(TelemetryError::NotConnected);
        }

        if let Some(session) = &self.session
            && !header.session_info_changed(session.version())
        {
            return Ok(Arc::clone(session));
        }

        header.validate(self.source.region_len())?;
        let session = Arc::new(SessionText::extract(&self.source, &header)?);
        info!(version = session.version(), "Session info updated");
        self.session = Some(Arc::clone(&session));
        Ok(session)
    }

    /// Resolve a dotted session path, e.g. `WeekendInfo.TrackName`.
    pub fn session_value(&mut self, path: &str) -> Result<String> {
        self.session_text()?.lookup(path)
    }

    /// Copy of the whole region.
    pub fn export_region(&self) -> Result<Vec<u8>> {
        self.source.read_at(0, self.source.region_len())
    }

    /// Write the whole region to `path`. [`crate::MemorySource::from_file`] loads it back.
    pub fn export_region_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.export_region()?;
        std::fs::write(path, &bytes).map_err(|e| TelemetryError::io_error(path.to_path_buf(), e))?;
        info!(path = %path.display(), bytes = bytes.len(), "Exported region");
        Ok(())
    }

    /// Write the current session text to `path`.
    pub fn export_session_to<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let session = self.session_text()?;
        std::fs::write(path, session.export_bytes())
            .map_err(|e| TelemetryError::io_error(path.to_path_buf(), e))?;
        info!(path = %path.display(), version = session.version(), "Exported session text");
        Ok(())
    }

    /// Drop the last tick, cached tables and session text.
    pub fn reset(&mut self) {
        debug!("Resetting reader state");
        self.reader.reset();
        self.session = None;
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }
}

impl<S: ByteSource + DataSignal> Telemetry<S> {
    /// Wait for the writer's signal, then poll.
    ///
    /// Returns the new snapshot, or `None` on timeout or when the poll found nothing
    /// new. While disconnected the reader state is reset first so a restarted
    /// simulator is picked up from scratch.
    pub fn wait_for_data(&mut self, timeout: Duration) -> Result<Option<Arc<Snapshot>>> {
        if !self.is_connected() {
            self.reset();
        }

        match self.source.wait_for_signal(timeout)? {
            WaitResult::Signaled => match self.poll()? {
                ReadOutcome::Fresh(snapshot) => Ok(Some(snapshot)),
                _ => Ok(None),
            },
            WaitResult::TimedOut => {
                trace!(timeout_ms = timeout.as_millis() as u64, "No signal before timeout");
                self.refresh_connection_at(Instant::now());
                Ok(None)
            }
        }
    }
}
