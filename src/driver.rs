//! Driver runs the synchronous poll loop on a worker and publishes results

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::liveness::ConnectionState;
use crate::session::SessionText;
use crate::source::{ByteSource, DataSignal};
use crate::telemetry::Telemetry;
use crate::{Snapshot, TelemetryError};

/// Consecutive non-retryable errors before the worker gives up
const MAX_ERRORS: u32 = 10;

/// Receivers and controls for a spawned worker
pub struct DriverChannels {
    /// Latest snapshot. `None` until the first capture, and again once the worker stops.
    pub snapshots: watch::Receiver<Option<Arc<Snapshot>>>,
    /// Latest session text, republished when the update counter changes
    pub sessions: watch::Receiver<Option<Arc<SessionText>>>,
    /// Connection state after every wait
    pub connection: watch::Receiver<ConnectionState>,
    /// Stops the worker at its next wake-up
    pub cancel: CancellationToken,
    /// Completes when the worker has exited
    pub handle: JoinHandle<()>,
}

/// Spawns the poll loop for a [`Telemetry`] context.
///
/// The context blocks on the writer's signal, so it runs on tokio's blocking pool.
/// Consumers only ever see whole `Arc` values through watch channels.
pub struct Driver;

impl Driver {
    /// Must be called from within a tokio runtime.
    pub fn spawn<S>(telemetry: Telemetry<S>) -> DriverChannels
    where
        S: ByteSource + DataSignal + Send + 'static,
    {
        let (snapshot_tx, snapshot_rx) = watch::channel(None);
        let (session_tx, session_rx) = watch::channel(None);
        let (connection_tx, connection_rx) = watch::channel(ConnectionState::Disconnected);
        let cancel = CancellationToken::new();

        let worker_cancel = cancel.clone();
        let handle = tokio::task::spawn_blocking(move || {
            Self::poll_loop(telemetry, snapshot_tx, session_tx, connection_tx, worker_cancel);
        });

        DriverChannels {
            snapshots: snapshot_rx,
            sessions: session_rx,
            connection: connection_rx,
            cancel,
            handle,
        }
    }

    fn poll_loop<S>(
        mut telemetry: Telemetry<S>,
        snapshot_tx: watch::Sender<Option<Arc<Snapshot>>>,
        session_tx: watch::Sender<Option<Arc<SessionText>>>,
        connection_tx: watch::Sender<ConnectionState>,
        cancel: CancellationToken,
    ) where
        S: ByteSource + DataSignal,
    {
        info!("Telemetry worker started");
        let timeout = telemetry.config().wait_timeout;
        let mut snapshot_count = 0u64;
        let mut error_count = 0u32;
        let mut retry_count = 0u32;
        let mut session_version = None;

        while !cancel.is_cancelled() {
            let result = telemetry.wait_for_data(timeout);

            let state = telemetry.connection_state();
            connection_tx.send_if_modified(|current| {
                let changed = *current != state;
                *current = state;
                changed
            });
            if !state.is_connected() {
                session_version = None;
            }

            match result {
                Ok(Some(snapshot)) => {
                    snapshot_count += 1;
                    error_count = 0;
                    retry_count = 0;
                    trace!(
                        tick = snapshot.tick(),
                        buffer = snapshot.buffer_index(),
                        session_version = snapshot.session_version(),
                        "Snapshot {}",
                        snapshot_count
                    );

                    if session_version != Some(snapshot.session_version()) {
                        match telemetry.session_text() {
                            Ok(session) => {
                                debug!(
                                    version = session.version(),
                                    bytes = session.as_str().len(),
                                    "Publishing session text"
                                );
                                session_version = Some(snapshot.session_version());
                                session_tx.send_replace(Some(session));
                            }
                            Err(e) => warn!("Failed to extract session text: {}", e),
                        }
                    }

                    if snapshot_tx.send(Some(snapshot)).is_err() {
                        debug!("Snapshot receivers dropped, shutting down");
                        break;
                    }
                }
                Ok(None) => {
                    retry_count = 0;
                }
                Err(e) if e.is_retryable() => {
                    retry_count += 1;
                    Self::log_retryable(&e, retry_count);

                    // Exponential backoff: 100ms, 200ms, 400ms, ... capped at 1.6s
                    let backoff = Duration::from_millis(50 * (1 << retry_count.min(5)));
                    std::thread::sleep(backoff);
                }
                Err(e) => {
                    error_count += 1;
                    error!("Telemetry error ({}/{}): {}", error_count, MAX_ERRORS, e);

                    if error_count >= MAX_ERRORS {
                        error!("Too many telemetry errors, shutting down");
                        break;
                    }
                }
            }
        }

        if cancel.is_cancelled() {
            info!("Telemetry worker cancelled");
        }
        snapshot_tx.send_replace(None);
        session_tx.send_replace(None);
        connection_tx.send_replace(ConnectionState::Disconnected);
        info!("Telemetry worker ended (published {} snapshots)", snapshot_count);
    }

    fn log_retryable(e: &TelemetryError, attempt: u32) {
        match e {
            TelemetryError::TornRead { .. } => warn!(attempt, "{}", e),
            TelemetryError::NotConnected => trace!(attempt, "{}", e),
            _ => debug!(attempt, "Retrying after error: {}", e),
        }
    }
}
