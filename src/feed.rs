//! Stream-based access to a running [`Driver`]

use futures::StreamExt;
use futures::stream::BoxStream;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::driver::Driver;
use crate::liveness::ConnectionState;
use crate::schema::header::Header;
use crate::session::SessionText;
use crate::source::{ByteSource, DataSignal};
use crate::stream::ThrottleExt;
use crate::telemetry::Telemetry;
use crate::{Snapshot, UpdateRate};

/// Tick rate assumed until the header reports one
const FALLBACK_TICK_RATE_HZ: f64 = 60.0;

/// Subscribable snapshot and session streams backed by a background poll loop.
///
/// Dropping the feed stops the loop.
pub struct Feed {
    snapshots: watch::Receiver<Option<Arc<Snapshot>>>,
    sessions: watch::Receiver<Option<Arc<SessionText>>>,
    connection: watch::Receiver<ConnectionState>,
    source_hz: f64,
    cancel: CancellationToken,
}

impl Feed {
    /// Start polling `telemetry`. Must be called from within a tokio runtime.
    ///
    /// The feed is usable before the simulator is running; streams simply wait.
    pub fn spawn<S>(telemetry: Telemetry<S>) -> Self
    where
        S: ByteSource + DataSignal + Send + 'static,
    {
        let source_hz = Header::read_from(telemetry.source())
            .ok()
            .and_then(|header| header.tick_rate_hz())
            .unwrap_or(FALLBACK_TICK_RATE_HZ);

        let channels = Driver::spawn(telemetry);
        info!("Telemetry feed started ({}Hz)", source_hz);

        Self {
            snapshots: channels.snapshots,
            sessions: channels.sessions,
            connection: channels.connection,
            source_hz,
            cancel: channels.cancel,
        }
    }

    /// Open the simulator's shared memory and start polling it.
    #[cfg(windows)]
    pub fn connect() -> crate::Result<Self> {
        let source = crate::windows::SharedMemory::open()?;
        Ok(Self::spawn(Telemetry::new(source)))
    }

    /// Snapshots at most as often as `rate` allows.
    ///
    /// Leading `None` values are skipped while waiting for the first capture; the
    /// stream ends once the poll loop stops.
    pub fn subscribe(&self, rate: UpdateRate) -> BoxStream<'static, Arc<Snapshot>> {
        let snapshots = WatchStream::new(self.snapshots.clone())
            .skip_while(|opt| {
                let is_none = opt.is_none();
                async move { is_none }
            })
            .take_while(|opt| {
                let is_some = opt.is_some();
                async move { is_some }
            })
            .filter_map(|opt| async move { opt });

        match rate.throttle_interval(self.source_hz) {
            None => snapshots.boxed(),
            Some(period) => {
                debug!(period_ms = period.as_millis() as u64, "Throttling subscription");
                snapshots.throttle(period).boxed()
            }
        }
    }

    /// Current session text, then every change to it.
    pub fn session_updates(&self) -> BoxStream<'static, Arc<SessionText>> {
        WatchStream::new(self.sessions.clone()).filter_map(|opt| async move { opt }).boxed()
    }

    /// Connection state, then every transition.
    pub fn connection_updates(&self) -> BoxStream<'static, ConnectionState> {
        WatchStream::new(self.connection.clone()).boxed()
    }

    pub fn current_snapshot(&self) -> Option<Arc<Snapshot>> {
        self.snapshots.borrow().clone()
    }

    pub fn current_session(&self) -> Option<Arc<SessionText>> {
        self.sessions.borrow().clone()
    }

    pub fn connection_state(&self) -> ConnectionState {
        *self.connection.borrow()
    }

    /// Writer tick rate the feed throttles against
    pub fn source_hz(&self) -> f64 {
        self.source_hz
    }
}

impl Drop for Feed {
    fn drop(&mut self) {
        debug!("Dropping telemetry feed");
        self.cancel.cancel();
    }
}
