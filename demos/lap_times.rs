//! Print lap times and session changes from a live simulator.
//!
//! On Windows this attaches to the running simulator. Elsewhere pass a region dump
//! written by the `export` demo; it is replayed once.
//!
//! ```text
//! RUST_LOG=paddock=debug cargo run --example lap_times [region.bin]
//! ```

use anyhow::{Context, Result};
use futures::StreamExt;
use paddock::{Feed, MemorySource, Snapshot, Telemetry, UpdateRate};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn print_snapshot(snapshot: &Snapshot) {
    let lap = snapshot.value::<i32>("Lap").unwrap_or_default();
    let last = snapshot.time_text("LapLastLapTime").unwrap_or_else(|_| "-".to_string());
    let best = snapshot.time_text("LapBestLapTime").unwrap_or_else(|_| "-".to_string());
    let speed = snapshot.value::<f32>("Speed").unwrap_or_default() * 3.6;
    println!("tick {:>8}  lap {:>3}  last {:>10}  best {:>10}  {:>6.1} km/h", snapshot.tick(), lap, last, best, speed);
}

fn open_feed() -> Result<Feed> {
    #[cfg(windows)]
    if std::env::args().len() < 2 {
        return Ok(Feed::connect()?);
    }

    let path = std::env::args().nth(1).context("usage: lap_times <region.bin>")?;
    let source = Arc::new(MemorySource::from_file(&path).with_context(|| format!("loading {path}"))?);
    source.signal();
    Ok(Feed::spawn(Telemetry::new(source)))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let feed = open_feed()?;
    let mut snapshots = feed.subscribe(UpdateRate::Max(4));
    let mut sessions = feed.session_updates();

    loop {
        tokio::select! {
            Some(session) = sessions.next() => {
                let track = session.lookup("WeekendInfo.TrackDisplayName").unwrap_or_default();
                println!("session v{}: {}", session.version(), track);
            }
            snapshot = snapshots.next() => match snapshot {
                Some(snapshot) => print_snapshot(&snapshot),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    Ok(())
}
