//! Capture one snapshot and write the region and session text to disk.
//!
//! ```text
//! cargo run --example export -- <out-dir> [region.bin]
//! ```
//!
//! Without a dump argument the live simulator is used (Windows only).

use anyhow::{Context, Result, bail};
use paddock::{ByteSource, DataSignal, MemorySource, Telemetry};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn export<S: ByteSource + DataSignal>(mut telemetry: Telemetry<S>, out: &Path) -> Result<()> {
    let deadline = Instant::now() + Duration::from_secs(5);
    let snapshot = loop {
        if let Some(snapshot) = telemetry.poll()?.snapshot() {
            break snapshot.clone();
        }
        if Instant::now() > deadline {
            bail!("no telemetry within 5s");
        }
        telemetry.wait_for_data(Duration::from_millis(100))?;
    };

    info!(tick = snapshot.tick(), variables = snapshot.len(), "Captured snapshot");
    for (descriptor, value) in snapshot.iter().take(10) {
        println!("{:<24} {:?} {}", descriptor.name, value, descriptor.unit);
    }

    std::fs::create_dir_all(out).with_context(|| format!("creating {}", out.display()))?;
    telemetry.export_region_to(out.join("region.bin"))?;
    telemetry.export_session_to(out.join("session.yaml"))?;
    std::fs::write(out.join("snapshot.bin"), snapshot.export_bytes())?;
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let mut args = std::env::args().skip(1);
    let out = PathBuf::from(args.next().context("usage: export <out-dir> [region.bin]")?);

    match args.next() {
        Some(dump) => export(Telemetry::new(MemorySource::from_file(&dump)?), &out),
        #[cfg(windows)]
        None => export(Telemetry::new(paddock::SharedMemory::open()?), &out),
        #[cfg(not(windows))]
        None => bail!("live telemetry needs Windows; pass a region dump"),
    }
}
