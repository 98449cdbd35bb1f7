//! Benchmarks for snapshot capture from a synthetic region
//!
//! - Cold reads: header, descriptor table and row decode from scratch
//! - Warm reads: a new tick with the descriptor table already cached
//! - Session path lookup on a realistic document

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use paddock::test_utils::{RegionBuilder, tick_offset};
use paddock::{ReaderConfig, SessionText, SnapshotReader, VariableType};
use std::hint::black_box;

fn region(arrays: usize) -> RegionBuilder {
    let mut builder = RegionBuilder::new()
        .buffer_ticks(&[1, 0, 0])
        .tick_rate(60)
        .variable("Speed", VariableType::Float32, 1)
        .variable("RPM", VariableType::Float32, 1)
        .variable("Gear", VariableType::Int32, 1)
        .variable("SessionFlags", VariableType::BitField, 1)
        .time_variable("LapLastLapTime", VariableType::Float32);

    for i in 0..arrays {
        builder = builder.variable(&format!("CarIdxArray{i}"), VariableType::Float32, 64);
    }
    builder
}

fn bench_cold_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("cold_read");

    for arrays in [0usize, 8, 32] {
        let source = region(arrays).build_source();
        group.bench_with_input(BenchmarkId::from_parameter(arrays), &source, |b, source| {
            let mut reader = SnapshotReader::new(&ReaderConfig::default());
            b.iter(|| {
                reader.reset();
                black_box(reader.read(source).unwrap())
            })
        });
    }

    group.finish();
}

fn bench_warm_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("warm_read");

    for arrays in [0usize, 8, 32] {
        let source = region(arrays).build_source();
        group.bench_with_input(BenchmarkId::from_parameter(arrays), &source, |b, source| {
            let mut reader = SnapshotReader::new(&ReaderConfig::default());
            let mut tick = 1i32;
            b.iter(|| {
                tick += 1;
                source.write_at(tick_offset(0), &tick.to_le_bytes()).unwrap();
                black_box(reader.read(source).unwrap())
            })
        });
    }

    group.finish();
}

fn bench_session_lookup(c: &mut Criterion) {
    let mut text = String::from("WeekendInfo:\n TrackName: spa\n TrackID: 163\nDriverInfo:\n Drivers:\n");
    for i in 0..64 {
        text.push_str(&format!(" - CarIdx: {i}\n   UserName: Driver {i}\n   CarNumber: \"{i}\"\n"));
    }
    let session = SessionText::from_raw_bytes(text.as_bytes(), 1);

    let mut group = c.benchmark_group("session_lookup");
    group.bench_function("shallow", |b| {
        b.iter(|| black_box(session.lookup("WeekendInfo.TrackName").unwrap()))
    });
    group.bench_function("last_driver", |b| {
        b.iter(|| black_box(session.lookup("DriverInfo.Drivers.{63}.UserName").unwrap()))
    });
    group.finish();
}

criterion_group!(benches, bench_cold_read, bench_warm_read, bench_session_lookup);
criterion_main!(benches);
