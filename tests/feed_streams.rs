//! Async feed over a simulated writer

mod common;

use common::{Row, SESSION, SimWriter};
use futures::StreamExt;
use paddock::{ConnectionState, Feed, ReaderConfig, Telemetry, UpdateRate};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

fn feed(writer: &SimWriter) -> Feed {
    let config = ReaderConfig::default()
        .with_wait_timeout(Duration::from_millis(10));
    Feed::spawn(Telemetry::with_config(Arc::clone(&writer.source), config))
}

#[tokio::test(flavor = "multi_thread")]
async fn subscription_waits_for_the_first_snapshot() {
    let mut writer = SimWriter::new(SESSION);
    let feed = feed(&writer);
    assert_eq!(feed.source_hz(), 60.0);
    assert!(feed.current_snapshot().is_none());

    let mut snapshots = feed.subscribe(UpdateRate::Native);

    let mut row = Row::at(3.0);
    row.gear = 5;
    writer.publish(row);

    let snapshot = timeout(WAIT, snapshots.next()).await.unwrap().unwrap();
    assert_eq!(snapshot.tick(), 1);
    assert_eq!(snapshot.value::<i32>("Gear").unwrap(), 5);
    assert_eq!(feed.connection_state(), ConnectionState::Connected);
}

#[tokio::test(flavor = "multi_thread")]
async fn session_updates_follow_the_counter() {
    let mut writer = SimWriter::new(SESSION);
    let feed = feed(&writer);
    let mut sessions = feed.session_updates();

    writer.publish(Row::at(0.0));
    let first = timeout(WAIT, sessions.next()).await.unwrap().unwrap();
    assert_eq!(first.version(), 1);
    assert_eq!(first.lookup("WeekendInfo.TrackName").unwrap(), "spa 2024 up");

    writer.set_session(&SESSION.replace("NumCarTypes: 1", "NumCarTypes: 2"));
    writer.publish(Row::at(1.0));
    let second = timeout(WAIT, sessions.next()).await.unwrap().unwrap();
    assert_eq!(second.version(), 2);
    assert_eq!(second.value::<u32>("WeekendInfo.NumCarTypes").unwrap(), 2);
    assert_eq!(feed.current_session().map(|s| s.version()), Some(2));
}

#[tokio::test(flavor = "multi_thread")]
async fn throttled_subscription_delivers_newest_ticks_in_order() {
    let writer = SimWriter::new(SESSION);
    let feed = feed(&writer);
    let mut snapshots = feed.subscribe(UpdateRate::Max(20));

    let producer = std::thread::spawn(move || {
        let mut writer = writer;
        for tick in 1..=120 {
            writer.publish(Row::at(f64::from(tick) / 60.0));
            std::thread::sleep(Duration::from_millis(2));
        }
        writer
    });

    let mut ticks = Vec::new();
    while let Ok(Some(snapshot)) = timeout(Duration::from_millis(500), snapshots.next()).await {
        ticks.push(snapshot.tick());
        if snapshot.tick() == 120 {
            break;
        }
    }
    producer.join().unwrap();

    assert!(!ticks.is_empty());
    assert!(ticks.len() < 120, "throttle let every snapshot through");
    assert!(ticks.windows(2).all(|pair| pair[0] < pair[1]));
    assert_eq!(ticks.last(), Some(&120));
}

#[tokio::test(flavor = "multi_thread")]
async fn dropping_the_feed_ends_subscriptions() {
    let mut writer = SimWriter::new(SESSION);
    let feed = feed(&writer);
    let mut snapshots = feed.subscribe(UpdateRate::Native);
    let mut states = feed.connection_updates();

    writer.publish(Row::at(0.0));
    timeout(WAIT, snapshots.next()).await.unwrap().unwrap();

    drop(feed);
    assert!(timeout(WAIT, snapshots.next()).await.unwrap().is_none());

    let mut last = None;
    while let Ok(Some(state)) = timeout(Duration::from_millis(100), states.next()).await {
        last = Some(state);
    }
    assert_eq!(last, Some(ConnectionState::Disconnected));
}
