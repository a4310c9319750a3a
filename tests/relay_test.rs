//! Event relay integration tests
//!
//! Exercises the relay registry through its public API and the relay pump
//! against in-memory and scripted sources.

#![cfg(feature = "ssr")]

mod common;

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;

use common::{failing_sink, recording_sink, wait_for, ScriptedSource, Step};
use petcardio::backend::realtime::{Backoff, ChannelSink, EventRelay, RelayPump};
use petcardio::backend::source::MemorySource;
use petcardio::shared::Reading;

fn reading(timestamp: i64, value: i64) -> Reading {
    Reading::new(timestamp).with_field("value", value)
}

fn fast_backoff() -> Backoff {
    Backoff::new(Duration::from_millis(1), Duration::from_millis(4))
}

#[test]
fn test_register_publish_deregister_scenario() {
    let relay = EventRelay::new();
    let (sink_a, a) = recording_sink();
    let (sink_b, b) = recording_sink();
    let handle_a = relay.register(sink_a);
    relay.register(sink_b);

    assert_eq!(relay.publish(&reading(1, 70)), 2);
    assert_eq!(a.frames(), vec![r#"{"timestamp":1,"value":70}"#.to_string()]);
    assert_eq!(b.frames(), a.frames());

    relay.deregister(handle_a);
    assert_eq!(relay.publish(&reading(2, 72)), 1);
    assert_eq!(a.timestamps(), vec![1]);
    assert_eq!(b.timestamps(), vec![1, 2]);

    b.fail();
    assert_eq!(relay.publish(&reading(3, 75)), 0);
    assert!(relay.is_empty());
    assert_eq!(b.timestamps(), vec![1, 2]);
}

#[test]
fn test_deregister_unknown_handle_is_noop() {
    let relay = EventRelay::new();
    let other = EventRelay::new();
    let (sink, _rx) = ChannelSink::channel();
    let foreign = other.register(sink);

    let (sink, recorder) = recording_sink();
    relay.register(sink);
    relay.deregister(foreign);
    relay.deregister(foreign);

    assert_eq!(relay.len(), 1);
    assert_eq!(other.len(), 1);
    relay.publish(&Reading::new(1));
    assert_eq!(recorder.timestamps(), vec![1]);
}

#[test]
fn test_failed_sink_never_retried() {
    let relay = EventRelay::new();
    let (sink, recorder) = failing_sink();
    let handle = relay.register(sink);

    for ts in 1..=5 {
        relay.publish(&Reading::new(ts));
    }

    assert!(!relay.contains(handle));
    assert_eq!(recorder.attempts(), 1);
}

#[test]
fn test_frame_is_serialized_once_per_publish() {
    let relay = EventRelay::new();
    let (first, mut rx_first) = ChannelSink::channel();
    let (second, mut rx_second) = ChannelSink::channel();
    relay.register(first);
    relay.register(second);

    relay.publish(&reading(7, 80));

    let a = rx_first.try_recv().unwrap();
    let b = rx_second.try_recv().unwrap();
    assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn test_guard_deregisters_on_drop() {
    let relay = EventRelay::new();
    let (sink, _recorder) = recording_sink();
    let guard = relay.register_guarded(sink);
    let handle = guard.handle();
    assert!(relay.contains(handle));

    drop(guard);
    assert!(!relay.contains(handle));
    assert!(relay.is_empty());
}

#[test]
fn test_close_all_drops_receivers() {
    let relay = EventRelay::new();
    let (sink, mut rx) = ChannelSink::channel();
    relay.register(sink);

    assert_eq!(relay.close_all(), 1);
    assert!(relay.is_empty());
    // Every sender is gone, so the adapter sees the end of its stream.
    assert!(rx.try_recv().is_err());
    assert!(rx.is_closed());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_registration_of_100_sinks() {
    let relay = EventRelay::new();

    let tasks: Vec<_> = (0..100)
        .map(|_| {
            let relay = relay.clone();
            tokio::spawn(async move {
                let (sink, rx) = ChannelSink::channel();
                relay.register(sink);
                rx
            })
        })
        .collect();

    let mut receivers = Vec::with_capacity(tasks.len());
    for task in tasks {
        receivers.push(task.await.unwrap());
    }
    assert_eq!(relay.len(), 100);

    assert_eq!(relay.publish(&reading(1, 70)), 100);
    for rx in receivers.iter_mut() {
        assert_eq!(rx.try_recv().unwrap().as_ref(), r#"{"timestamp":1,"value":70}"#);
        assert!(rx.try_recv().is_err(), "sink received a duplicate");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_publish_and_churn() {
    let relay = EventRelay::new();
    let (steady, recorder) = recording_sink();
    relay.register(steady);

    let churn = {
        let relay = relay.clone();
        tokio::spawn(async move {
            for _ in 0..200 {
                let (sink, _recorder) = recording_sink();
                let guard = relay.register_guarded(sink);
                tokio::task::yield_now().await;
                drop(guard);
            }
        })
    };

    for ts in 1..=200 {
        relay.publish(&Reading::new(ts));
        tokio::task::yield_now().await;
    }
    churn.await.unwrap();

    assert_eq!(recorder.timestamps(), (1..=200).collect::<Vec<_>>());
    assert_eq!(relay.len(), 1);
}

#[tokio::test]
async fn test_pump_relays_memory_source() {
    let source = Arc::new(MemorySource::new());
    let relay = EventRelay::new();
    let (sink, mut rx) = ChannelSink::channel();
    relay.register(sink);

    let pump = RelayPump::spawn(source.clone(), relay.clone());
    wait_for(|| source.subscriber_count() == 1).await;

    source.insert(reading(1, 70));
    source.insert(reading(2, 72));

    let first = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await.unwrap().unwrap();
    let second = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await.unwrap().unwrap();
    assert_eq!(first.as_ref(), r#"{"timestamp":1,"value":70}"#);
    assert_eq!(second.as_ref(), r#"{"timestamp":2,"value":72}"#);

    tokio::time::timeout(Duration::from_secs(1), pump.shutdown())
        .await
        .expect("pump did not stop");
    assert_eq!(source.subscriber_count(), 0);
    assert_eq!(source.insert(reading(3, 75)), 0);
}

#[tokio::test]
async fn test_pump_forwards_existing_reading_on_subscribe() {
    let source = Arc::new(MemorySource::new());
    source.insert(reading(5, 90));
    let relay = EventRelay::new();
    let (sink, mut rx) = ChannelSink::channel();
    relay.register(sink);

    let pump = RelayPump::spawn(source.clone(), relay);

    let frame = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await.unwrap().unwrap();
    assert_eq!(frame.as_ref(), r#"{"timestamp":5,"value":90}"#);
    pump.shutdown().await;
}

#[tokio::test]
async fn test_pump_resubscribes_after_failures() {
    let source = Arc::new(ScriptedSource::new(vec![
        Step::Fail,
        Step::Finite(vec![reading(1, 70)]),
        Step::Broken(vec![reading(2, 72)]),
        Step::Open(vec![reading(3, 75)]),
    ]));
    let relay = EventRelay::new();
    let (sink, recorder) = recording_sink();
    relay.register(sink);

    let pump = RelayPump::spawn_with_backoff(source.clone(), relay, fast_backoff());
    wait_for(|| recorder.frames().len() == 3).await;

    assert_eq!(recorder.timestamps(), vec![1, 2, 3]);
    assert_eq!(source.subscriptions(), 4);
    assert!(!pump.is_finished());
    pump.shutdown().await;
}

#[tokio::test]
async fn test_pump_skips_replayed_reading_after_resubscribe() {
    let source = Arc::new(ScriptedSource::new(vec![
        Step::Finite(vec![reading(1, 70)]),
        Step::Open(vec![reading(1, 70), reading(2, 72)]),
    ]));
    let relay = EventRelay::new();
    let (sink, recorder) = recording_sink();
    relay.register(sink);

    let pump = RelayPump::spawn_with_backoff(source.clone(), relay, fast_backoff());
    wait_for(|| recorder.timestamps().contains(&2)).await;

    assert_eq!(recorder.timestamps(), vec![1, 2]);
    pump.shutdown().await;
}

#[tokio::test]
async fn test_pump_forwards_repeated_content_as_separate_readings() {
    let source = Arc::new(MemorySource::new());
    let relay = EventRelay::new();
    let (sink, recorder) = recording_sink();
    relay.register(sink);

    let pump = RelayPump::spawn(source.clone(), relay);
    wait_for(|| source.subscriber_count() == 1).await;

    assert_eq!(source.insert(reading(1, 70)), 1);
    assert_eq!(source.insert(reading(1, 70)), 1);
    wait_for(|| recorder.frames().len() == 2).await;

    assert_eq!(recorder.timestamps(), vec![1, 1]);
    pump.shutdown().await;
}

#[tokio::test]
async fn test_pump_only_compares_first_item_of_subscription() {
    let source = Arc::new(ScriptedSource::new(vec![
        Step::Finite(vec![reading(1, 70)]),
        Step::Open(vec![reading(1, 70), reading(2, 72), reading(2, 72)]),
    ]));
    let relay = EventRelay::new();
    let (sink, recorder) = recording_sink();
    relay.register(sink);

    let pump = RelayPump::spawn_with_backoff(source.clone(), relay, fast_backoff());
    wait_for(|| recorder.frames().len() == 3).await;

    assert_eq!(recorder.timestamps(), vec![1, 2, 2]);
    pump.shutdown().await;
}

#[tokio::test]
async fn test_pump_shutdown_while_idle() {
    let source = Arc::new(ScriptedSource::new(Vec::new()));
    let pump = RelayPump::spawn(source.clone(), EventRelay::new());
    wait_for(|| source.subscriptions() == 1).await;

    tokio::time::timeout(Duration::from_secs(1), pump.shutdown())
        .await
        .expect("pump did not stop");
}

#[tokio::test]
async fn test_pump_shutdown_during_backoff() {
    let source = Arc::new(ScriptedSource::new(vec![Step::Fail]));
    let backoff = Backoff::new(Duration::from_secs(3600), Duration::from_secs(3600));
    let pump = RelayPump::spawn_with_backoff(source.clone(), EventRelay::new(), backoff);
    wait_for(|| source.subscriptions() == 1).await;

    tokio::time::timeout(Duration::from_secs(1), pump.shutdown())
        .await
        .expect("pump did not stop");
    assert_eq!(source.subscriptions(), 1);
}
