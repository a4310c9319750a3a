/**
 * In-Memory Reading Source
 *
 * Keeps readings in process and notifies subscribers through a
 * `tokio::sync::broadcast` channel. Used when the server runs with
 * `PETCARDIO_SOURCE=memory` and by the test suite.
 *
 * Notification follows the hosted database's "newest record" query: an
 * inserted reading is announced only if no stored reading is newer.
 */

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use tokio::sync::broadcast;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};

use crate::backend::source::{ReadingSource, ReadingStream, SourceError};
use crate::shared::Reading;

/// Notification channel capacity
const CHANNEL_CAPACITY: usize = 1000;

/// In-process reading store with push notifications
pub struct MemorySource {
    readings: RwLock<Vec<Reading>>,
    tx: broadcast::Sender<Reading>,
}

impl Default for MemorySource {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySource {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            readings: RwLock::new(Vec::new()),
            tx,
        }
    }

    /// Store a reading and notify subscribers if it is the newest one
    ///
    /// Returns the number of subscriptions notified.
    pub fn insert(&self, reading: Reading) -> usize {
        let is_newest = {
            let mut readings = self.readings.write().unwrap_or_else(PoisonError::into_inner);
            let is_newest = readings.iter().all(|r| r.timestamp <= reading.timestamp);
            readings.push(reading.clone());
            is_newest
        };
        if !is_newest {
            tracing::debug!("[Source] Stored out-of-order reading {}", reading.timestamp);
            return 0;
        }
        self.tx.send(reading).unwrap_or(0)
    }

    /// Number of open subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    fn newest(&self) -> Option<Reading> {
        let readings = self.readings.read().unwrap_or_else(PoisonError::into_inner);
        // max_by_key keeps the last maximum, so ties go to the latest insert
        readings.iter().max_by_key(|r| r.timestamp).cloned()
    }
}

#[async_trait]
impl ReadingSource for MemorySource {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn latest(&self) -> Result<Option<Reading>, SourceError> {
        Ok(self.newest())
    }

    async fn subscribe(&self) -> Result<ReadingStream, SourceError> {
        // Subscribe before reading the snapshot so no insert falls in between.
        let rx = self.tx.subscribe();
        let snapshot = self.newest();

        let updates = BroadcastStream::new(rx).filter_map(|item| async move {
            match item {
                Ok(reading) => Some(Ok::<Reading, SourceError>(reading)),
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    tracing::warn!("[Source] Memory subscription lagged, skipped {} readings", skipped);
                    None
                }
            }
        });

        Ok(stream::iter(snapshot.map(Ok)).chain(updates).boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_latest_empty() {
        let source = MemorySource::new();
        assert_eq!(source.latest().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_latest_orders_by_timestamp() {
        let source = MemorySource::new();
        source.insert(Reading::new(5));
        source.insert(Reading::new(3));
        assert_eq!(source.latest().await.unwrap().map(|r| r.timestamp), Some(5));
    }

    #[tokio::test]
    async fn test_subscribe_yields_snapshot_then_updates() {
        let source = MemorySource::new();
        source.insert(Reading::new(1));

        let mut stream = source.subscribe().await.unwrap();
        assert_eq!(source.insert(Reading::new(2)), 1);
        source.insert(Reading::new(0));
        source.insert(Reading::new(3));

        let first = stream.next().await.unwrap().unwrap();
        let second = stream.next().await.unwrap().unwrap();
        let third = stream.next().await.unwrap().unwrap();
        assert_eq!((first.timestamp, second.timestamp, third.timestamp), (1, 2, 3));
    }

    #[tokio::test]
    async fn test_dropped_subscription_is_released() {
        let source = MemorySource::new();
        let stream = source.subscribe().await.unwrap();
        assert_eq!(source.subscriber_count(), 1);
        drop(stream);
        assert_eq!(source.subscriber_count(), 0);
    }
}
