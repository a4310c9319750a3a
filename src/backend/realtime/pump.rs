/**
 * Relay Pump
 *
 * The pump is the single task that connects a `ReadingSource` subscription
 * to the `EventRelay`. It publishes readings one at a time in arrival order,
 * and keeps the subscription alive:
 *
 * - When the subscription fails or ends, the pump logs it and subscribes
 *   again after an exponential backoff (500 ms doubling up to 30 s).
 * - When the server shuts down, the `watch` channel flips and the pump drops
 *   the subscription and exits.
 *
 * A resubscription starts with the source's current latest reading; if that
 * first reading was the last one published, it is not published twice.
 * Every later reading of a subscription is a new record and is always
 * published, even when its content repeats.
 */

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::backend::realtime::broadcast::EventRelay;
use crate::backend::source::ReadingSource;
use crate::shared::Reading;

const INITIAL_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Exponential reconnect delay
#[derive(Debug, Clone)]
pub struct Backoff {
    current: Duration,
    max: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(INITIAL_BACKOFF, MAX_BACKOFF)
    }
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self { current: initial, max }
    }

    /// Delay to wait now; doubles the next one
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.max);
        delay
    }

    pub fn reset(&mut self) {
        self.current = INITIAL_BACKOFF.min(self.max);
    }
}

/// Running pump task
pub struct RelayPump {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl RelayPump {
    /// Start forwarding readings from `source` into `relay`
    pub fn spawn(source: Arc<dyn ReadingSource>, relay: EventRelay) -> Self {
        Self::spawn_with_backoff(source, relay, Backoff::default())
    }

    pub fn spawn_with_backoff(source: Arc<dyn ReadingSource>, relay: EventRelay, backoff: Backoff) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(run(source, relay, backoff, shutdown_rx));
        Self { shutdown_tx, task }
    }

    /// Stop the subscription and wait for the task to finish
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            tracing::error!("[Relay] Pump task failed: {}", e);
        }
        tracing::info!("[Relay] Pump stopped");
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Resolves once shutdown is requested or the pump handle is gone
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    while !*shutdown.borrow_and_update() {
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

async fn run(
    source: Arc<dyn ReadingSource>,
    relay: EventRelay,
    mut backoff: Backoff,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut last_published: Option<Reading> = None;

    loop {
        let subscription = tokio::select! {
            _ = shutdown_requested(&mut shutdown) => break,
            result = source.subscribe() => result,
        };

        match subscription {
            Ok(mut readings) => {
                tracing::info!("[Relay] Subscribed to {} source", source.name());
                backoff.reset();
                let mut replay = true;
                loop {
                    let item = tokio::select! {
                        _ = shutdown_requested(&mut shutdown) => return,
                        item = readings.next() => item,
                    };
                    match item {
                        Some(Ok(reading)) => {
                            let replayed = replay && last_published.as_ref() == Some(&reading);
                            replay = false;
                            if replayed {
                                tracing::debug!("[Relay] Skipping replayed reading {}", reading.timestamp);
                                continue;
                            }
                            tracing::info!("[Relay] New ECG reading {}", reading.timestamp);
                            relay.publish(&reading);
                            last_published = Some(reading);
                        }
                        Some(Err(e)) => {
                            tracing::warn!("[Relay] Subscription to {} failed: {}", source.name(), e);
                            break;
                        }
                        None => {
                            tracing::warn!("[Relay] Subscription to {} ended", source.name());
                            break;
                        }
                    }
                }
            }
            Err(e) => {
                tracing::error!("[Relay] Could not subscribe to {}: {}", source.name(), e);
            }
        }

        let delay = backoff.next_delay();
        tracing::info!("[Relay] Resubscribing in {:?}", delay);
        tokio::select! {
            _ = shutdown_requested(&mut shutdown) => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_up_to_max() {
        let mut backoff = Backoff::new(Duration::from_millis(500), Duration::from_secs(2));
        assert_eq!(backoff.next_delay(), Duration::from_millis(500));
        assert_eq!(backoff.next_delay(), Duration::from_secs(1));
        assert_eq!(backoff.next_delay(), Duration::from_secs(2));
        assert_eq!(backoff.next_delay(), Duration::from_secs(2));

        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_millis(500));
    }
}
