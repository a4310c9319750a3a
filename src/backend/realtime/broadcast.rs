/**
 * Event Relay
 *
 * This module implements the fan-out at the centre of the backend: one
 * stream of readings in, N client connections out.
 *
 * # Registry
 *
 * The relay owns a registry of sinks keyed by a unique id. A single mutex
 * guards it; registration, removal and fan-out all take the lock, so a
 * publish never observes a half-updated registry and a sink is never written
 * after its removal has been applied.
 *
 * # Delivery
 *
 * `publish` serializes the reading once and offers the same frame to every
 * registered sink. A sink that fails is removed on the spot. Nothing is kept
 * for sinks that register later: there is no replay.
 */

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use uuid::Uuid;

use crate::backend::realtime::sink::{Frame, Sink};
use crate::shared::Reading;

/// Identity of a registered sink
///
/// Returned by `register` and used to remove the sink. Handles are plain
/// values; removing through a stale handle is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SinkHandle(Uuid);

impl SinkHandle {
    pub fn id(&self) -> Uuid {
        self.0
    }
}

#[derive(Default)]
struct Registry {
    sinks: HashMap<Uuid, Box<dyn Sink>>,
}

/// Fan-out relay for readings
///
/// Cheap to clone; every clone shares the same registry.
///
/// # Example
/// ```rust
/// use petcardio::backend::realtime::{ChannelSink, EventRelay};
/// use petcardio::shared::Reading;
///
/// let relay = EventRelay::new();
/// let (sink, mut rx) = ChannelSink::channel();
/// let handle = relay.register(sink);
///
/// assert_eq!(relay.publish(&Reading::new(1).with_field("value", 70)), 1);
/// assert_eq!(rx.try_recv().unwrap().as_ref(), r#"{"timestamp":1,"value":70}"#);
///
/// relay.deregister(handle);
/// assert!(relay.is_empty());
/// ```
#[derive(Clone, Default)]
pub struct EventRelay {
    registry: Arc<Mutex<Registry>>,
}

impl EventRelay {
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        // A panic inside a sink must not take the whole relay down with it.
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a sink to the registry
    ///
    /// The sink receives every reading published from now on, and none that
    /// were published before.
    pub fn register<S: Sink + 'static>(&self, sink: S) -> SinkHandle {
        let id = Uuid::new_v4();
        let count = {
            let mut registry = self.registry();
            registry.sinks.insert(id, Box::new(sink));
            registry.sinks.len()
        };
        tracing::debug!("[Relay] Sink {} registered ({} active)", id, count);
        SinkHandle(id)
    }

    /// Add a sink that is removed again when the returned guard drops
    pub fn register_guarded<S: Sink + 'static>(&self, sink: S) -> SinkGuard {
        SinkGuard {
            relay: self.clone(),
            handle: self.register(sink),
        }
    }

    /// Remove a sink
    ///
    /// Unknown or already-removed handles are ignored.
    pub fn deregister(&self, handle: SinkHandle) {
        let (removed, count) = {
            let mut registry = self.registry();
            let removed = registry.sinks.remove(&handle.0).is_some();
            (removed, registry.sinks.len())
        };
        if removed {
            tracing::debug!("[Relay] Sink {} deregistered ({} active)", handle.0, count);
        }
    }

    /// Forward a reading to every registered sink
    ///
    /// Returns the number of sinks that accepted the frame. Sinks that fail
    /// are removed; their failure is not reported to the caller.
    pub fn publish(&self, reading: &Reading) -> usize {
        let frame: Frame = match reading.to_json() {
            Ok(json) => Arc::from(json),
            Err(e) => {
                tracing::error!("[Relay] Failed to serialize reading {}: {}", reading.timestamp, e);
                return 0;
            }
        };
        self.publish_frame(&frame)
    }

    /// Forward an already-serialized frame to every registered sink
    pub fn publish_frame(&self, frame: &Frame) -> usize {
        let mut delivered = 0;
        let mut dropped = 0;
        {
            let mut registry = self.registry();
            registry.sinks.retain(|id, sink| match sink.send(frame) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(e) => {
                    tracing::debug!("[Relay] Dropping sink {}: {}", id, e);
                    dropped += 1;
                    false
                }
            });
        }

        if dropped > 0 {
            tracing::info!(
                "[Relay] Frame delivered to {} sinks, {} dead sinks removed",
                delivered,
                dropped
            );
        } else {
            tracing::debug!("[Relay] Frame delivered to {} sinks", delivered);
        }
        delivered
    }

    /// Drop every registered sink
    ///
    /// Used at shutdown: adapters see their channel close and end their
    /// connections. Returns the number of sinks dropped.
    pub fn close_all(&self) -> usize {
        let drained: Vec<Box<dyn Sink>> = {
            let mut registry = self.registry();
            registry.sinks.drain().map(|(_, sink)| sink).collect()
        };
        let count = drained.len();
        drop(drained);
        tracing::info!("[Relay] Closed {} sinks", count);
        count
    }

    /// Number of registered sinks
    pub fn len(&self) -> usize {
        self.registry().sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the sink behind `handle` is still registered
    pub fn contains(&self, handle: SinkHandle) -> bool {
        self.registry().sinks.contains_key(&handle.0)
    }
}

/// Deregisters its sink on drop
///
/// Transport adapters keep the guard alive exactly as long as the client
/// connection, so every way a connection can end also ends the registration.
pub struct SinkGuard {
    relay: EventRelay,
    handle: SinkHandle,
}

impl SinkGuard {
    pub fn handle(&self) -> SinkHandle {
        self.handle
    }
}

impl Drop for SinkGuard {
    fn drop(&mut self) {
        self.relay.deregister(self.handle);
    }
}
