/**
 * Relay Sinks
 *
 * A sink is the relay's view of one live client connection: something that
 * accepts an already-serialized frame without blocking, and reports failure
 * once the client behind it is gone.
 *
 * # Implementations
 *
 * - `ChannelSink` - unbounded channel drained by a streaming transport
 *   (SSE response body, WebSocket write loop)
 * - `OneshotSink` - delivers exactly one frame, for long-poll requests
 *
 * Sends never await: the registry lock is held while a frame is fanned out,
 * so a sink must hand the frame off and return immediately.
 */

use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

/// Serialized reading, shared by every sink that receives it
pub type Frame = Arc<str>;

/// Sink write failure
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// The connection behind the sink is gone
    #[error("sink closed")]
    Closed,
}

/// Output side of one client connection
pub trait Sink: Send + Sync {
    /// Hand a frame to the connection
    ///
    /// Any error causes the relay to drop the sink.
    fn send(&self, frame: &Frame) -> Result<(), SinkError>;
}

/// Sink backed by an unbounded channel
///
/// The receiving half is owned by the transport adapter; dropping it (client
/// disconnected) makes the next send fail with `SinkError::Closed`.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Frame>,
}

impl ChannelSink {
    /// Create a sink and the receiver that drains it
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Frame>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Sink for ChannelSink {
    fn send(&self, frame: &Frame) -> Result<(), SinkError> {
        self.tx.send(frame.clone()).map_err(|_| SinkError::Closed)
    }
}

/// Sink that accepts a single frame
///
/// Every send after the first one fails, so the relay drops the sink on the
/// following publish if the adapter has not deregistered it already.
#[derive(Debug)]
pub struct OneshotSink {
    tx: Mutex<Option<oneshot::Sender<Frame>>>,
}

impl OneshotSink {
    /// Create a sink and the receiver for its only frame
    pub fn channel() -> (Self, oneshot::Receiver<Frame>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                tx: Mutex::new(Some(tx)),
            },
            rx,
        )
    }
}

impl Sink for OneshotSink {
    fn send(&self, frame: &Frame) -> Result<(), SinkError> {
        let tx = self
            .tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(SinkError::Closed)?;
        tx.send(frame.clone()).map_err(|_| SinkError::Closed)
    }
}
