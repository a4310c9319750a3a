//! Reading Source Module
//!
//! This module defines how the backend reaches the realtime database that
//! stores ECG readings. The relay needs exactly two capabilities from it:
//!
//! - a point query for the most recent reading (last-known-value path)
//! - a push subscription that yields each new reading as it is written
//!
//! # Module Structure
//!
//! ```text
//! source/
//! ├── mod.rs          - ReadingSource trait and SourceError
//! ├── firebase.rs     - Firebase Realtime Database REST client
//! ├── event_stream.rs - text/event-stream decoder for the REST stream
//! └── memory.rs       - In-process source for development and tests
//! ```
//!
//! # Subscriptions
//!
//! A subscription is a lazy stream that ends when the underlying connection
//! ends. It is not restartable: the relay pump calls `subscribe` again to
//! resume after a failure.

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use thiserror::Error;

use crate::shared::Reading;

/// Firebase Realtime Database REST client
pub mod firebase;

/// Server-sent event decoder
pub mod event_stream;

/// In-process reading source
pub mod memory;

pub use firebase::{DatabaseRef, FirebaseSource};
pub use memory::MemorySource;

/// Stream of readings produced by one subscription
pub type ReadingStream = BoxStream<'static, Result<Reading, SourceError>>;

/// Reading source failures
#[derive(Debug, Error)]
pub enum SourceError {
    /// The source could not be reached
    #[error("source unavailable: {0}")]
    Unavailable(String),

    /// The source answered with an unexpected HTTP status
    #[error("source returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The source answered with data that is not a reading collection
    #[error("malformed source data: {0}")]
    Malformed(String),

    /// The source closed the subscription (rules changed, permission lost)
    #[error("subscription cancelled: {0}")]
    Cancelled(String),

    /// The credential used by the subscription is no longer valid
    #[error("subscription credential revoked")]
    AuthRevoked,
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => SourceError::Http {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None => SourceError::Unavailable(err.to_string()),
        }
    }
}

/// External feed of ECG readings
#[async_trait]
pub trait ReadingSource: Send + Sync {
    /// Short name used in logs and the health endpoint
    fn name(&self) -> &'static str;

    /// Most recent reading by timestamp, or `None` when there is no data yet
    async fn latest(&self) -> Result<Option<Reading>, SourceError>;

    /// Open a push subscription for new readings
    ///
    /// The stream starts with the current latest reading (if any), then
    /// yields every newer one. An `Err` item means the subscription is dead.
    async fn subscribe(&self) -> Result<ReadingStream, SourceError>;
}
