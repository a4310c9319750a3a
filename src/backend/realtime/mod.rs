//! Real-time Relay Module
//!
//! This module forwards ECG readings from the reading source to every
//! connected client, whatever transport the client picked.
//!
//! # Architecture
//!
//! - **`sink`** - The `Sink` trait and the channel-backed sinks
//! - **`broadcast`** - `EventRelay`, the sink registry and fan-out
//! - **`pump`** - Task that feeds the relay from a source subscription
//! - **`subscription`** - Server-Sent Events adapter
//! - **`websocket`** - WebSocket adapter
//! - **`long_poll`** - Long-poll adapter
//!
//! # Module Structure
//!
//! ```text
//! realtime/
//! ├── mod.rs          - Module exports and documentation
//! ├── sink.rs         - Sink trait, ChannelSink, OneshotSink
//! ├── broadcast.rs    - EventRelay, SinkHandle, SinkGuard
//! ├── pump.rs         - RelayPump and reconnect backoff
//! ├── subscription.rs - SSE handler
//! ├── websocket.rs    - WebSocket handler
//! └── long_poll.rs    - Long-poll handler
//! ```
//!
//! # Data Flow
//!
//! ```text
//! ReadingSource ──subscribe──> RelayPump ──publish──> EventRelay
//!                                                        │
//!                        ┌───────────────┬───────────────┤
//!                        v               v               v
//!                   ChannelSink     ChannelSink     OneshotSink
//!                     (SSE)         (WebSocket)     (long-poll)
//! ```
//!
//! Every adapter holds a `SinkGuard` for as long as its connection lives.

/// Sink trait and implementations
pub mod sink;

/// Sink registry and fan-out
pub mod broadcast;

/// Source-to-relay pump
pub mod pump;

/// Server-Sent Events handler
pub mod subscription;

/// WebSocket handler
pub mod websocket;

/// Long-poll handler
pub mod long_poll;

pub use broadcast::{EventRelay, SinkGuard, SinkHandle};
pub use long_poll::handle_reading_poll;
pub use pump::{Backoff, RelayPump};
pub use sink::{ChannelSink, Frame, OneshotSink, Sink, SinkError};
pub use subscription::handle_reading_stream;
pub use websocket::handle_reading_socket;
