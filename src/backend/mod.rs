//! Backend Module
//!
//! This module contains all server-side code for the PetCardio backend: an
//! Axum HTTP server that relays ECG readings from the hosted realtime
//! database to connected clients, and fronts the hosted identity provider for
//! signup and login.
//!
//! This module is only compiled when the `ssr` feature is enabled.
//!
//! # Architecture
//!
//! - **`server`** - Server initialization, application state, configuration
//! - **`routes`** - HTTP route configuration and router assembly
//! - **`source`** - Reading sources (Firebase Realtime Database, in-memory)
//! - **`realtime`** - Event relay, relay pump, SSE/WebSocket/long-poll adapters
//! - **`ecg`** - Last-known-value and CSV endpoints
//! - **`auth`** - Identity provider, profiles, signup policy, auth handlers
//! - **`middleware`** - Bearer token authentication
//! - **`error`** - Backend-specific error types
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs          - Module exports and documentation
//! ├── main.rs         - Server binary
//! ├── server/         - Server initialization and state
//! ├── routes/         - Route configuration
//! ├── source/         - Reading sources
//! ├── realtime/       - Relay and transports
//! ├── ecg/            - ECG request/response handlers
//! ├── auth/           - Authentication
//! ├── middleware/     - Request middleware
//! └── error/          - Error types
//! ```
//!
//! # Data Flow
//!
//! ```text
//! Realtime Database ──stream──> ReadingSource ──> RelayPump ──> EventRelay ──> clients
//!                                     │
//!                                     └──latest()──> GET /ecg
//! ```
//!
//! # Thread Safety
//!
//! - `EventRelay` guards its sink registry with one mutex, never held across an `.await`
//! - Sinks are non-blocking channel senders; slow clients buffer in their own channel
//! - Services are `Arc<dyn Trait + Send + Sync>` shared through `AppState`
//!
//! # Error Handling
//!
//! - `BackendError` for handler errors, converted into JSON responses
//! - Per-layer errors (`SourceError`, `IdentityError`, `ProfileError`, `SinkError`)
//! - Proper error propagation with `?` operator

/// Server setup and configuration
pub mod server;

/// Route configuration
pub mod routes;

/// Reading sources
pub mod source;

/// Real-time relay
pub mod realtime;

/// ECG handlers
pub mod ecg;

/// Backend error types
pub mod error;

/// Authentication and account profiles
pub mod auth;

/// Middleware for request processing
pub mod middleware;

pub use error::BackendError;
pub use realtime::{EventRelay, RelayPump};
pub use server::{create_app, AppState};
