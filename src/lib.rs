//! PetCardio - Main Library
//!
//! PetCardio is the backend of a pet-cardiology product: signup and login
//! against a hosted identity provider, and realtime relay of ECG readings
//! from a hosted realtime database to HTTP clients.
//!
//! # Module Structure
//!
//! - **`shared`** - Types shared by every part of the crate
//!   - `Reading`, the ECG record
//!   - Configuration (`AppConfig`, `SignupRules`)
//!   - Error types
//!
//! - **`backend`** - Server-side code (only compiled with `ssr` feature)
//!   - Axum HTTP server and routes
//!   - Event relay with SSE, WebSocket and long-poll transports
//!   - Firebase Realtime Database and Identity Toolkit clients
//!
//! # Feature Flags
//!
//! - **`ssr`** (default) - Enables the backend modules and the server binary
//!
//! # Usage
//!
//! ```rust,no_run
//! use petcardio::backend::server::{config::load_config, init::run};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! run(load_config()?).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Relay Semantics
//!
//! - A reading is serialized once per publish and offered to every client
//! - A client receives exactly the readings published while it is connected,
//!   in publish order; there is no replay
//! - A client whose connection fails is dropped without affecting the others

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
#[cfg(feature = "ssr")]
pub mod backend;
