//! Route Configuration Module
//!
//! This module configures all HTTP routes for the backend server.
//!
//! # Module Structure
//!
//! ```text
//! routes/
//! ├── mod.rs    - Module exports and documentation
//! └── router.rs - Router creation and layers
//! ```
//!
//! # Route Types
//!
//! ## Auth Routes
//!
//! - `POST /signup`, `POST /login`, `POST /password-reset`
//! - `GET /me` - behind `auth_middleware`
//!
//! ## ECG Routes
//!
//! - `GET /ecg` - Last known value
//! - `GET /ecg/stream`, `GET /events` - Server-Sent Events
//! - `GET /ecg/ws` - WebSocket
//! - `GET /ecg/poll` - Long-poll

/// Main router creation
pub mod router;

pub use router::create_router;
