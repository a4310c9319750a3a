//! ECG Module
//!
//! Request/response access to the ECG readings: the last known value, its
//! CSV export, and the health endpoint.
//!
//! # Module Structure
//!
//! ```text
//! ecg/
//! ├── mod.rs      - Module exports
//! ├── handlers.rs - GET /ecg, GET /health
//! └── csv.rs      - CSV rendering
//! ```

/// HTTP handlers
pub mod handlers;

/// CSV rendering
pub mod csv;

pub use handlers::{get_latest, health, ExportFormat, HealthResponse};
