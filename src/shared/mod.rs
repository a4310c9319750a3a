//! Shared Module
//!
//! This module contains the types that both the HTTP layer and the data
//! sources agree on: the ECG reading record, the shared error type and the
//! application configuration.

/// ECG reading record
pub mod reading;

/// Shared error types
pub mod error;

/// Application configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use reading::Reading;
pub use error::SharedError;
pub use config::{AppConfig, AppConfigBuilder, ConfigError, SignupRules, SourceKind};
