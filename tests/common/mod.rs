//! Common test utilities and helpers
//!
//! This module provides shared utilities for all tests including:
//! - An in-memory application harness driven through the router
//! - Recording sinks and a scripted reading source
//! - Custom assertion macros

#![allow(dead_code)]

pub mod assertions;
pub mod app;
pub mod sinks;
pub mod sources;

// Re-export commonly used utilities
pub use app::*;
pub use sinks::*;
pub use sources::*;
