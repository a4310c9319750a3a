//! Server Module
//!
//! This module contains the code that initializes and configures the Axum
//! HTTP server.
//!
//! # Architecture
//!
//! - **`state`** - Application state structure and `FromRef` implementations
//! - **`config`** - Configuration loading and service construction
//! - **`init`** - Server initialization, relay pump startup, shutdown
//!
//! # Module Structure
//!
//! ```text
//! server/
//! ├── mod.rs    - Module exports and documentation
//! ├── state.rs  - AppState and FromRef implementations
//! ├── config.rs - Environment configuration and services
//! └── init.rs   - Server initialization and app creation
//! ```
//!
//! # Initialization Flow
//!
//! 1. **Configuration Loading**: `load_config` reads the environment
//! 2. **Service Creation**: Firebase clients or in-memory stores
//! 3. **State Creation**: relay, services and signup policy in `AppState`
//! 4. **Background Tasks**: the relay pump subscribes to the reading source
//! 5. **Router Creation**: routes and layers
//!
//! # Example
//!
//! ```rust,no_run
//! use petcardio::backend::server::{config::load_config, init::run};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config()?;
//! run(config).await?;
//! # Ok(())
//! # }
//! ```

/// Application state management
pub mod state;

/// Server configuration loading
pub mod config;

/// Server initialization
pub mod init;

pub use config::{load_config, load_services, Services};
pub use init::{build_state, create_app, run};
pub use state::AppState;
