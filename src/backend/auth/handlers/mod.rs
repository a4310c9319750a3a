//! Authentication Handlers Module
//!
//! This module contains all HTTP handlers for authentication endpoints.
//! Handlers are organized into focused submodules for maintainability.
//!
//! # Module Structure
//!
//! ```text
//! handlers/
//! ├── mod.rs            - Module exports and documentation
//! ├── types.rs          - Request and response types
//! ├── signup.rs         - Account registration handler
//! ├── login.rs          - Token and password login handler
//! ├── password_reset.rs - Password reset mail handler
//! └── me.rs             - Get current user handler
//! ```
//!
//! # Handlers
//!
//! - **`signup`** - POST /signup - Account registration
//! - **`login`** - POST /login - Token or password login
//! - **`password_reset`** - POST /password-reset - Reset link by mail
//! - **`get_me`** - GET /me - Current account and profile

/// Request and response types
pub mod types;

/// Signup handler
pub mod signup;

/// Login handler
pub mod login;

/// Password reset handler
pub mod password_reset;

/// Get current user handler
pub mod me;

pub use types::{LoginRequest, LoginResponse, PasswordResetRequest, SignupRequest, SignupResponse, UserResponse};

pub use login::login;
pub use me::get_me;
pub use password_reset::password_reset;
pub use signup::signup;
