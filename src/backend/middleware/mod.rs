//! Middleware Module
//!
//! This module contains the HTTP middleware for the backend server.
//!
//! # Architecture
//!
//! - **`auth`** - Bearer token authentication for protected routes
//!
//! # Example
//!
//! ```rust,no_run
//! use axum::{middleware, routing::get, Router};
//! use petcardio::backend::middleware::auth_middleware;
//! use petcardio::backend::server::state::AppState;
//!
//! # fn example(state: AppState) {
//! let protected: Router<AppState> = Router::new()
//!     .route("/me", get(|| async { "ok" }))
//!     .route_layer(middleware::from_fn_with_state(state, auth_middleware));
//! # }
//! ```

pub mod auth;

pub use auth::{auth_middleware, authenticate, bearer_token, AuthUser, AuthenticatedUser};
