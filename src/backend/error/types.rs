/**
 * Backend Error Types
 *
 * This module defines error types specific to the backend server.
 * These errors are used in HTTP handlers and can be converted to HTTP responses.
 *
 * # Error Categories
 *
 * ## Handler Errors
 *
 * Handler errors occur when processing HTTP requests:
 * - Malformed request bodies or query parameters
 * - Missing or invalid bearer tokens
 * - Signup rule violations
 *
 * ## Upstream Errors
 *
 * Upstream errors wrap failures of the hosted services the backend delegates
 * to: the reading source, the identity provider and the profile store. Each
 * one is mapped to the status a client can act on.
 */

use thiserror::Error;
use axum::http::StatusCode;

use crate::shared::SharedError;
use crate::backend::auth::identity::IdentityError;
use crate::backend::auth::profiles::ProfileError;
use crate::backend::source::SourceError;

/// Backend-specific error types
///
/// # Usage
///
/// ```rust
/// use petcardio::backend::error::BackendError;
/// use axum::http::StatusCode;
///
/// let err = BackendError::handler(StatusCode::BAD_REQUEST, "Invalid request");
/// assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// Handler error (e.g., invalid input, missing token)
    #[error("Handler error: {message}")]
    HandlerError {
        /// HTTP status code for this error
        status: StatusCode,
        /// Human-readable error message
        message: String,
    },

    /// State management or startup error
    #[error("State error: {message}")]
    StateError {
        /// Human-readable error message
        message: String,
    },

    /// Reading source failure
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Identity provider failure
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// Profile store failure
    #[error(transparent)]
    Profile(#[from] ProfileError),

    /// Shared error (from shared module)
    #[error(transparent)]
    SharedError(#[from] SharedError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl BackendError {
    /// Create a new handler error with a status code
    pub fn handler(status: StatusCode, message: impl Into<String>) -> Self {
        Self::HandlerError {
            status,
            message: message.into(),
        }
    }

    /// Shorthand for a 400 handler error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::handler(StatusCode::BAD_REQUEST, message)
    }

    /// Shorthand for a 401 handler error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::handler(StatusCode::UNAUTHORIZED, message)
    }

    /// Shorthand for a 403 handler error
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::handler(StatusCode::FORBIDDEN, message)
    }

    /// Create a new state error
    pub fn state(message: impl Into<String>) -> Self {
        Self::StateError {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    ///
    /// # Status Code Mapping
    ///
    /// - `HandlerError` - Uses the status code from the error
    /// - `StateError` - 500 Internal Server Error
    /// - `Source` - 503 Service Unavailable (502 for malformed upstream data)
    /// - `Identity` - 409/400/401/403/429 by provider code, 502 otherwise
    /// - `Profile` - 502 Bad Gateway
    /// - `SharedError` - 400 for validation, 500 otherwise
    /// - `SerializationError` - 500 Internal Server Error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::HandlerError { status, .. } => *status,
            Self::StateError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Source(err) => match err {
                SourceError::Malformed(_) => StatusCode::BAD_GATEWAY,
                _ => StatusCode::SERVICE_UNAVAILABLE,
            },
            Self::Identity(err) => match err {
                IdentityError::AlreadyExists => StatusCode::CONFLICT,
                IdentityError::InvalidEmail | IdentityError::WeakPassword(_) => StatusCode::BAD_REQUEST,
                IdentityError::InvalidCredentials
                | IdentityError::InvalidToken
                | IdentityError::TokenExpired
                | IdentityError::AccountNotFound => StatusCode::UNAUTHORIZED,
                IdentityError::Disabled => StatusCode::FORBIDDEN,
                IdentityError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
                IdentityError::Unavailable(_) | IdentityError::Other(_) => StatusCode::BAD_GATEWAY,
            },
            Self::Profile(_) => StatusCode::BAD_GATEWAY,
            Self::SharedError(err) => match err {
                SharedError::ValidationError { .. } => StatusCode::BAD_REQUEST,
                SharedError::ReadingError { .. } => StatusCode::BAD_GATEWAY,
                SharedError::SerializationError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::SerializationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the client-facing error message
    ///
    /// Upstream failures report a generic message; the detail goes to the log.
    pub fn message(&self) -> String {
        match self {
            Self::HandlerError { message, .. } => message.clone(),
            Self::StateError { .. } => "Internal server error".to_string(),
            Self::Source(_) => "ECG data source unavailable".to_string(),
            Self::Identity(err) => match err {
                IdentityError::Unavailable(_) | IdentityError::Other(_) => {
                    "Identity provider unavailable".to_string()
                }
                IdentityError::InvalidToken | IdentityError::TokenExpired => {
                    "Invalid or expired token".to_string()
                }
                other => other.to_string(),
            },
            Self::Profile(_) => "Profile store unavailable".to_string(),
            Self::SharedError(err) => err.to_string(),
            Self::SerializationError(err) => err.to_string(),
        }
    }
}
