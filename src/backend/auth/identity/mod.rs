//! Identity Provider Module
//!
//! Accounts, passwords and ID tokens are owned by a hosted identity service.
//! This module is the narrow interface the backend uses to reach it.
//!
//! # Module Structure
//!
//! ```text
//! identity/
//! ├── mod.rs      - IdentityProvider trait, Account, Session, IdentityError
//! ├── firebase.rs - Identity Toolkit REST client
//! └── memory.rs   - In-process account table for development and tests
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identity Toolkit REST client
pub mod firebase;

/// In-process identity provider
pub mod memory;

pub use firebase::FirebaseIdentity;
pub use memory::{EmailKind, MemoryIdentity, SentEmail};

/// Account as known to the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Provider-assigned account id (Firebase `localId`)
    pub id: String,
    pub email: String,
    pub email_verified: bool,
    pub disabled: bool,
}

impl Account {
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            email_verified: false,
            disabled: false,
        }
    }
}

/// Signed-in account with its tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub account: Account,
    pub id_token: String,
    pub refresh_token: String,
    /// ID token lifetime in seconds
    pub expires_in: u64,
}

/// Identity provider failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("Email already registered")]
    AlreadyExists,

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Password rejected: {0}")]
    WeakPassword(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Account not found")]
    AccountNotFound,

    #[error("Account disabled")]
    Disabled,

    #[error("Too many attempts, try again later")]
    RateLimited,

    #[error("identity provider unavailable: {0}")]
    Unavailable(String),

    #[error("identity provider error: {0}")]
    Other(String),
}

impl IdentityError {
    /// Map an Identity Toolkit error message to an error
    ///
    /// Messages look like `EMAIL_EXISTS` or
    /// `WEAK_PASSWORD : Password should be at least 6 characters`.
    pub fn from_code(message: &str) -> Self {
        let (code, detail) = match message.split_once(" : ") {
            Some((code, detail)) => (code.trim(), detail.trim()),
            None => (message.trim(), ""),
        };
        match code {
            "EMAIL_EXISTS" => Self::AlreadyExists,
            "INVALID_EMAIL" | "MISSING_EMAIL" => Self::InvalidEmail,
            "WEAK_PASSWORD" | "MISSING_PASSWORD" => Self::WeakPassword(if detail.is_empty() {
                code.to_string()
            } else {
                detail.to_string()
            }),
            "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => Self::InvalidCredentials,
            "EMAIL_NOT_FOUND" | "USER_NOT_FOUND" => Self::AccountNotFound,
            "INVALID_ID_TOKEN" | "MISSING_ID_TOKEN" => Self::InvalidToken,
            "TOKEN_EXPIRED" | "CREDENTIAL_TOO_OLD_LOGIN_AGAIN" => Self::TokenExpired,
            "USER_DISABLED" => Self::Disabled,
            "TOO_MANY_ATTEMPTS_TRY_LATER" => Self::RateLimited,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Hosted identity service
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Whether an account is registered for `email`
    async fn account_exists(&self, email: &str) -> Result<bool, IdentityError>;

    /// Register a new email/password account
    async fn create_account(&self, email: &str, password: &str) -> Result<Session, IdentityError>;

    /// Password sign-in
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, IdentityError>;

    /// Resolve an ID token to the account it was issued for
    async fn verify_token(&self, id_token: &str) -> Result<Account, IdentityError>;

    /// Ask the provider to mail an address verification link
    async fn send_verification_email(&self, id_token: &str) -> Result<(), IdentityError>;

    /// Ask the provider to mail a password reset link
    async fn send_password_reset(&self, email: &str) -> Result<(), IdentityError>;
}
