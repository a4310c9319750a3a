/**
 * Authentication Handler Types
 *
 * This module defines the request and response types used by authentication handlers.
 * These types are shared across the signup, login, password reset and me handlers.
 */

use serde::{Deserialize, Serialize};

use crate::backend::auth::identity::Account;
use crate::backend::auth::profiles::{Profile, Role};

/// Sign up request
#[derive(Deserialize, Serialize, Debug)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    /// Defaults to `pet_owner`
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub name: Option<String>,
    /// Brazilian taxpayer id, required for veterinarians
    #[serde(default)]
    pub cpf: Option<String>,
}

/// Login request
///
/// Either an ID token obtained by the client from the identity provider, or
/// an email and password for the backend to sign in with.
#[derive(Deserialize, Serialize, Debug)]
#[serde(untagged)]
pub enum LoginRequest {
    Token { token: String },
    Password { email: String, password: String },
}

/// Password reset request
#[derive(Deserialize, Serialize, Debug)]
pub struct PasswordResetRequest {
    pub email: String,
}

/// User response
///
/// Account data from the identity provider merged with the stored profile.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub email_verified: bool,
    /// `None` when the account has no profile
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl UserResponse {
    pub fn new(account: &Account, profile: Option<&Profile>) -> Self {
        Self {
            id: account.id.clone(),
            email: account.email.clone(),
            email_verified: account.email_verified,
            role: profile.map(|p| p.role),
            name: profile.and_then(|p| p.name.clone()),
        }
    }
}

/// Signup response
#[derive(Serialize, Deserialize, Debug)]
pub struct SignupResponse {
    pub message: String,
    pub user: UserResponse,
}

/// Login response
///
/// Tokens are only present for password logins; a token login already holds
/// its token.
#[derive(Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    pub message: String,
    pub user: UserResponse,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
}

/// Plain message body
#[derive(Serialize, Deserialize, Debug)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
