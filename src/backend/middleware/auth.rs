/**
 * Authentication Middleware
 *
 * This module provides middleware for protecting routes that require
 * user authentication. It extracts the ID token from the Authorization
 * header, has the identity provider verify it, and loads the caller's
 * profile.
 */

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::backend::auth::identity::Account;
use crate::backend::auth::profiles::{Profile, Role};
use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;

/// Caller identified by a verified ID token
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub account: Account,
    /// `None` for accounts created outside this backend
    pub profile: Option<Profile>,
}

impl AuthenticatedUser {
    pub fn role(&self) -> Option<Role> {
        self.profile.as_ref().map(|p| p.role)
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Some(Role::Admin)
    }
}

/// Token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Verify the bearer token in `headers` and load the caller
///
/// Returns 401 when the header is missing or the token is rejected.
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<AuthenticatedUser, BackendError> {
    let token = bearer_token(headers).ok_or_else(|| {
        tracing::warn!("[Auth] Missing or malformed Authorization header");
        BackendError::unauthorized("Missing bearer token")
    })?;

    let account = state.identity.verify_token(token).await.map_err(|e| {
        tracing::warn!("[Auth] Token rejected: {}", e);
        BackendError::from(e)
    })?;
    let profile = state.profiles.get(&account.id).await?;

    Ok(AuthenticatedUser { account, profile })
}

/// Authentication middleware
///
/// Attaches the `AuthenticatedUser` to the request extensions, or answers
/// 401 before the handler runs.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, BackendError> {
    let user = authenticate(&state, request.headers()).await?;
    tracing::debug!("[Auth] Authenticated {}", user.account.id);
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Axum extractor for the authenticated user
///
/// Uses the user attached by `auth_middleware` when present and verifies
/// the token itself otherwise.
#[derive(Clone, Debug)]
pub struct AuthUser(pub AuthenticatedUser);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = BackendError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>() {
            return Ok(AuthUser(user.clone()));
        }
        authenticate(state, &parts.headers).await.map(AuthUser)
    }
}
