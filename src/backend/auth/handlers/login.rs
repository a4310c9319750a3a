/**
 * Login Handler
 *
 * POST /login accepts two shapes:
 *
 * - `{"token": "<id token>"}` - the client signed in with the identity
 *   provider itself; the backend verifies the token and returns the account
 * - `{"email": "...", "password": "..."}` - the backend signs in on the
 *   client's behalf and returns the issued tokens
 *
 * Both answer 401 when the token or the credentials are rejected.
 */

use axum::{extract::State, response::Json};

use crate::backend::auth::handlers::types::{LoginRequest, LoginResponse, UserResponse};
use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;

/// Login handler
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, BackendError> {
    match request {
        LoginRequest::Token { token } => {
            let account = state.identity.verify_token(token.trim()).await.map_err(|e| {
                tracing::warn!("[Auth] Token login rejected: {}", e);
                BackendError::from(e)
            })?;
            let profile = state.profiles.get(&account.id).await?;
            tracing::info!("[Auth] Token login for {}", account.id);

            Ok(Json(LoginResponse {
                message: "Login successful".to_string(),
                user: UserResponse::new(&account, profile.as_ref()),
                token: None,
                refresh_token: None,
                expires_in: None,
            }))
        }
        LoginRequest::Password { email, password } => {
            let session = state.identity.sign_in(email.trim(), &password).await.map_err(|e| {
                tracing::warn!("[Auth] Password login for {} rejected: {}", email.trim(), e);
                BackendError::from(e)
            })?;
            let profile = state.profiles.get(&session.account.id).await?;
            tracing::info!("[Auth] Password login for {}", session.account.id);

            Ok(Json(LoginResponse {
                message: "Login successful".to_string(),
                user: UserResponse::new(&session.account, profile.as_ref()),
                token: Some(session.id_token),
                refresh_token: Some(session.refresh_token),
                expires_in: Some(session.expires_in),
            }))
        }
    }
}
