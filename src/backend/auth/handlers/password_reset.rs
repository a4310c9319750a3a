/**
 * Password Reset Handler
 *
 * POST /password-reset has the identity provider mail a reset link. The
 * answer is `202 Accepted` whether or not the address is registered, so the
 * endpoint does not reveal which accounts exist.
 */

use axum::{extract::State, http::StatusCode, response::Json};

use crate::backend::auth::handlers::types::{MessageResponse, PasswordResetRequest};
use crate::backend::auth::identity::IdentityError;
use crate::backend::auth::policy::is_valid_email;
use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;

pub const RESET_MESSAGE: &str = "If the address is registered, a reset link has been sent";

/// Password reset handler
pub async fn password_reset(
    State(state): State<AppState>,
    Json(request): Json<PasswordResetRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), BackendError> {
    let email = request.email.trim();
    if !is_valid_email(email) {
        return Err(BackendError::bad_request("Invalid email address"));
    }

    match state.identity.send_password_reset(email).await {
        Ok(()) => tracing::info!("[Auth] Password reset sent to {}", email),
        Err(IdentityError::AccountNotFound | IdentityError::InvalidCredentials) => {
            tracing::info!("[Auth] Password reset for unknown address {}", email);
        }
        Err(e) => return Err(e.into()),
    }

    Ok((StatusCode::ACCEPTED, Json(MessageResponse::new(RESET_MESSAGE))))
}
