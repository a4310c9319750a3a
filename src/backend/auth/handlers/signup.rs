/**
 * Signup Handler
 *
 * This module implements the account registration handler for POST /signup.
 *
 * # Registration Process
 *
 * 1. Apply the signup policy (email shape, password length, CPF)
 * 2. For `veterinarian` and `admin` accounts, require an admin caller
 * 3. Optionally ask the provider whether the email is taken
 * 4. Create the account with the identity provider
 * 5. Store the profile (role, name, CPF)
 * 6. Optionally have the provider mail a verification link
 *
 * # Errors
 *
 * * `400 Bad Request` - Policy violation or provider rejected the input
 * * `401 Unauthorized` - Privileged role requested without a valid token
 * * `403 Forbidden` - Privileged role requested by a non-admin
 * * `409 Conflict` - Email already registered
 * * `502 Bad Gateway` - Identity provider or profile store failed
 */

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
};

use crate::backend::auth::handlers::types::{SignupRequest, SignupResponse, UserResponse};
use crate::backend::auth::identity::IdentityError;
use crate::backend::auth::profiles::Profile;
use crate::backend::error::BackendError;
use crate::backend::middleware::auth::authenticate;
use crate::backend::server::state::AppState;

/// Sign up handler
///
/// # Example Request
///
/// ```http
/// POST /signup HTTP/1.1
/// Content-Type: application/json
///
/// {"email": "tutor@example.com", "password": "secret1", "name": "Ana"}
/// ```
///
/// # Example Response
///
/// ```json
/// {
///   "message": "Account created",
///   "user": {"id": "Xb3...", "email": "tutor@example.com", "email_verified": false, "role": "pet_owner", "name": "Ana"}
/// }
/// ```
pub async fn signup(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), BackendError> {
    let email = request.email.trim();
    let role = request.role.unwrap_or_default();
    tracing::info!("[Auth] Signup request for {} as {}", email, role.as_str());

    let cpf = state
        .signup
        .check(email, &request.password, role, request.cpf.as_deref())?;

    if role.requires_admin() {
        let caller = authenticate(&state, &headers).await?;
        if !caller.is_admin() {
            tracing::warn!(
                "[Auth] {} tried to create a {} account without admin role",
                caller.account.id,
                role.as_str()
            );
            return Err(BackendError::forbidden("Only admins can create this role"));
        }
    }

    let rules = state.signup.rules();
    if rules.check_existing_email && state.identity.account_exists(email).await? {
        tracing::info!("[Auth] Signup rejected, {} already registered", email);
        return Err(IdentityError::AlreadyExists.into());
    }

    let session = state.identity.create_account(email, &request.password).await?;

    let name = request.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
    let profile = Profile::new(session.account.id.clone(), session.account.email.clone(), role)
        .with_name(name)
        .with_cpf(cpf);
    if let Err(e) = state.profiles.put(&profile).await {
        tracing::error!(
            "[Auth] Account {} created but its profile could not be stored: {}",
            session.account.id,
            e
        );
        return Err(e.into());
    }

    if rules.send_verification_email {
        if let Err(e) = state.identity.send_verification_email(&session.id_token).await {
            tracing::warn!("[Auth] Verification email for {} failed: {}", session.account.id, e);
        }
    }

    tracing::info!("[Auth] Account {} created", session.account.id);
    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "Account created".to_string(),
            user: UserResponse::new(&session.account, Some(&profile)),
        }),
    ))
}
