/**
 * Router Configuration
 *
 * This module provides the main router creation function that combines
 * all route configurations into a single Axum router.
 *
 * # Route Groups
 *
 * 1. Auth routes (signup, login, password reset, me)
 * 2. ECG routes (last known value, SSE, WebSocket, long-poll)
 * 3. Health
 * 4. Fallback handler (404)
 *
 * # Layers
 *
 * Every request is traced (`TraceLayer`) and CORS is permissive so the
 * browser and mobile clients can call the API from any origin.
 */

use axum::{
    http::StatusCode,
    middleware,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::backend::auth::handlers::types::MessageResponse;
use crate::backend::auth::handlers::{get_me, login, password_reset, signup};
use crate::backend::ecg::handlers::{get_latest, health};
use crate::backend::middleware::auth::auth_middleware;
use crate::backend::realtime::{handle_reading_poll, handle_reading_socket, handle_reading_stream};
use crate::backend::server::state::AppState;

/// Create the Axum router with all routes configured
///
/// # Route Details
///
/// ## Auth Routes
///
/// - `POST /signup` - Account registration
/// - `POST /login` - Token or password login
/// - `POST /password-reset` - Reset link by mail
/// - `GET /me` - Current account (bearer token required)
///
/// ## ECG Routes
///
/// - `GET /ecg` - Last known reading (`?format=csv` for CSV)
/// - `GET /ecg/stream` - Server-Sent Events (alias `GET /events`)
/// - `GET /ecg/ws` - WebSocket
/// - `GET /ecg/poll` - Long-poll (`?timeout_secs=N`)
///
/// ## Health
///
/// - `GET /health` - Source name and connected client count
pub fn create_router(app_state: AppState) -> Router<()> {
    let protected = Router::new()
        .route("/me", get(get_me))
        .route_layer(middleware::from_fn_with_state(app_state.clone(), auth_middleware));

    let auth_routes = Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/password-reset", post(password_reset))
        .merge(protected);

    let ecg_routes = Router::new()
        .route("/ecg", get(get_latest))
        .route("/ecg/stream", get(handle_reading_stream))
        .route("/events", get(handle_reading_stream))
        .route("/ecg/ws", get(handle_reading_socket))
        .route("/ecg/poll", get(handle_reading_poll));

    Router::new()
        .merge(auth_routes)
        .merge(ecg_routes)
        .route("/health", get(health))
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(app_state)
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(MessageResponse::new("Not found")))
}
