/**
 * Long-Poll Handler
 *
 * `GET /ecg/poll` holds the request open until the next reading is
 * published, answering with that reading, or with `204 No Content` when the
 * wait times out.
 *
 * # Query Parameters
 *
 * - `timeout_secs` - how long to wait (default 25, capped at 60)
 *
 * The one-shot sink is registered behind a `SinkGuard`, so it leaves the
 * registry on delivery, on timeout, and when the client abandons the request
 * (axum drops the handler future).
 */

use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::backend::realtime::sink::OneshotSink;
use crate::backend::server::state::AppState;

pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 25;
pub const MAX_POLL_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Default, Deserialize)]
pub struct PollQuery {
    pub timeout_secs: Option<u64>,
}

impl PollQuery {
    pub fn timeout(&self) -> Duration {
        let secs = self
            .timeout_secs
            .unwrap_or(DEFAULT_POLL_TIMEOUT_SECS)
            .min(MAX_POLL_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }
}

/// Handle long-poll request (GET /ecg/poll)
pub async fn handle_reading_poll(State(state): State<AppState>, Query(query): Query<PollQuery>) -> Response {
    let (sink, rx) = OneshotSink::channel();
    let guard = state.relay.register_guarded(sink);
    let timeout = query.timeout();
    tracing::debug!("[Relay] Long-poll {} waiting up to {:?}", guard.handle().id(), timeout);

    let outcome = tokio::time::timeout(timeout, rx).await;
    drop(guard);

    match outcome {
        Ok(Ok(frame)) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            frame.to_string(),
        )
            .into_response(),
        // Timed out, or the sink was dropped before anything arrived.
        Ok(Err(_)) | Err(_) => StatusCode::NO_CONTENT.into_response(),
    }
}
