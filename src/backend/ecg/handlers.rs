/**
 * ECG Handlers
 *
 * Request/response endpoints over the reading source. The push endpoints
 * (SSE, WebSocket, long-poll) live in `realtime`.
 *
 * # Endpoints
 *
 * - `GET /ecg` - most recent reading as JSON, `404` when there is none
 * - `GET /ecg?format=csv` - the same reading as a CSV download
 * - `GET /health` - relay and source status
 */

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};

use crate::backend::auth::handlers::types::MessageResponse;
use crate::backend::ecg::csv::to_csv;
use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;

pub const NO_DATA_MESSAGE: &str = "No ECG data found";

/// Export format of `GET /ecg`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

#[derive(Debug, Default, Deserialize)]
pub struct LatestQuery {
    #[serde(default)]
    pub format: ExportFormat,
}

/// Latest reading handler (GET /ecg)
///
/// # Example Response
///
/// ```json
/// {"timestamp": 1718000000, "value": 72}
/// ```
pub async fn get_latest(
    State(state): State<AppState>,
    Query(query): Query<LatestQuery>,
) -> Result<Response, BackendError> {
    let latest = state.source.latest().await.map_err(|e| {
        tracing::error!("[ECG] Latest reading query failed: {}", e);
        BackendError::from(e)
    })?;

    let Some(reading) = latest else {
        tracing::debug!("[ECG] No reading stored yet");
        return Ok((StatusCode::NOT_FOUND, Json(MessageResponse::new(NO_DATA_MESSAGE))).into_response());
    };

    match query.format {
        ExportFormat::Json => Ok(Json(reading).into_response()),
        ExportFormat::Csv => {
            let disposition = format!("attachment; filename=\"ecg-{}.csv\"", reading.timestamp);
            Ok((
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                to_csv(std::slice::from_ref(&reading)),
            )
                .into_response())
        }
    }
}

/// Health report
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub source: String,
    /// Connected push clients
    pub sinks: usize,
}

/// Health handler (GET /health)
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        source: state.source.name().to_string(),
        sinks: state.relay.len(),
    })
}
