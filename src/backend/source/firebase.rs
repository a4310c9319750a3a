/**
 * Firebase Realtime Database Source
 *
 * This module reads ECG readings from a Firebase Realtime Database through
 * its REST API.
 *
 * # Point Query
 *
 * `GET {db}/{path}.json?orderBy="timestamp"&limitToLast=1` returns an object
 * keyed by push id holding the newest record, or `null` when the collection
 * is empty.
 *
 * # Streaming
 *
 * The same URL requested with `Accept: text/event-stream` stays open and
 * reports changes to the query window:
 *
 * - `put` at path `/` - full snapshot of the window (sent first)
 * - `put` at path `/<key>` - child replaced or added (`null` = removed)
 * - `patch` at path `/` - several children updated at once
 * - `patch` at path `/<key>` - some fields of one child changed (ignored)
 * - `keep-alive` - no-op
 * - `cancel` / `auth_revoked` - the server ends the subscription
 */

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use reqwest::header::ACCEPT;
use serde::Deserialize;
use serde_json::Value;
use std::collections::VecDeque;
use url::Url;

use crate::backend::source::event_stream::{EventStreamDecoder, ServerEvent};
use crate::backend::source::{ReadingSource, ReadingStream, SourceError};
use crate::shared::Reading;

/// Location and credentials of a Realtime Database
///
/// Shared by the reading source and the profile store.
#[derive(Debug, Clone)]
pub struct DatabaseRef {
    client: reqwest::Client,
    base_url: String,
    auth: Option<String>,
}

impl DatabaseRef {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, auth: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth,
        }
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// REST URL of `path`, with the query parameters and credential applied
    pub fn url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, SourceError> {
        let raw = format!("{}/{}.json", self.base_url, path.trim_matches('/'));
        let mut url = Url::parse(&raw).map_err(|e| SourceError::Unavailable(format!("bad database URL {}: {}", raw, e)))?;
        if !query.is_empty() || self.auth.is_some() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
            if let Some(auth) = &self.auth {
                pairs.append_pair("auth", auth);
            }
        }
        Ok(url)
    }
}

/// Payload of `put` and `patch` stream events
#[derive(Debug, Deserialize)]
struct ChangePayload {
    path: String,
    data: Value,
}

/// Reading source backed by a Realtime Database collection
#[derive(Debug, Clone)]
pub struct FirebaseSource {
    database: DatabaseRef,
    path: String,
}

impl FirebaseSource {
    pub fn new(database: DatabaseRef, path: impl Into<String>) -> Self {
        Self {
            database,
            path: path.into(),
        }
    }

    fn latest_url(&self) -> Result<Url, SourceError> {
        self.database
            .url(&self.path, &[("orderBy", "\"timestamp\""), ("limitToLast", "1")])
    }
}

#[async_trait]
impl ReadingSource for FirebaseSource {
    fn name(&self) -> &'static str {
        "firebase"
    }

    async fn latest(&self) -> Result<Option<Reading>, SourceError> {
        let response = self
            .database
            .client()
            .get(self.latest_url()?)
            .send()
            .await?
            .error_for_status()?;
        let snapshot: Value = response
            .json()
            .await
            .map_err(|e| SourceError::Malformed(e.to_string()))?;

        let mut readings = readings_in_snapshot(snapshot)?;
        Ok(readings.pop())
    }

    async fn subscribe(&self) -> Result<ReadingStream, SourceError> {
        let url = self.latest_url()?;
        tracing::info!("[Source] Opening Firebase stream on /{}", self.path.trim_matches('/'));

        let response = self
            .database
            .client()
            .get(url)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?
            .error_for_status()?;

        let state = StreamState {
            body: response.bytes_stream().boxed(),
            decoder: EventStreamDecoder::new(),
            pending: VecDeque::new(),
            done: false,
        };

        let readings = stream::unfold(state, |mut state| async move {
            loop {
                if let Some(reading) = state.pending.pop_front() {
                    return Some((Ok(reading), state));
                }
                if state.done {
                    return None;
                }
                match state.body.next().await {
                    Some(Ok(chunk)) => {
                        let events = match state.decoder.push(&chunk) {
                            Ok(events) => events,
                            Err(e) => {
                                state.done = true;
                                state.pending.clear();
                                return Some((Err(e), state));
                            }
                        };
                        for event in events {
                            match readings_in_event(&event) {
                                Ok(readings) => state.pending.extend(readings),
                                Err(e) => {
                                    state.done = true;
                                    state.pending.clear();
                                    return Some((Err(e), state));
                                }
                            }
                        }
                    }
                    Some(Err(e)) => {
                        state.done = true;
                        return Some((Err(SourceError::from(e)), state));
                    }
                    None => {
                        tracing::info!("[Source] Firebase stream closed by server");
                        return None;
                    }
                }
            }
        });

        Ok(readings.boxed())
    }
}

struct StreamState {
    body: futures_util::stream::BoxStream<'static, reqwest::Result<bytes::Bytes>>,
    decoder: EventStreamDecoder,
    pending: VecDeque<Reading>,
    done: bool,
}

/// Readings carried by one stream event, oldest first
fn readings_in_event(event: &ServerEvent) -> Result<Vec<Reading>, SourceError> {
    match event.event.as_str() {
        "put" | "patch" => {
            let payload: ChangePayload = serde_json::from_str(&event.data)
                .map_err(|e| SourceError::Malformed(format!("bad {} payload: {}", event.event, e)))?;
            if event.event == "patch" && !payload.path.trim_matches('/').is_empty() {
                // Partial update of one child; the record is not complete.
                return Ok(Vec::new());
            }
            Ok(readings_in_change(payload))
        }
        "keep-alive" => Ok(Vec::new()),
        "cancel" => Err(SourceError::Cancelled(event.data.clone())),
        "auth_revoked" => Err(SourceError::AuthRevoked),
        other => {
            tracing::debug!("[Source] Ignoring stream event '{}'", other);
            Ok(Vec::new())
        }
    }
}

fn readings_in_change(payload: ChangePayload) -> Vec<Reading> {
    let path = payload.path.trim_matches('/');
    if path.is_empty() {
        // Snapshot or multi-child patch; malformed data is logged, not fatal.
        return readings_in_snapshot(payload.data).unwrap_or_else(|e| {
            tracing::warn!("[Source] Skipping snapshot: {}", e);
            Vec::new()
        });
    }
    if path.contains('/') || payload.data.is_null() {
        // Field-level update or a child leaving the window.
        return Vec::new();
    }
    match Reading::from_value(payload.data) {
        Ok(reading) => vec![reading],
        Err(e) => {
            tracing::warn!("[Source] Skipping malformed record {}: {}", path, e);
            Vec::new()
        }
    }
}

/// Readings in a collection snapshot, sorted by timestamp
fn readings_in_snapshot(snapshot: Value) -> Result<Vec<Reading>, SourceError> {
    let children = match snapshot {
        Value::Null => return Ok(Vec::new()),
        Value::Object(children) => children,
        // limitToLast over sequential integer keys comes back as an array
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        other => {
            return Err(SourceError::Malformed(format!(
                "expected an object of records, got {}",
                other
            )))
        }
    };

    let mut readings: Vec<Reading> = children
        .into_iter()
        .filter(|(_, value)| !value.is_null())
        .filter_map(|(key, value)| match Reading::from_value(value) {
            Ok(reading) => Some(reading),
            Err(e) => {
                tracing::warn!("[Source] Skipping malformed record {}: {}", key, e);
                None
            }
        })
        .collect();
    readings.sort_by_key(|r| r.timestamp);
    Ok(readings)
}
