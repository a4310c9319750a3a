/**
 * Reading Stream Handler (Server-Sent Events)
 *
 * This module implements the SSE adapter for `GET /ecg/stream` (and its
 * alias `GET /events`). Each connection becomes one relay sink.
 *
 * # Frames
 *
 * ```http
 * HTTP/1.1 200 OK
 * Content-Type: text/event-stream
 *
 * event: open
 * data: stream open
 *
 * data: {"timestamp":1718000000,"value":72}
 *
 * data: {"timestamp":1718000001,"value":74}
 * ```
 *
 * Readings are sent as unnamed events so browsers get them through
 * `EventSource.onmessage`. Keep-alive comments are injected by axum at the
 * configured interval.
 *
 * # Connection Management
 *
 * The `SinkGuard` lives inside the response stream. When the client goes
 * away hyper drops the body, the guard drops with it, and the sink leaves
 * the registry.
 */

use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures_util::stream::{self, Stream, StreamExt};
use tokio::sync::mpsc;

use crate::backend::realtime::broadcast::SinkGuard;
use crate::backend::realtime::sink::{ChannelSink, Frame};
use crate::backend::server::state::AppState;

/// Data of the first event on every stream
pub const OPEN_MESSAGE: &str = "stream open";

/// Handle reading subscription (GET /ecg/stream, GET /events)
pub async fn handle_reading_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (sink, rx) = ChannelSink::channel();
    let guard = state.relay.register_guarded(sink);
    tracing::info!(
        "[Relay] SSE client {} connected ({} active)",
        guard.handle().id(),
        state.relay.len()
    );

    let open = stream::once(async { Ok(Event::default().event("open").data(OPEN_MESSAGE)) });
    let readings = reading_events(rx, guard);

    Sse::new(open.chain(readings)).keep_alive(KeepAlive::new().interval(state.keepalive))
}

fn reading_events(
    rx: mpsc::UnboundedReceiver<Frame>,
    guard: SinkGuard,
) -> impl Stream<Item = Result<Event, Infallible>> {
    stream::unfold((rx, guard), |(mut rx, guard)| async move {
        match rx.recv().await {
            Some(frame) => Some((Ok(Event::default().data(&*frame)), (rx, guard))),
            None => {
                // The relay dropped the sink after a failed send.
                tracing::debug!("[Relay] SSE sink {} closed by relay", guard.handle().id());
                None
            }
        }
    })
}
