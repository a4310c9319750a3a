/**
 * Reading WebSocket Handler
 *
 * `GET /ecg/ws` upgrades to a WebSocket and pushes one text frame per
 * reading. The connection is receive-only from the client's point of view:
 * inbound text and binary messages are ignored, pings are answered by the
 * protocol layer.
 *
 * The sink is deregistered when the loop exits, which happens on a client
 * close, a socket error, a failed write, or the relay dropping the sink.
 */

use axum::{
    extract::{
        ws::{Message, Utf8Bytes, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};

use crate::backend::realtime::broadcast::EventRelay;
use crate::backend::realtime::sink::ChannelSink;

/// Handle WebSocket upgrade (GET /ecg/ws)
pub async fn handle_reading_socket(ws: WebSocketUpgrade, State(relay): State<EventRelay>) -> Response {
    ws.on_upgrade(move |socket| serve_socket(socket, relay))
}

async fn serve_socket(socket: WebSocket, relay: EventRelay) {
    let (sink, mut frames) = ChannelSink::channel();
    let guard = relay.register_guarded(sink);
    let id = guard.handle().id();
    tracing::info!("[Relay] WebSocket client {} connected ({} active)", id, relay.len());

    let (mut outgoing, mut incoming) = socket.split();

    loop {
        tokio::select! {
            frame = frames.recv() => match frame {
                Some(frame) => {
                    if let Err(e) = outgoing.send(Message::Text(Utf8Bytes::from(&*frame))).await {
                        tracing::debug!("[Relay] WebSocket client {} write failed: {}", id, e);
                        break;
                    }
                }
                None => break,
            },
            message = incoming.next() => match message {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!("[Relay] WebSocket client {} read failed: {}", id, e);
                    break;
                }
            },
        }
    }

    drop(guard);
    tracing::info!("[Relay] WebSocket client {} disconnected", id);
}
