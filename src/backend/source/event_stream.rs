/**
 * Server-Sent Event Decoder
 *
 * The Realtime Database REST API streams changes as `text/event-stream`.
 * This decoder turns the raw byte chunks of that response into events.
 *
 * Chunks can split an event (or a UTF-8 sequence) anywhere, so bytes are
 * buffered until a blank line terminates the event. An event that grows past
 * the size limit without terminating fails the stream as malformed.
 */

use super::SourceError;

/// Largest event accepted before the stream is treated as malformed
pub const MAX_EVENT_BYTES: usize = 4 * 1024 * 1024;

/// One decoded server-sent event
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServerEvent {
    /// Value of the `event:` field (`message` when absent)
    pub event: String,
    /// Concatenated `data:` lines
    pub data: String,
}

/// Incremental event-stream decoder
#[derive(Debug)]
pub struct EventStreamDecoder {
    buffer: Vec<u8>,
    limit: usize,
}

impl Default for EventStreamDecoder {
    fn default() -> Self {
        Self::with_limit(MAX_EVENT_BYTES)
    }
}

impl EventStreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decoder that rejects events larger than `limit` bytes
    pub fn with_limit(limit: usize) -> Self {
        Self {
            buffer: Vec::new(),
            limit,
        }
    }

    /// Feed a chunk and return every event it completes
    ///
    /// Fails once the unterminated remainder exceeds the size limit.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<ServerEvent>, SourceError> {
        self.buffer.extend(chunk.iter().copied().filter(|b| *b != b'\r'));

        let mut events = Vec::new();
        while let Some(end) = find_blank_line(&self.buffer) {
            let block: Vec<u8> = self.buffer.drain(..end + 2).collect();
            if let Some(event) = parse_block(&block[..end]) {
                events.push(event);
            }
        }
        if self.buffer.len() > self.limit {
            let size = self.buffer.len();
            self.buffer.clear();
            return Err(SourceError::Malformed(format!(
                "stream event exceeds {} bytes ({} buffered)",
                self.limit, size
            )));
        }
        Ok(events)
    }
}

fn find_blank_line(buffer: &[u8]) -> Option<usize> {
    buffer.windows(2).position(|w| w == b"\n\n")
}

fn parse_block(block: &[u8]) -> Option<ServerEvent> {
    let text = String::from_utf8_lossy(block);
    let mut event = None;
    let mut data: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => event = Some(value.to_string()),
            "data" => data.push(value),
            _ => {}
        }
    }

    if event.is_none() && data.is_empty() {
        return None;
    }
    Some(ServerEvent {
        event: event.unwrap_or_else(|| "message".to_string()),
        data: data.join("\n"),
    })
}
