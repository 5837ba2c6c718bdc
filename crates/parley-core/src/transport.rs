//! Chat event wire format.
//!
//! A chat reply travels as server-sent events, one `data:` line per event:
//!
//! ```text
//! data: {"chunk":"Hello"}
//! data: {"chunk":", world"}
//! data: [DONE]
//! ```
//!
//! A failure replaces the terminator with `data: {"error":"..."}`. Exactly
//! one terminator (`[DONE]` or an error) ends every well-formed stream.

use std::fmt;
use std::pin::pin;

use eventsource_stream::Eventsource;
use futures_util::{Stream, StreamExt};
use serde::Deserialize;
use tracing::warn;

use parley_types::error::{ChatError, TransportError};

/// Payload of the terminator event.
pub const DONE_SENTINEL: &str = "[DONE]";

/// One event on the chat wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Chunk(String),
    Error(String),
    Done,
}

#[derive(Deserialize)]
struct Payload {
    chunk: Option<String>,
    error: Option<String>,
}

impl TransportEvent {
    /// Render the `data:` payload of this event.
    pub fn to_data(&self) -> String {
        match self {
            TransportEvent::Chunk(text) => serde_json::json!({ "chunk": text }).to_string(),
            TransportEvent::Error(message) => serde_json::json!({ "error": message }).to_string(),
            TransportEvent::Done => DONE_SENTINEL.to_string(),
        }
    }

    /// Render a complete SSE frame.
    pub fn to_frame(&self) -> String {
        format!("data: {}\n\n", self.to_data())
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransportEvent::Chunk(_))
    }
}

impl fmt::Display for TransportEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_data())
    }
}

/// Turn an engine chunk stream into wire events.
///
/// The result ends with exactly one `Done`, or with one `Error` in its
/// place when the chunk stream fails. Nothing follows the terminator.
pub fn encode_chunks<S>(chunks: S) -> impl Stream<Item = TransportEvent> + Send
where
    S: Stream<Item = Result<String, ChatError>> + Send + 'static,
{
    async_stream::stream! {
        let mut chunks = Box::pin(chunks);
        while let Some(item) = chunks.next().await {
            match item {
                Ok(text) => yield TransportEvent::Chunk(text),
                Err(err) => {
                    warn!(error = %err, "Chat stream failed");
                    yield TransportEvent::Error(err.to_string());
                    return;
                }
            }
        }
        yield TransportEvent::Done;
    }
}

/// Decode a single `data:` payload.
pub fn decode_data(data: &str) -> Result<TransportEvent, TransportError> {
    let data = data.trim();
    if data == DONE_SENTINEL {
        return Ok(TransportEvent::Done);
    }

    let payload: Payload =
        serde_json::from_str(data).map_err(|e| TransportError::Decode(format!("{e}: {data}")))?;

    match payload {
        Payload {
            error: Some(message),
            ..
        } => Ok(TransportEvent::Error(message)),
        Payload {
            chunk: Some(text), ..
        } => Ok(TransportEvent::Chunk(text)),
        _ => Err(TransportError::Decode(format!(
            "neither chunk nor error: {data}"
        ))),
    }
}

/// Parse a raw SSE byte stream into wire events.
///
/// Payloads that fail to decode surface as `TransportError::Decode` items;
/// byte stream failures surface as `TransportError::Io`.
pub fn decode_stream<S, B, E>(
    bytes: S,
) -> impl Stream<Item = Result<TransportEvent, TransportError>> + Send
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: fmt::Display + Send,
{
    bytes.eventsource().filter_map(|item| async move {
        match item {
            Ok(event) if event.data.is_empty() => None,
            Ok(event) => Some(decode_data(&event.data)),
            Err(err) => Some(Err(TransportError::Io(err.to_string()))),
        }
    })
}

/// Accumulate a reply from wire events.
pub async fn collect_response<S>(events: S) -> Result<String, TransportError>
where
    S: Stream<Item = Result<TransportEvent, TransportError>>,
{
    collect_response_with(events, |_| {}).await
}

/// Like [`collect_response`], calling `on_chunk` as each chunk arrives.
///
/// Stops at the terminator. An `error` event fails with
/// `TransportError::Remote` carrying its message and discards the partial
/// text. Undecodable events are logged and skipped. A stream that ends
/// without a terminator is `TransportError::Truncated`.
pub async fn collect_response_with<S, F>(events: S, mut on_chunk: F) -> Result<String, TransportError>
where
    S: Stream<Item = Result<TransportEvent, TransportError>>,
    F: FnMut(&str),
{
    let mut events = pin!(events);
    let mut text = String::new();

    while let Some(item) = events.next().await {
        match item {
            Ok(TransportEvent::Chunk(chunk)) => {
                on_chunk(&chunk);
                text.push_str(&chunk);
            }
            Ok(TransportEvent::Done) => return Ok(text),
            Ok(TransportEvent::Error(message)) => return Err(TransportError::Remote(message)),
            Err(TransportError::Decode(reason)) => {
                warn!(%reason, "Skipping undecodable chat event");
            }
            Err(err) => return Err(err),
        }
    }

    Err(TransportError::Truncated)
}
