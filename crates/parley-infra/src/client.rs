//! HTTP client for a running Parley server's chat endpoint.
//!
//! Posts a chat turn to `/api/chat` and decodes the event-stream reply with
//! the transport codec from `parley-core`.

use std::pin::Pin;
use std::time::Duration;

use futures_util::Stream;
use serde::{Deserialize, Serialize};

use parley_core::transport::{TransportEvent, collect_response_with, decode_stream};
use parley_types::error::TransportError;

/// Decoded events of one chat reply.
pub type ChatEventStream =
    Pin<Box<dyn Stream<Item = Result<TransportEvent, TransportError>> + Send>>;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatBody<'a> {
    message: &'a str,
    session_id: &'a str,
}

#[derive(Deserialize)]
struct ErrorBody {
    errors: Vec<ErrorEntry>,
}

#[derive(Deserialize)]
struct ErrorEntry {
    message: String,
}

/// Client for the chat streaming endpoint.
#[derive(Clone)]
pub struct HttpChatClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpChatClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| TransportError::Io(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Start a chat turn and return its decoded event stream.
    ///
    /// A non-2xx response fails with `TransportError::Remote` carrying the
    /// server's error message.
    pub async fn chat_stream(
        &self,
        message: &str,
        session_id: &str,
    ) -> Result<ChatEventStream, TransportError> {
        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .header("accept", "text/event-stream")
            .json(&ChatBody {
                message,
                session_id,
            })
            .send()
            .await
            .map_err(|e| TransportError::Io(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.errors.into_iter().next())
                .map(|e| e.message)
                .unwrap_or_else(|| format!("HTTP {status}"));
            return Err(TransportError::Remote(message));
        }

        Ok(Box::pin(decode_stream(response.bytes_stream())))
    }

    /// Run a chat turn to completion, calling `on_chunk` as text arrives.
    pub async fn chat<F>(
        &self,
        message: &str,
        session_id: &str,
        on_chunk: F,
    ) -> Result<String, TransportError>
    where
        F: FnMut(&str),
    {
        let events = self.chat_stream(message, session_id).await?;
        collect_response_with(events, on_chunk).await
    }
}
