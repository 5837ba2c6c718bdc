//! SSE stream creation and event mapping for the Anthropic Messages API.
//!
//! The streaming protocol:
//! 1. `message_start` -- Message object with initial usage
//! 2. Per block: `content_block_start` -> N x `content_block_delta` -> `content_block_stop`
//! 3. `message_delta` -- stop_reason and cumulative usage
//! 4. `message_stop` -- final event
//! 5. `ping` events may appear anywhere (keepalive)
//! 6. `error` events may appear mid-stream

use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use secrecy::{ExposeSecret, SecretString};

use parley_core::llm::provider::EventStream;
use parley_types::llm::{LlmError, StopReason, StreamEvent, Usage};

use super::types::{
    AnthropicDelta, AnthropicRequest, ContentBlockDeltaPayload, ErrorPayload,
    MessageDeltaPayload, MessageStartPayload,
};

/// The Anthropic API version header value.
pub const API_VERSION: &str = "2023-06-01";

/// Map one Anthropic SSE event into zero or more `StreamEvent`s.
pub(crate) fn process_event(event_type: &str, data: &str) -> Result<Vec<StreamEvent>, LlmError> {
    let mut events = Vec::new();

    match event_type {
        "message_start" => {
            let payload: MessageStartPayload = serde_json::from_str(data)
                .map_err(|e| LlmError::Deserialization(format!("message_start: {e}")))?;
            tracing::debug!(
                message_id = %payload.message.id,
                model = %payload.message.model,
                "Anthropic message started"
            );
            if let Some(usage) = payload.message.usage {
                events.push(StreamEvent::Usage(Usage {
                    input_tokens: usage.input_tokens.unwrap_or(0),
                    output_tokens: usage.output_tokens,
                }));
            }
        }

        "content_block_delta" => {
            let payload: ContentBlockDeltaPayload = serde_json::from_str(data)
                .map_err(|e| LlmError::Deserialization(format!("content_block_delta: {e}")))?;
            match payload.delta {
                AnthropicDelta::TextDelta { text } => events.push(StreamEvent::TextDelta { text }),
                AnthropicDelta::Other => {
                    tracing::debug!(index = payload.index, "Skipping non-text delta");
                }
            }
        }

        "message_delta" => {
            let payload: MessageDeltaPayload = serde_json::from_str(data)
                .map_err(|e| LlmError::Deserialization(format!("message_delta: {e}")))?;
            let stop_reason = payload
                .delta
                .stop_reason
                .as_deref()
                .and_then(|s| s.parse::<StopReason>().ok())
                .unwrap_or(StopReason::EndTurn);
            events.push(StreamEvent::Usage(Usage {
                input_tokens: payload.usage.input_tokens.unwrap_or(0),
                output_tokens: payload.usage.output_tokens,
            }));
            events.push(StreamEvent::MessageDelta { stop_reason });
        }

        "message_stop" => {
            events.push(StreamEvent::Done);
        }

        "ping" | "content_block_start" | "content_block_stop" => {}

        "error" => {
            let payload: ErrorPayload = serde_json::from_str(data)
                .map_err(|e| LlmError::Deserialization(format!("error event: {e}")))?;
            return Err(map_api_error(&payload.error.error_type, payload.error.message));
        }

        unknown => {
            tracing::warn!(event_type = unknown, "unknown Anthropic event type, skipping");
        }
    }

    Ok(events)
}

/// Map an Anthropic error type string to an `LlmError`.
pub(crate) fn map_api_error(error_type: &str, message: String) -> LlmError {
    match error_type {
        "overloaded_error" => LlmError::Overloaded(message),
        "rate_limit_error" => LlmError::RateLimited {
            retry_after_ms: None,
        },
        "authentication_error" | "permission_error" => LlmError::AuthenticationFailed,
        "invalid_request_error" => LlmError::InvalidRequest(message),
        _ => LlmError::Provider { message },
    }
}

/// Map a non-2xx HTTP response to an `LlmError`.
pub(crate) fn map_http_error(status: u16, retry_after: Option<u64>, body: String) -> LlmError {
    let message = serde_json::from_str::<ErrorPayload>(&body)
        .map(|p| p.error.message)
        .unwrap_or(body);

    match status {
        401 | 403 => LlmError::AuthenticationFailed,
        400 => LlmError::InvalidRequest(message),
        429 => LlmError::RateLimited {
            retry_after_ms: retry_after.map(|secs| secs * 1000),
        },
        529 => LlmError::Overloaded(message),
        _ => LlmError::Provider {
            message: format!("HTTP {status}: {message}"),
        },
    }
}

/// Pass a 2xx response through; map anything else to an `LlmError`.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, LlmError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let retry_after = response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    let error_body = response.text().await.unwrap_or_default();
    tracing::warn!(status = %status, body = %error_body, "Anthropic stream API error response");
    Err(map_http_error(status.as_u16(), retry_after, error_body))
}

/// Create a streaming SSE connection to the Anthropic Messages API.
///
/// Returns a stream of [`StreamEvent`]s that maps Anthropic-specific SSE
/// events to the provider-agnostic stream event enum. The stream ends after
/// `Done`, or after the first `Err`. A body that closes before
/// `message_stop` yields `LlmError::Stream`.
pub fn create_anthropic_stream(
    client: &reqwest::Client,
    url: &str,
    body: AnthropicRequest,
    api_key: &SecretString,
) -> EventStream {
    let client = client.clone();
    let url = url.to_string();
    let api_key = SecretString::from(api_key.expose_secret().to_string());

    Box::pin(async_stream::try_stream! {
        let response = client
            .post(&url)
            .header("x-api-key", api_key.expose_secret())
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Provider {
                message: format!("HTTP request failed: {e}"),
            })?;

        let response = check_status(response).await?;

        yield StreamEvent::Connected;

        let mut events = response.bytes_stream().eventsource();
        let mut finished = false;

        while let Some(event) = events.next().await {
            let event = event.map_err(|e| LlmError::Stream(format!("response body read: {e}")))?;
            for mapped in process_event(&event.event, &event.data)? {
                finished |= matches!(mapped, StreamEvent::Done);
                yield mapped;
            }
            if finished {
                break;
            }
        }

        if !finished {
            Err(LlmError::Stream("stream ended before message_stop".to_string()))?;
        }
    })
}
