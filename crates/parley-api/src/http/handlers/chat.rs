//! SSE streaming chat endpoint.
//!
//! POST /api/chat
//!
//! Runs one chat turn through the streaming engine and relays its chunks as
//! Server-Sent Events:
//!
//! ```text
//! data: {"chunk":"..."}
//! data: [DONE]
//! ```
//!
//! A failure mid-stream replaces `[DONE]` with `data: {"error":"..."}`.
//! Request validation and unknown sessions are answered with a JSON error
//! before the stream opens.

use std::convert::Infallible;
use std::time::Duration;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::StreamExt;
use serde::Deserialize;
use tokio_stream::Stream;

use parley_core::transport::encode_chunks;

use crate::http::error::AppError;
use crate::state::ApiState;

/// Request body for the streaming chat endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// The user message to send.
    pub message: String,
    /// Session the turn belongs to.
    pub session_id: String,
}

impl ChatRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self.message.trim().is_empty() {
            return Err(AppError::Validation("message must not be empty".to_string()));
        }
        if self.session_id.trim().is_empty() {
            return Err(AppError::Validation("sessionId must not be empty".to_string()));
        }
        Ok(())
    }
}

/// POST /api/chat - SSE streaming chat.
pub async fn stream_chat(
    State(state): State<ApiState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let Json(body) = body.map_err(|rejection| AppError::Validation(rejection.body_text()))?;
    body.validate()?;

    let chunks = state.engine.chat(&body.message, &body.session_id).await?;

    let events = encode_chunks(chunks)
        .map(|event| Ok::<_, Infallible>(Event::default().data(event.to_data())));

    Ok(Sse::new(events).keep_alive(KeepAlive::new().interval(Duration::from_secs(15))))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use parley_core::transport::{TransportEvent, collect_response, decode_data};
    use parley_infra::llm::mock::MockLlmProvider;
    use parley_types::llm::MessageRole;

    use crate::http::test_support::{TestApp, post_json};

    /// Data payloads of an SSE body, in order.
    fn data_lines(body: &str) -> Vec<&str> {
        body.lines()
            .filter_map(|line| line.strip_prefix("data: "))
            .collect()
    }

    #[tokio::test]
    async fn test_chat_streams_reply_and_persists_turn() {
        let app = TestApp::new().await;
        let (status, body) = app
            .text(post_json(
                "/api/chat",
                r#"{"message":"hello there","sessionId":"default"}"#,
            ))
            .await;
        assert_eq!(status, StatusCode::OK);

        let events: Vec<TransportEvent> = data_lines(&body)
            .into_iter()
            .map(|data| decode_data(data).unwrap())
            .collect();
        assert_eq!(events.last(), Some(&TransportEvent::Done));
        assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);

        let reply = collect_response(futures_util::stream::iter(events.into_iter().map(Ok)))
            .await
            .unwrap();
        assert_eq!(reply, MockLlmProvider::reply_for(0, "hello there"));

        let session = app.state.chat_service.get_session("default").await.unwrap();
        assert_eq!(session.messages.len(), 3);
        assert_eq!(session.messages[1].role, MessageRole::User);
        assert_eq!(session.messages[1].content, "hello there");
        assert_eq!(session.messages[2].role, MessageRole::Assistant);
        assert_eq!(session.messages[2].content, reply);
        assert_eq!(session.last_message, reply);
    }

    #[tokio::test]
    async fn test_chat_chunks_are_bounded_by_chunk_size() {
        let app = TestApp::new().await;
        let (_, body) = app
            .text(post_json(
                "/api/chat",
                r#"{"message":"a fairly long message to make the reply exceed one chunk","sessionId":"default"}"#,
            ))
            .await;

        for data in data_lines(&body) {
            if let Ok(TransportEvent::Chunk(text)) = decode_data(data) {
                assert!(text.chars().count() <= 50);
            }
        }
    }

    #[tokio::test]
    async fn test_chat_unknown_session_is_404_before_streaming() {
        let app = TestApp::new().await;
        let (status, body) = app
            .json(post_json(
                "/api/chat",
                r#"{"message":"hi","sessionId":"does-not-exist"}"#,
            ))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["errors"][0]["code"], "SESSION_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_chat_malformed_body_is_400() {
        let app = TestApp::new().await;

        for payload in [
            "not json",
            r#"{"message":"hi"}"#,
            r#"{"message":42,"sessionId":"default"}"#,
            r#"{"message":"   ","sessionId":"default"}"#,
            r#"{"message":"hi","sessionId":""}"#,
        ] {
            let (status, body) = app.json(post_json("/api/chat", payload)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "payload: {payload}");
            assert_eq!(body["errors"][0]["code"], "VALIDATION_ERROR");
        }

        // Nothing was appended to the session.
        let session = app.state.chat_service.get_session("default").await.unwrap();
        assert_eq!(session.messages.len(), 1);
    }
}
