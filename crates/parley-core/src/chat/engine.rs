//! Streaming chat engine: one chat turn from user message to persisted reply.
//!
//! `chat` does the synchronous part of a turn (session lookup, user-message
//! persistence, truncation) before returning, so a missing session or a
//! failed write surfaces as the call's error. The model call itself runs in a
//! spawned producer task that re-chunks text deltas onto a bounded channel
//! and persists the assistant reply once the model finishes.

use std::sync::Arc;
use std::time::Instant;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::field::Empty;
use tracing::{Instrument, Span, debug, error, info, info_span, warn};

use parley_types::chat::{ChatMessage, MessageRole};
use parley_types::config::ChatConfig;
use parley_types::error::ChatError;
use parley_types::llm::{CompletionRequest, Message, StreamEvent, Usage};

use crate::chat::chunker::split_chunks;
use crate::chat::now_millis;
use crate::chat::repository::SessionStore;
use crate::llm::provider::{EventStream, LlmProvider};
use crate::llm::token_budget::TokenBudget;

/// Ordered chunks of one assistant reply.
///
/// Ends after the last chunk on success, or after a single `Err` on failure.
pub type ChunkStream = ReceiverStream<Result<String, ChatError>>;

/// Runs chat turns against a session store and a model provider.
///
/// Holds no per-session state; every call reloads the session.
pub struct StreamingChatEngine<S, P> {
    store: Arc<S>,
    provider: Arc<P>,
    config: ChatConfig,
    budget: TokenBudget,
    model: String,
}

impl<S, P> StreamingChatEngine<S, P>
where
    S: SessionStore + 'static,
    P: LlmProvider + 'static,
{
    pub fn new(store: Arc<S>, provider: Arc<P>, config: ChatConfig, model: impl Into<String>) -> Self {
        let budget = TokenBudget::from_config(&config);
        Self {
            store,
            provider,
            config,
            budget,
            model: model.into(),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Start a chat turn.
    ///
    /// Errors returned here happen before any chunk is produced:
    /// `NotFound` when the session does not exist, `StoreFailure` when the
    /// user message cannot be persisted. Failures after streaming has begun
    /// arrive as the final item of the returned stream.
    pub async fn chat(&self, message: &str, session_id: &str) -> Result<ChunkStream, ChatError> {
        let session = self
            .store
            .get_session(session_id)
            .await?
            .ok_or_else(|| ChatError::NotFound(session_id.to_string()))?;

        let user_message = ChatMessage::new(MessageRole::User, message, now_millis());
        self.store.append_message(session_id, &user_message).await?;

        // The loaded history predates the new message, so it is never a
        // truncation candidate.
        let mut messages = self.budget.truncate(&session.messages);
        messages.push(Message::user(message));

        let request = CompletionRequest {
            model: self.model.clone(),
            messages,
            max_tokens: self.config.max_response_tokens,
            stream: true,
        };

        let span = info_span!(
            "chat",
            gen_ai.operation.name = "chat",
            gen_ai.provider.name = self.provider.name(),
            gen_ai.request.model = %request.model,
            gen_ai.request.max_tokens = request.max_tokens,
            gen_ai.usage.input_tokens = Empty,
            gen_ai.usage.output_tokens = Empty,
            gen_ai.response.finish_reasons = Empty,
            session_id = %session_id,
        );

        debug!(
            parent: &span,
            submitted_messages = request.messages.len(),
            "Submitting conversation to model"
        );

        let upstream = self.provider.stream(request);
        let (tx, rx) = mpsc::channel(self.config.stream_buffer.max(1));

        let producer = Producer {
            store: Arc::clone(&self.store),
            session_id: session_id.to_string(),
            chunk_size: self.config.chunk_size,
            tx,
        };
        tokio::spawn(producer.run(upstream).instrument(span));

        Ok(ReceiverStream::new(rx))
    }
}

/// Background half of a chat turn.
struct Producer<S> {
    store: Arc<S>,
    session_id: String,
    chunk_size: usize,
    tx: mpsc::Sender<Result<String, ChatError>>,
}

impl<S: SessionStore> Producer<S> {
    async fn run(self, mut upstream: EventStream) {
        let started = Instant::now();
        let mut reply = String::new();
        let mut usage = Usage::default();

        loop {
            let event = tokio::select! {
                _ = self.tx.closed() => {
                    info!("Consumer went away; abandoning response");
                    return;
                }
                event = upstream.next() => event,
            };

            match event {
                Some(Ok(StreamEvent::TextDelta { text })) => {
                    for chunk in split_chunks(&text, self.chunk_size) {
                        if self.tx.send(Ok(chunk.to_string())).await.is_err() {
                            info!("Consumer went away; abandoning response");
                            return;
                        }
                    }
                    reply.push_str(&text);
                }
                Some(Ok(StreamEvent::Usage(update))) => {
                    usage.absorb(&update);
                    let span = Span::current();
                    span.record("gen_ai.usage.input_tokens", usage.input_tokens);
                    span.record("gen_ai.usage.output_tokens", usage.output_tokens);
                }
                Some(Ok(StreamEvent::MessageDelta { stop_reason })) => {
                    Span::current().record(
                        "gen_ai.response.finish_reasons",
                        stop_reason.to_string().as_str(),
                    );
                }
                Some(Ok(StreamEvent::Connected)) => {
                    debug!("Model stream connected");
                }
                Some(Ok(StreamEvent::Done)) | None => break,
                Some(Err(err)) => {
                    warn!(error = %err, partial_chars = reply.len(), "Model stream failed");
                    let _ = self.tx.send(Err(ChatError::UpstreamFailure(err))).await;
                    return;
                }
            }
        }

        // Release the upstream connection before touching the store.
        drop(upstream);

        let assistant = ChatMessage::new(MessageRole::Assistant, reply, now_millis());
        if let Err(err) = self.store.append_message(&self.session_id, &assistant).await {
            error!(error = %err, "Failed to persist assistant reply");
            let _ = self.tx.send(Err(ChatError::StoreFailure(err))).await;
            return;
        }

        info!(
            response_chars = assistant.content.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Chat turn complete"
        );
    }
}
