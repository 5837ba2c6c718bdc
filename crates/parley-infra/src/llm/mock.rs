//! Offline model backend that streams canned replies.
//!
//! Useful for front-end development and demos without an API key. The
//! reply echoes the newest user message after one of a few rotating
//! starter phrases, delivered in small fragments with a short delay to
//! mimic a real token stream.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parley_core::llm::provider::{EventStream, LlmProvider};
use parley_types::llm::{CompletionRequest, LlmError, MessageRole, StopReason, StreamEvent};

const STARTERS: [&str; 5] = [
    "I understand your question. Based on the context, ",
    "Let me analyze that for you. ",
    "That's an interesting question. Here's what I think: ",
    "I can help you with that. ",
    "From my analysis, ",
];

/// Characters per emitted fragment.
const FRAGMENT_CHARS: usize = 3;

/// Pause between fragments.
const FRAGMENT_DELAY: Duration = Duration::from_millis(10);

/// Canned-response provider.
#[derive(Debug, Default)]
pub struct MockLlmProvider {
    turn: AtomicUsize,
    delay: Option<Duration>,
}

impl MockLlmProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the pause between fragments (zero disables it).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// The full reply for `message` on the given turn.
    pub fn reply_for(turn: usize, message: &str) -> String {
        let starter = STARTERS[turn % STARTERS.len()];
        format!("{starter}Your message was \"{message}\"...")
    }
}

impl LlmProvider for MockLlmProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn stream(&self, request: CompletionRequest) -> EventStream {
        let turn = self.turn.fetch_add(1, Ordering::Relaxed);
        let message = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.clone())
            .unwrap_or_default();
        let reply = Self::reply_for(turn, &message);
        let delay = self.delay.unwrap_or(FRAGMENT_DELAY);

        Box::pin(async_stream::stream! {
            yield Ok::<_, LlmError>(StreamEvent::Connected);

            let chars: Vec<char> = reply.chars().collect();
            for fragment in chars.chunks(FRAGMENT_CHARS) {
                yield Ok(StreamEvent::TextDelta {
                    text: fragment.iter().collect(),
                });
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }

            yield Ok(StreamEvent::MessageDelta {
                stop_reason: StopReason::EndTurn,
            });
            yield Ok(StreamEvent::Done);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use parley_types::llm::Message;

    fn request(message: &str) -> CompletionRequest {
        CompletionRequest {
            model: "mock".to_string(),
            messages: vec![Message::assistant("Welcome!"), Message::user(message)],
            max_tokens: 100,
            stream: true,
        }
    }

    async fn collect(provider: &MockLlmProvider, message: &str) -> (Vec<String>, bool) {
        let events: Vec<Result<StreamEvent, LlmError>> =
            provider.stream(request(message)).collect().await;
        let done = matches!(events.last(), Some(Ok(StreamEvent::Done)));
        let fragments = events
            .into_iter()
            .filter_map(|e| match e {
                Ok(StreamEvent::TextDelta { text }) => Some(text),
                _ => None,
            })
            .collect();
        (fragments, done)
    }

    #[tokio::test]
    async fn test_reply_echoes_message() {
        let provider = MockLlmProvider::new().with_delay(Duration::ZERO);
        let (fragments, done) = collect(&provider, "What is Rust?").await;

        assert!(done);
        let reply = fragments.concat();
        assert_eq!(reply, MockLlmProvider::reply_for(0, "What is Rust?"));
        assert!(reply.ends_with("Your message was \"What is Rust?\"..."));
    }

    #[tokio::test]
    async fn test_fragments_are_three_chars() {
        let provider = MockLlmProvider::new().with_delay(Duration::ZERO);
        let (fragments, _) = collect(&provider, "héllo ✓").await;

        let (last, rest) = fragments.split_last().unwrap();
        assert!(rest.iter().all(|f| f.chars().count() == 3));
        assert!(last.chars().count() <= 3);
    }

    #[tokio::test]
    async fn test_starters_rotate() {
        let provider = MockLlmProvider::new().with_delay(Duration::ZERO);
        let (first, _) = collect(&provider, "hi").await;
        let (second, _) = collect(&provider, "hi").await;
        assert_ne!(first.concat(), second.concat());
        assert_eq!(second.concat(), MockLlmProvider::reply_for(1, "hi"));
    }
}
