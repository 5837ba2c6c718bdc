//! LlmProvider trait definition.
//!
//! The abstraction every model backend implements. Only streaming is
//! modelled: a chat turn always consumes the reply incrementally.

use std::pin::Pin;

use futures_util::Stream;

use parley_types::llm::{CompletionRequest, LlmError, StreamEvent};

/// Boxed stream of provider events.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send + 'static>>;

/// Trait for model backends (Anthropic, the mock, test fakes).
///
/// `stream` returns a boxed stream so the trait stays object-safe for
/// [`BoxLlmProvider`](super::box_provider::BoxLlmProvider).
///
/// Implementations live in parley-infra (e.g., `AnthropicProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "anthropic", "mock").
    fn name(&self) -> &str;

    /// Send a streaming completion request. Returns a stream of events.
    ///
    /// A well-behaved stream yields zero or more `TextDelta`s and ends with
    /// `Done`, or yields an `Err` and stops.
    fn stream(&self, request: CompletionRequest) -> EventStream;
}
