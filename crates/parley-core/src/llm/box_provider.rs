//! BoxLlmProvider -- dynamic dispatch wrapper for LlmProvider.
//!
//! Lets the backend be chosen at runtime from configuration while the
//! chat engine stays generic over `P: LlmProvider`.

use parley_types::llm::CompletionRequest;

use super::provider::{EventStream, LlmProvider};

/// Type-erased model provider for runtime backend selection.
pub struct BoxLlmProvider {
    inner: Box<dyn LlmProvider>,
}

impl BoxLlmProvider {
    /// Wrap a concrete `LlmProvider` in a type-erased box.
    pub fn new<T: LlmProvider + 'static>(provider: T) -> Self {
        Self {
            inner: Box::new(provider),
        }
    }
}

impl LlmProvider for BoxLlmProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn stream(&self, request: CompletionRequest) -> EventStream {
        self.inner.stream(request)
    }
}

impl std::fmt::Debug for BoxLlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxLlmProvider")
            .field("name", &self.inner.name())
            .finish()
    }
}
