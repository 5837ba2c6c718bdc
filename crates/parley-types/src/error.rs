use thiserror::Error;

use crate::llm::LlmError;

/// Errors from session store operations (used by trait definitions in parley-core).
#[derive(Debug, Clone, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,
}

/// Errors surfaced by a chat turn or a session operation.
///
/// `Validation` is raised by the HTTP boundary before any core logic runs;
/// the engine itself produces the other three.
#[derive(Debug, Clone, Error)]
pub enum ChatError {
    #[error("session '{0}' not found")]
    NotFound(String),

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("upstream model failure: {0}")]
    UpstreamFailure(#[from] LlmError),

    #[error("store failure: {0}")]
    StoreFailure(#[from] RepositoryError),
}

/// Errors raised while consuming a chat event stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The producer reported a failure via an `error` event.
    #[error("{0}")]
    Remote(String),

    #[error("malformed event: {0}")]
    Decode(String),

    #[error("stream ended before the terminator event")]
    Truncated,

    #[error("transport i/o error: {0}")]
    Io(String),
}
