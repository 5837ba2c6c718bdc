//! SessionStore trait definition.
//!
//! Provides CRUD operations for chat sessions and their append-only message
//! logs. Uses the RPITIT pattern so implementations stay free of boxing.

use parley_types::chat::{ChatMessage, ChatSession};
use parley_types::error::RepositoryError;

/// Repository trait for chat session and message persistence.
///
/// Implementations live in parley-infra (e.g., `SqliteSessionStore`).
/// Sessions returned by every method carry their full message log in
/// chronological order.
pub trait SessionStore: Send + Sync {
    /// Get a session by its unique ID, with messages.
    fn get_session(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<ChatSession>, RepositoryError>> + Send;

    /// Append a message to a session and update its `last_message` /
    /// `last_message_time` mirror.
    ///
    /// Returns `RepositoryError::NotFound` when the session does not exist.
    fn append_message(
        &self,
        session_id: &str,
        message: &ChatMessage,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Create a new session seeded with the welcome message.
    fn create_session(
        &self,
    ) -> impl std::future::Future<Output = Result<ChatSession, RepositoryError>> + Send;

    /// Create the well-known default session if it does not exist yet.
    fn ensure_default_session(
        &self,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete a session and its messages.
    fn delete_session(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// List all sessions, most recently active first.
    fn list_sessions(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<ChatSession>, RepositoryError>> + Send;

    /// Case-insensitive substring search over title and last message,
    /// most recently active first. A blank query lists every session.
    fn search_sessions(
        &self,
        query: &str,
    ) -> impl std::future::Future<Output = Result<Vec<ChatSession>, RepositoryError>> + Send;
}

/// Normalize a search query: lowercase and trimmed, `None` when blank.
pub fn normalize_query(query: &str) -> Option<String> {
    let normalized = query.trim().to_lowercase();
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}
