//! Chat service for session lifecycle operations.
//!
//! ChatService wraps a `SessionStore` for the HTTP and CLI callers, turning
//! an absent session into `ChatError::NotFound` so every caller reports it
//! the same way.

use std::sync::Arc;

use parley_types::chat::ChatSession;
use parley_types::error::{ChatError, RepositoryError};
use tracing::info;

use crate::chat::repository::SessionStore;

/// Session CRUD facade over a `SessionStore`.
///
/// Generic over the store to keep parley-core free of infra dependencies.
pub struct ChatService<S: SessionStore> {
    store: Arc<S>,
}

impl<S: SessionStore> Clone for ChatService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: SessionStore> ChatService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Access the underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Get a session with its messages.
    pub async fn get_session(&self, session_id: &str) -> Result<ChatSession, ChatError> {
        self.store
            .get_session(session_id)
            .await?
            .ok_or_else(|| ChatError::NotFound(session_id.to_string()))
    }

    /// Create a new session seeded with the welcome message.
    pub async fn create_session(&self) -> Result<ChatSession, ChatError> {
        let session = self.store.create_session().await?;
        info!(session_id = %session.id, "Session created");
        Ok(session)
    }

    /// Delete a session and all of its messages.
    pub async fn delete_session(&self, session_id: &str) -> Result<(), ChatError> {
        match self.store.delete_session(session_id).await {
            Ok(()) => {
                info!(session_id = %session_id, "Session deleted");
                Ok(())
            }
            Err(RepositoryError::NotFound) => Err(ChatError::NotFound(session_id.to_string())),
            Err(err) => Err(err.into()),
        }
    }

    /// All sessions, most recently active first.
    pub async fn list_sessions(&self) -> Result<Vec<ChatSession>, ChatError> {
        Ok(self.store.list_sessions().await?)
    }

    /// Sessions whose title or last message contain `query`.
    pub async fn search_sessions(&self, query: &str) -> Result<Vec<ChatSession>, ChatError> {
        Ok(self.store.search_sessions(query).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::fakes::FakeStore;
    use parley_types::chat::{ChatMessage, MessageRole};

    fn service(store: FakeStore) -> ChatService<FakeStore> {
        ChatService::new(Arc::new(store))
    }

    #[tokio::test]
    async fn test_get_missing_session_is_not_found() {
        let svc = service(FakeStore::default());
        let err = svc.get_session("nope").await.unwrap_err();
        assert!(matches!(err, ChatError::NotFound(id) if id == "nope"));
    }

    #[tokio::test]
    async fn test_delete_missing_session_is_not_found() {
        let svc = service(FakeStore::default());
        let err = svc.delete_session("nope").await.unwrap_err();
        assert!(matches!(err, ChatError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let svc = service(FakeStore::default());
        let created = svc.create_session().await.unwrap();
        let fetched = svc.get_session(&created.id).await.unwrap();
        assert_eq!(created, fetched);
    }

    #[tokio::test]
    async fn test_blank_search_equals_list() {
        let svc = service(FakeStore::default());
        svc.create_session().await.unwrap();
        svc.create_session().await.unwrap();

        let listed = svc.list_sessions().await.unwrap();
        let searched = svc.search_sessions("   ").await.unwrap();
        assert_eq!(listed, searched);
    }

    #[tokio::test]
    async fn test_search_matches_last_message() {
        let store = FakeStore::with_session("s1");
        store
            .append_message(
                "s1",
                &ChatMessage::new(MessageRole::User, "Tell me about Tokio", 10),
            )
            .await
            .unwrap();
        let svc = service(store);
        svc.create_session().await.unwrap();

        let found = svc.search_sessions("TOKIO").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "s1");
    }
}
