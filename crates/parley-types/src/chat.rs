//! Chat session and message types for Parley.
//!
//! A session is an append-only, timestamp-ordered log of user/assistant
//! messages plus a denormalized copy of its most recent message, which the
//! sidebar uses for previews and recency ordering.

use serde::{Deserialize, Serialize};

// Re-export MessageRole from llm module (it's used in both chat and llm contexts).
pub use crate::llm::MessageRole;

/// Title given to every freshly created session.
pub const DEFAULT_SESSION_TITLE: &str = "New Chat";

/// Content of the assistant message that seeds every new session.
pub const WELCOME_MESSAGE: &str = "Welcome! How can I help you today?";

/// Identifier of the session bootstrapped when the store is first opened.
pub const DEFAULT_SESSION_ID: &str = "default";

/// A single persisted message within a chat session.
///
/// Immutable once persisted. `timestamp` is epoch milliseconds; messages
/// with equal timestamps keep their insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: i64,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>, timestamp: i64) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp,
        }
    }
}

/// A chat session with its full message log.
///
/// `last_message` and `last_message_time` always mirror the most recently
/// appended message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub id: String,
    pub title: String,
    pub last_message: String,
    pub last_message_time: i64,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

impl ChatSession {
    /// Build a new session seeded with the welcome message.
    pub fn seeded(id: impl Into<String>, now_ms: i64) -> Self {
        let welcome = ChatMessage::new(MessageRole::Assistant, WELCOME_MESSAGE, now_ms);
        Self {
            id: id.into(),
            title: DEFAULT_SESSION_TITLE.to_string(),
            last_message: welcome.content.clone(),
            last_message_time: welcome.timestamp,
            messages: vec![welcome],
        }
    }

    /// Case-insensitive substring match over title and last message.
    ///
    /// `needle` must already be lowercased and trimmed.
    pub fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.last_message.to_lowercase().contains(needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_session_mirrors_welcome() {
        let session = ChatSession::seeded("abc", 1_700_000_000_000);
        assert_eq!(session.title, "New Chat");
        assert_eq!(session.messages.len(), 1);
        assert_eq!(session.messages[0].role, MessageRole::Assistant);
        assert_eq!(session.last_message, WELCOME_MESSAGE);
        assert_eq!(session.last_message_time, 1_700_000_000_000);
    }

    #[test]
    fn test_chat_session_serializes_camel_case() {
        let session = ChatSession::seeded("abc", 42);
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["lastMessage"], WELCOME_MESSAGE);
        assert_eq!(json["lastMessageTime"], 42);
        assert_eq!(json["messages"][0]["role"], "assistant");
        assert_eq!(json["messages"][0]["timestamp"], 42);
    }

    #[test]
    fn test_matches_title_and_last_message() {
        let mut session = ChatSession::seeded("abc", 0);
        session.title = "Rust Lifetimes".to_string();
        session.last_message = "Borrow checker says NO".to_string();

        assert!(session.matches("lifetimes"));
        assert!(session.matches("checker says no"));
        assert!(!session.matches("python"));
    }

    #[test]
    fn test_message_role_reexport() {
        let role = MessageRole::User;
        assert_eq!(role.to_string(), "user");
    }
}
