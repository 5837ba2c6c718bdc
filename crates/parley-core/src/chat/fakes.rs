//! In-memory fakes for exercising the chat pipeline without SQLite or a model.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parley_types::chat::{ChatMessage, ChatSession, DEFAULT_SESSION_ID, MessageRole};
use parley_types::error::RepositoryError;
use parley_types::llm::{CompletionRequest, LlmError, StreamEvent};

use crate::chat::now_millis;
use crate::chat::repository::{SessionStore, normalize_query};
use crate::llm::provider::{EventStream, LlmProvider};

/// Session store backed by a `Vec`, with an optional per-role append failure.
#[derive(Default)]
pub struct FakeStore {
    sessions: Mutex<Vec<ChatSession>>,
    fail_role: Mutex<Option<MessageRole>>,
    next_id: Mutex<u32>,
}

impl FakeStore {
    pub fn with_session(id: &str) -> Self {
        let store = Self::default();
        store
            .sessions
            .lock()
            .unwrap()
            .push(ChatSession::seeded(id, now_millis()));
        store
    }

    /// Make every append of a message with `role` fail with a query error.
    pub fn fail_appends_for(&self, role: MessageRole) {
        *self.fail_role.lock().unwrap() = Some(role);
    }

    pub fn messages(&self, id: &str) -> Vec<ChatMessage> {
        self.sessions
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.messages.clone())
            .unwrap_or_default()
    }
}

impl SessionStore for FakeStore {
    async fn get_session(&self, session_id: &str) -> Result<Option<ChatSession>, RepositoryError> {
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == session_id)
            .cloned())
    }

    async fn append_message(
        &self,
        session_id: &str,
        message: &ChatMessage,
    ) -> Result<(), RepositoryError> {
        if *self.fail_role.lock().unwrap() == Some(message.role) {
            return Err(RepositoryError::Query("disk I/O error".to_string()));
        }
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions
            .iter_mut()
            .find(|s| s.id == session_id)
            .ok_or(RepositoryError::NotFound)?;
        session.last_message = message.content.clone();
        session.last_message_time = message.timestamp;
        session.messages.push(message.clone());
        Ok(())
    }

    async fn create_session(&self) -> Result<ChatSession, RepositoryError> {
        let id = {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            format!("session-{next}")
        };
        let session = ChatSession::seeded(id, now_millis());
        self.sessions.lock().unwrap().push(session.clone());
        Ok(session)
    }

    async fn ensure_default_session(&self) -> Result<(), RepositoryError> {
        let mut sessions = self.sessions.lock().unwrap();
        if !sessions.iter().any(|s| s.id == DEFAULT_SESSION_ID) {
            sessions.push(ChatSession::seeded(DEFAULT_SESSION_ID, now_millis()));
        }
        Ok(())
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), RepositoryError> {
        let mut sessions = self.sessions.lock().unwrap();
        let before = sessions.len();
        sessions.retain(|s| s.id != session_id);
        if sessions.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn list_sessions(&self) -> Result<Vec<ChatSession>, RepositoryError> {
        let mut sessions = self.sessions.lock().unwrap().clone();
        sessions.sort_by(|a, b| b.last_message_time.cmp(&a.last_message_time));
        Ok(sessions)
    }

    async fn search_sessions(&self, query: &str) -> Result<Vec<ChatSession>, RepositoryError> {
        let Some(needle) = normalize_query(query) else {
            return self.list_sessions().await;
        };
        let mut found = self.list_sessions().await?;
        found.retain(|s| s.matches(&needle));
        Ok(found)
    }
}

/// One step of a scripted provider stream.
#[derive(Clone)]
pub enum Step {
    Emit(Result<StreamEvent, LlmError>),
    Sleep(Duration),
    /// Never yield again.
    Hang,
}

impl Step {
    pub fn text(text: &str) -> Self {
        Step::Emit(Ok(StreamEvent::TextDelta {
            text: text.to_string(),
        }))
    }

    pub fn done() -> Self {
        Step::Emit(Ok(StreamEvent::Done))
    }

    pub fn fail(message: &str) -> Self {
        Step::Emit(Err(LlmError::Stream(message.to_string())))
    }
}

/// Provider that replays a fixed script and records what it was asked.
pub struct ScriptedProvider {
    script: Vec<Step>,
    last_request: Mutex<Option<CompletionRequest>>,
    dropped: Arc<AtomicBool>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Step>) -> Self {
        Self {
            script,
            last_request: Mutex::new(None),
            dropped: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.last_request.lock().unwrap().clone()
    }

    /// Whether the most recent stream has been dropped by its consumer.
    pub fn stream_dropped(&self) -> bool {
        self.dropped.load(Ordering::SeqCst)
    }
}

struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn stream(&self, request: CompletionRequest) -> EventStream {
        *self.last_request.lock().unwrap() = Some(request);
        let script = self.script.clone();
        let flag = DropFlag(Arc::clone(&self.dropped));

        Box::pin(async_stream::stream! {
            let _flag = flag;
            for step in script {
                match step {
                    Step::Emit(event) => yield event,
                    Step::Sleep(duration) => tokio::time::sleep(duration).await,
                    Step::Hang => futures_util::future::pending::<()>().await,
                }
            }
        })
    }
}
