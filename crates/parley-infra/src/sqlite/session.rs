//! SQLite session store implementation.
//!
//! Implements `SessionStore` from `parley-core` using sqlx with split
//! read/write pools. Each append (message insert plus session metadata
//! update) runs in one transaction on the writer.

use std::collections::HashMap;

use parley_core::chat::now_millis;
use parley_core::chat::repository::{SessionStore, normalize_query};
use parley_types::chat::{ChatMessage, ChatSession, DEFAULT_SESSION_ID};
use parley_types::error::RepositoryError;
use parley_types::llm::MessageRole;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use tracing::{debug, info};
use uuid::Uuid;

use super::pool::DatabasePool;

/// Session ids bound per message query during hydration.
const HYDRATE_BATCH: usize = 500;

const SELECT_BY_RECENCY: &str =
    "SELECT * FROM chat_sessions ORDER BY last_message_time DESC, rowid DESC";

/// SQLite-backed implementation of `SessionStore`.
pub struct SqliteSessionStore {
    pool: DatabasePool,
}

impl SqliteSessionStore {
    /// Create a new store backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Open the store and make sure the default session exists.
    pub async fn bootstrap(pool: DatabasePool) -> Result<Self, RepositoryError> {
        let store = Self::new(pool);
        store.ensure_default_session().await?;
        Ok(store)
    }

    /// Load session rows in the given order, without their messages.
    async fn fetch_sessions<'q>(
        &self,
        sql: &'q str,
        bind: Option<&'q str>,
    ) -> Result<Vec<ChatSession>, RepositoryError> {
        let mut query = sqlx::query(sql);
        if let Some(value) = bind {
            query = query.bind(value);
        }
        let rows = query
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_err)?;

        rows.iter()
            .map(|row| {
                SessionRow::from_row(row)
                    .map(SessionRow::into_session)
                    .map_err(query_err)
            })
            .collect()
    }

    /// Attach message logs to sessions, keeping their order.
    ///
    /// Ids are bound in chunks of `HYDRATE_BATCH` to stay under SQLite's
    /// host parameter limit.
    async fn hydrate(
        &self,
        mut sessions: Vec<ChatSession>,
    ) -> Result<Vec<ChatSession>, RepositoryError> {
        let mut by_session: HashMap<String, Vec<ChatMessage>> = HashMap::new();

        for batch in sessions.chunks(HYDRATE_BATCH) {
            let placeholders = vec!["?"; batch.len()].join(", ");
            let sql = format!(
                "SELECT session_id, role, content, timestamp FROM chat_messages \
                 WHERE session_id IN ({placeholders}) ORDER BY timestamp ASC, id ASC"
            );
            let mut query = sqlx::query(&sql);
            for session in batch {
                query = query.bind(session.id.as_str());
            }
            let message_rows = query
                .fetch_all(&self.pool.reader)
                .await
                .map_err(query_err)?;

            for row in &message_rows {
                let message_row = MessageRow::from_row(row).map_err(query_err)?;
                let session_id = message_row.session_id.clone();
                by_session
                    .entry(session_id)
                    .or_default()
                    .push(message_row.into_message()?);
            }
        }

        for session in &mut sessions {
            session.messages = by_session.remove(&session.id).unwrap_or_default();
        }
        Ok(sessions)
    }

    /// Insert a seeded session and its welcome message.
    ///
    /// With `if_absent`, an existing session with the same id is left alone.
    async fn insert_seeded(
        &self,
        session: &ChatSession,
        if_absent: bool,
    ) -> Result<bool, RepositoryError> {
        let verb = if if_absent {
            "INSERT OR IGNORE"
        } else {
            "INSERT"
        };
        let sql = format!(
            "{verb} INTO chat_sessions (id, title, last_message, last_message_time) VALUES (?, ?, ?, ?)"
        );

        let mut tx = self.pool.writer.begin().await.map_err(query_err)?;

        let result = sqlx::query(&sql)
            .bind(&session.id)
            .bind(&session.title)
            .bind(&session.last_message)
            .bind(session.last_message_time)
            .execute(&mut *tx)
            .await
            .map_err(query_err)?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        for message in &session.messages {
            insert_message(&mut tx, &session.id, message).await?;
        }

        tx.commit().await.map_err(query_err)?;
        Ok(true)
    }
}

fn query_err(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Query(e.to_string())
}

async fn insert_message(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    session_id: &str,
    message: &ChatMessage,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "INSERT INTO chat_messages (session_id, role, content, timestamp) VALUES (?, ?, ?, ?)",
    )
    .bind(session_id)
    .bind(message.role.to_string())
    .bind(&message.content)
    .bind(message.timestamp)
    .execute(&mut **tx)
    .await
    .map_err(query_err)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct SessionRow {
    id: String,
    title: String,
    last_message: String,
    last_message_time: i64,
}

impl SessionRow {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            last_message: row.try_get("last_message")?,
            last_message_time: row.try_get("last_message_time")?,
        })
    }

    fn into_session(self) -> ChatSession {
        ChatSession {
            id: self.id,
            title: self.title,
            last_message: self.last_message,
            last_message_time: self.last_message_time,
            messages: Vec::new(),
        }
    }
}

struct MessageRow {
    session_id: String,
    role: String,
    content: String,
    timestamp: i64,
}

impl MessageRow {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            session_id: row.try_get("session_id")?,
            role: row.try_get("role")?,
            content: row.try_get("content")?,
            timestamp: row.try_get("timestamp")?,
        })
    }

    fn into_message(self) -> Result<ChatMessage, RepositoryError> {
        let role: MessageRole = self.role.parse().map_err(RepositoryError::Query)?;
        Ok(ChatMessage::new(role, self.content, self.timestamp))
    }
}

// ---------------------------------------------------------------------------
// SessionStore implementation
// ---------------------------------------------------------------------------

impl SessionStore for SqliteSessionStore {
    async fn get_session(&self, session_id: &str) -> Result<Option<ChatSession>, RepositoryError> {
        let sessions = self
            .fetch_sessions("SELECT * FROM chat_sessions WHERE id = ?", Some(session_id))
            .await?;
        Ok(self.hydrate(sessions).await?.pop())
    }

    async fn append_message(
        &self,
        session_id: &str,
        message: &ChatMessage,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_err)?;

        let result = sqlx::query(
            "UPDATE chat_sessions SET last_message = ?, last_message_time = ? WHERE id = ?",
        )
        .bind(&message.content)
        .bind(message.timestamp)
        .bind(session_id)
        .execute(&mut *tx)
        .await
        .map_err(query_err)?;

        // Dropping the transaction rolls it back.
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        insert_message(&mut tx, session_id, message).await?;
        tx.commit().await.map_err(query_err)?;

        debug!(session_id, role = %message.role, "Message appended");
        Ok(())
    }

    async fn create_session(&self) -> Result<ChatSession, RepositoryError> {
        let session = ChatSession::seeded(Uuid::new_v4().to_string(), now_millis());
        self.insert_seeded(&session, false).await?;
        Ok(session)
    }

    async fn ensure_default_session(&self) -> Result<(), RepositoryError> {
        let session = ChatSession::seeded(DEFAULT_SESSION_ID, now_millis());
        if self.insert_seeded(&session, true).await? {
            info!("Created default session");
        }
        Ok(())
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM chat_sessions WHERE id = ?")
            .bind(session_id)
            .execute(&self.pool.writer)
            .await
            .map_err(query_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn list_sessions(&self) -> Result<Vec<ChatSession>, RepositoryError> {
        let sessions = self.fetch_sessions(SELECT_BY_RECENCY, None).await?;
        self.hydrate(sessions).await
    }

    async fn search_sessions(&self, query: &str) -> Result<Vec<ChatSession>, RepositoryError> {
        let Some(needle) = normalize_query(query) else {
            return self.list_sessions().await;
        };

        // Folded in Rust: SQLite's lower() only handles ASCII.
        let mut sessions = self.fetch_sessions(SELECT_BY_RECENCY, None).await?;
        sessions.retain(|session| session.matches(&needle));
        debug!(matches = sessions.len(), "Session search");
        self.hydrate(sessions).await
    }
}
