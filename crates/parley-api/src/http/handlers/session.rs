//! Session CRUD HTTP handlers.
//!
//! Endpoints:
//! - GET    /api/sessions               - List sessions, most recent first
//! - POST   /api/sessions               - Create a session seeded with the welcome message
//! - GET    /api/sessions/search?query= - Search titles and last messages
//! - GET    /api/sessions/{id}          - Get a single session with its messages
//! - DELETE /api/sessions/{id}          - Delete a session and its messages

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;

use parley_types::chat::ChatSession;

use crate::http::error::AppError;
use crate::state::ApiState;

/// Query parameters for session search.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
}

/// GET /api/sessions - List all sessions.
pub async fn list_sessions(
    State(state): State<ApiState>,
) -> Result<Json<Vec<ChatSession>>, AppError> {
    Ok(Json(state.chat_service.list_sessions().await?))
}

/// POST /api/sessions - Create a new session.
pub async fn create_session(
    State(state): State<ApiState>,
) -> Result<Json<ChatSession>, AppError> {
    Ok(Json(state.chat_service.create_session().await?))
}

/// GET /api/sessions/search - Case-insensitive search; blank lists everything.
pub async fn search_sessions(
    State(state): State<ApiState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<ChatSession>>, AppError> {
    Ok(Json(state.chat_service.search_sessions(&query.query).await?))
}

/// GET /api/sessions/{id} - Get a session by ID.
pub async fn get_session(
    State(state): State<ApiState>,
    Path(session_id): Path<String>,
) -> Result<Json<ChatSession>, AppError> {
    Ok(Json(state.chat_service.get_session(&session_id).await?))
}

/// DELETE /api/sessions/{id} - Delete a session and its messages.
pub async fn delete_session(
    State(state): State<ApiState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.chat_service.delete_session(&session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
