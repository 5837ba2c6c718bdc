//! Application error type mapping to HTTP status codes and the error body format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use parley_types::error::ChatError;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// The requested session does not exist.
    NotFound(String),
    /// Malformed request payload.
    Validation(String),
    /// Generic internal error.
    Internal(String),
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        match e {
            ChatError::NotFound(_) => AppError::NotFound(e.to_string()),
            ChatError::Validation(msg) => AppError::Validation(msg),
            ChatError::UpstreamFailure(_) | ChatError::StoreFailure(_) => {
                AppError::Internal(e.to_string())
            }
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "SESSION_NOT_FOUND",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (AppError::NotFound(message)
        | AppError::Validation(message)
        | AppError::Internal(message)) = &self;

        if matches!(self, AppError::Internal(_)) {
            tracing::error!(error = %message, "Request failed");
        }

        let body = json!({
            "errors": [{
                "code": self.code(),
                "message": message,
            }]
        });

        (
            self.status(),
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_types::error::RepositoryError;

    #[test]
    fn test_chat_error_mapping() {
        let not_found: AppError = ChatError::NotFound("abc".to_string()).into();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
        assert_eq!(not_found.code(), "SESSION_NOT_FOUND");

        let invalid: AppError = ChatError::Validation("bad".to_string()).into();
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        let store: AppError = ChatError::StoreFailure(RepositoryError::Connection).into();
        assert_eq!(store.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(store.code(), "INTERNAL_ERROR");
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = AppError::Validation("message is required".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["errors"][0]["code"], "VALIDATION_ERROR");
        assert_eq!(body["errors"][0]["message"], "message is required");
    }
}
