use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IntoResponse for BoardError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            BoardError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            BoardError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            BoardError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            BoardError::Database(err) => {
                tracing::error!("Database error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".into(),
                )
            }
            BoardError::Serialization(err) => {
                tracing::error!("Serialization error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".into(),
                )
            }
        };

        let body = json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Failure reported by the storage collaborator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("rejected: {0}")]
    Rejected(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl From<BoardError> for StoreError {
    fn from(err: BoardError) -> Self {
        match err {
            BoardError::NotFound(msg) => StoreError::NotFound(msg),
            BoardError::Validation(msg) => StoreError::Rejected(msg),
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("board session is closed")]
    Closed,
}

/// Rejects blank titles before any I/O happens.
pub fn validate_title(title: &str) -> Result<&str, String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err("title must not be empty".into());
    }
    Ok(trimmed)
}
