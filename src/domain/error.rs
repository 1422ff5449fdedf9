use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum KanbanError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl KanbanError {
    pub fn status(&self) -> StatusCode {
        match self {
            KanbanError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            KanbanError::Forbidden(_) => StatusCode::FORBIDDEN,
            KanbanError::NotFound(_) => StatusCode::NOT_FOUND,
            KanbanError::BadRequest(_) => StatusCode::BAD_REQUEST,
            KanbanError::Internal(_)
            | KanbanError::Database(_)
            | KanbanError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for KanbanError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            KanbanError::Unauthorized(msg)
            | KanbanError::Forbidden(msg)
            | KanbanError::NotFound(msg)
            | KanbanError::BadRequest(msg) => msg.clone(),
            KanbanError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".into()
            }
            KanbanError::Database(err) => {
                tracing::error!("Database error: {:?}", err);
                "Internal server error".into()
            }
            KanbanError::Serialization(err) => {
                tracing::error!("Serialization error: {:?}", err);
                "Internal server error".into()
            }
        };

        let body = json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
