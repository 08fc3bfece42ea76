//! Interface error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

use flowdeck_engine::EngineError;

/// Interface error types. Every variant renders as `{ success: false, error }`.
#[derive(Debug, Error)]
pub enum InterfaceError {
    /// Malformed body, missing fields or unknown template.
    #[error("{0}")]
    BadRequest(String),

    /// Unknown workflow id.
    #[error("{0}")]
    NotFound(String),

    /// Operation not allowed in the workflow's current status.
    #[error("{0}")]
    Conflict(String),

    /// Anything the caller cannot fix.
    #[error("Internal server error")]
    Internal(String),
}

impl InterfaceError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<EngineError> for InterfaceError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::TemplateNotFound(_) => {
                Self::BadRequest("Invalid workflow template".to_string())
            }
            EngineError::WorkflowNotFound(_) => Self::NotFound("Workflow not found".to_string()),
            EngineError::InvalidState { .. } => Self::Conflict(err.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for InterfaceError {
    fn into_response(self) -> Response {
        if let Self::Internal(detail) = &self {
            error!("Request failed: {}", detail);
        }
        let body = serde_json::json!({
            "success": false,
            "error": self.to_string(),
        });
        (self.status(), Json(body)).into_response()
    }
}
