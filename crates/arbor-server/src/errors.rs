//! API error type and status mapping.
//!
//! Every handler returns `Result<_, ApiError>`; the `IntoResponse` impl
//! turns the error kind into a status code and a `{"error": ...}` JSON
//! body. Internal details never leak past the 500 message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use arbor_engine::EngineError;
use arbor_store::StoreError;

/// Errors surfaced by the HTTP layer.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Target resource does not exist (404).
    #[error("{0}")]
    NotFound(String),

    /// Request named a node or parent that does not exist (422).
    #[error("{0}")]
    InvalidReference(String),

    /// The model collaborator failed (502).
    #[error("{0}")]
    Upstream(String),

    /// Persistence or internal failure (500).
    #[error("{0}")]
    Internal(String),
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::SessionNotFound(_) => Self::NotFound(err.to_string()),
            EngineError::InvalidParent { .. } | EngineError::NodeNotFound { .. } => {
                Self::InvalidReference(err.to_string())
            }
            EngineError::Upstream(_) => Self::Upstream(err.to_string()),
            EngineError::Store(inner) => Self::Internal(inner.to_string()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::SessionNotFound(_) => Self::NotFound(err.to_string()),
            StoreError::NodeNotFound { .. } | StoreError::ParentNotFound { .. } => {
                Self::InvalidReference(err.to_string())
            }
            other => Self::Internal(other.to_string()),
        }
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidReference(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Internal(message) => error!(%status, message, "request failed"),
            Self::Upstream(message) => warn!(%status, message, "upstream failure"),
            _ => {}
        }
        let body = match self {
            Self::Internal(_) => "internal server error".to_string(),
            other => other.to_string(),
        };
        (status, Json(json!({ "error": body }))).into_response()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
