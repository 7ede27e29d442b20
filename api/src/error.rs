//! HTTP error taxonomy, mapped to status codes and a `{"detail": "..."}`
//! JSON body shape.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use promptgraph_core::error::EngineError;
use promptgraph_db::DbError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("authentication required")]
    AuthRequired,

    #[error("invalid credentials")]
    AuthInvalid,

    #[error("not authorized to access this resource")]
    OwnershipDenied,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status_and_detail(&self) -> (StatusCode, String) {
        match self {
            ApiError::AuthRequired | ApiError::AuthInvalid => {
                (StatusCode::UNAUTHORIZED, self.to_string())
            }
            ApiError::OwnershipDenied => (StatusCode::FORBIDDEN, self.to_string()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(ref msg) = self {
            tracing::error!(error = %msg, "internal server error");
        }
        let (status, detail) = self.status_and_detail();
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound => ApiError::NotFound("not found".to_string()),
            DbError::Duplicate(msg) => ApiError::Validation(msg),
            DbError::Sqlx(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match &err {
            EngineError::TemplateUndefined { .. } | EngineError::Validation(_) => {
                ApiError::Validation(err.to_string())
            }
            EngineError::ConfigMisshapen(_)
            | EngineError::LlmUnavailable(_)
            | EngineError::LlmTimeout(_)
            | EngineError::LlmMalformedResponse(_) => ApiError::Internal(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
