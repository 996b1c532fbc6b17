use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use docent_chat::SessionRejection;
use serde_json::json;
use thiserror::Error;

/// Pre-stream failures. Each one is a plain JSON response; no event stream
/// is opened.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Project {0} does not belong to the caller")]
    Forbidden(String),

    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Persistence error: {0}")]
    Persist(#[from] docent_persist::PersistError),
}

impl From<SessionRejection> for ApiError {
    fn from(rejection: SessionRejection) -> Self {
        match rejection {
            SessionRejection::Unauthenticated => ApiError::Unauthenticated,
            SessionRejection::EmptyMessage => {
                ApiError::BadRequest("Message must not be empty".to_string())
            }
            SessionRejection::InvalidRequest(reason) => ApiError::BadRequest(reason),
            SessionRejection::ProjectNotFound(id) => ApiError::ProjectNotFound(id),
            SessionRejection::Forbidden(id) => ApiError::Forbidden(id),
            SessionRejection::Lookup(e) => ApiError::Persist(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthenticated => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, self.to_string()),
            ApiError::ProjectNotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::Persist(ref e) => {
                tracing::error!("Persistence error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Storage error".to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
