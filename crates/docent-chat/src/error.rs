use std::time::Duration;

use docent_persist::PersistError;
use docent_retrieval::RetrievalError;
use thiserror::Error;

/// Reasons a request is refused before any event is emitted
#[derive(Error, Debug)]
pub enum SessionRejection {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Message must not be empty")]
    EmptyMessage,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("Project {0} does not belong to the caller")]
    Forbidden(String),

    #[error("Project lookup failed: {0}")]
    Lookup(#[from] PersistError),
}

/// Failures after the stream opened; each ends it with one `error` event
#[derive(Error, Debug)]
pub enum StreamFailure {
    #[error("Document context could not be fetched: {0}")]
    RetrievalUnavailable(#[from] RetrievalError),

    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Model stream interrupted: {0}")]
    ModelInterrupted(String),

    #[error("Response timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}
