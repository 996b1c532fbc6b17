use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RetrievalError {
    /// Backend or its embedding dependency could not be reached
    #[error("Retrieval unavailable: {0}")]
    Unavailable(String),

    /// Backend answered but rejected the call (credentials, index, dimensions)
    #[error("Retrieval misconfigured: {0}")]
    Misconfigured(String),
}

pub type Result<T> = std::result::Result<T, RetrievalError>;
