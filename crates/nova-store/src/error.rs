use thiserror::Error;

/// Store error type
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid store path: {0}")]
    InvalidPath(String),
}

/// Store result type
pub type StoreResult<T> = Result<T, StoreError>;
