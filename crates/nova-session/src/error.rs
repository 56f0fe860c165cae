use thiserror::Error;

/// Session error type
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("store error: {0}")]
    Store(#[from] nova_store::StoreError),
}

/// Session result type
pub type SessionResult<T> = Result<T, SessionError>;
