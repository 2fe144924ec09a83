use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid timer mode '{0}'")]
    InvalidMode(String),

    #[error("Timer session {0} not found")]
    NotFound(String),

    #[error("{0}")]
    InvalidConfiguration(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub type SessionResult<T> = Result<T, SessionError>;
