use thiserror::Error;

/// Result alias for exercise operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by exercise operations.
///
/// Any error aborts the requested operation and leaves the exercise unchanged.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Exercise {0} not found")]
    NotFound(i64),

    #[error("Validation failed: {0}")]
    Validation(String),

    /// Persistence failure, not further classified.
    #[error("Storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
