use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not serve the request.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// Backend-specific description, logged but never returned to clients.
        message: String,
        /// Underlying driver or transport error.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The backend rejected a write because a game with the same id already exists.
    #[error("game `{id}` already exists")]
    Conflict {
        /// Id that was already taken.
        id: u64,
    },
    /// The id cannot be represented by the backend's key type.
    #[error("game id `{id}` is outside the range this store can hold")]
    IdOutOfRange {
        /// Id that was rejected.
        id: u64,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}
