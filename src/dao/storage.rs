//! Backend-agnostic storage error surface.

use std::error::Error;
use thiserror::Error;

/// Result alias used by every [`GameStore`](crate::dao::game_store::GameStore) method.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by a storage backend, independent of the database driving it.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not serve the request (connectivity, query failure, ...).
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// Human readable description of the failing operation.
        message: String,
        /// Underlying backend error.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

impl StorageError {
    /// Wrap any backend failure into an unavailable error.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}
