use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

type BoxedSource = Box<dyn Error + Send + Sync>;

/// Error raised by quiz stores regardless of the underlying medium.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The medium could not be reached (missing directory, I/O failure, ...).
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// What the backend was doing.
        message: String,
        /// Underlying failure.
        #[source]
        source: BoxedSource,
    },
    /// A record could be read but not decoded.
    #[error("corrupt record: {message}")]
    Corrupt {
        /// What the backend was doing.
        message: String,
        /// Underlying failure.
        #[source]
        source: BoxedSource,
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

    /// Construct a decoding error for a record the backend could not interpret.
    pub fn corrupt(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Corrupt {
            message,
            source: Box::new(source),
        }
    }
}
