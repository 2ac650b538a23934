//! Error types raised by the JSON record-file backend.

use std::{io, path::PathBuf};

use thiserror::Error;

use crate::dao::storage::StorageError;

/// Convenient result alias returning [`JsonStoreError`] failures.
pub type JsonResult<T> = Result<T, JsonStoreError>;

/// Failures that can occur while reading or writing record files.
#[derive(Debug, Error)]
pub enum JsonStoreError {
    /// The data directory does not exist or is not a directory.
    #[error("data directory `{path}` is not available")]
    MissingDirectory {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },
    /// Reading a record file failed for a reason other than absence.
    #[error("failed to read record file `{path}`")]
    Read {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },
    /// Writing or renaming a record file failed.
    #[error("failed to write record file `{path}`")]
    Write {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },
    /// The file exists but does not hold the expected document.
    #[error("failed to decode record file `{path}`")]
    Decode {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: serde_json::Error,
    },
    /// Serializing the updated document failed.
    #[error("failed to encode record file `{path}`")]
    Encode {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: serde_json::Error,
    },
}

impl From<JsonStoreError> for StorageError {
    fn from(err: JsonStoreError) -> Self {
        let message = err.to_string();
        match err {
            JsonStoreError::Decode { .. } => StorageError::corrupt(message, err),
            _ => StorageError::unavailable(message, err),
        }
    }
}
