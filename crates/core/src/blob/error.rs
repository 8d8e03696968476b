//! Error types for the blob module.

use thiserror::Error;

/// Errors that can occur while storing or reading file contents.
#[derive(Debug, Error)]
pub enum BlobError {
    /// Key is malformed or would escape the storage root.
    #[error("Invalid blob key: {0}")]
    InvalidKey(String),

    /// No blob stored under the key.
    #[error("Blob not found: {0}")]
    NotFound(String),

    /// Upload exceeds the configured size limit.
    #[error("File {filename} is {size} bytes, limit is {limit}")]
    TooLarge {
        filename: String,
        size: u64,
        limit: u64,
    },

    /// Underlying filesystem failure.
    #[error("I/O error on blob {key}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

impl BlobError {
    pub(crate) fn io(key: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            key: key.into(),
            source,
        }
    }
}
