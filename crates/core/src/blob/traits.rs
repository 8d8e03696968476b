//! Blob store trait definition.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::BlobError;

/// Where and what was written by [`BlobStore::put`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredBlob {
    /// Opaque key to read or delete the blob later.
    pub key: String,
    pub size_bytes: u64,
    /// Hex SHA-256 of the contents.
    pub sha256: String,
}

/// Opaque storage for attached file contents.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` under a fresh key derived from `filename`.
    ///
    /// The blob becomes visible only once fully written.
    async fn put(&self, filename: &str, data: &[u8]) -> Result<StoredBlob, BlobError>;

    /// Read the contents stored under `key`.
    async fn get(&self, key: &str) -> Result<Vec<u8>, BlobError>;

    /// Remove the blob stored under `key`. Deleting a missing blob succeeds.
    async fn delete(&self, key: &str) -> Result<(), BlobError>;
}
