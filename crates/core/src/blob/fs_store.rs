//! Filesystem blob store.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

use super::error::BlobError;
use super::traits::{BlobStore, StoredBlob};

const MAX_NAME_LEN: usize = 100;

/// Stores each blob as one file directly under `root`.
pub struct FsBlobStore {
    root: PathBuf,
    max_bytes: Option<u64>,
}

impl FsBlobStore {
    /// Creates a store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_bytes: None,
        }
    }

    /// Refuse blobs larger than `max_bytes`.
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, BlobError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }

    async fn write_atomically(&self, key: &str, data: &[u8]) -> Result<(), BlobError> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| BlobError::io(key, e))?;

        let final_path = self.path_for(key)?;
        let temp_path = self.root.join(format!(".tmp-{}", uuid::Uuid::new_v4()));

        let result = async {
            let mut file = File::create(&temp_path).await?;
            file.write_all(data).await?;
            file.flush().await?;
            file.sync_all().await?;
            drop(file);
            fs::rename(&temp_path, &final_path).await
        }
        .await;

        if let Err(e) = result {
            let _ = fs::remove_file(&temp_path).await;
            return Err(BlobError::io(key, e));
        }

        Ok(())
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, filename: &str, data: &[u8]) -> Result<StoredBlob, BlobError> {
        if let Some(limit) = self.max_bytes {
            if data.len() as u64 > limit {
                return Err(BlobError::TooLarge {
                    filename: filename.to_string(),
                    size: data.len() as u64,
                    limit,
                });
            }
        }

        let key = format!("{}-{}", uuid::Uuid::new_v4(), sanitize_filename(filename));

        self.write_atomically(&key, data).await?;

        let sha256 = format!("{:x}", Sha256::digest(data));
        tracing::debug!(key = %key, size = data.len(), "Stored blob");

        Ok(StoredBlob {
            key,
            size_bytes: data.len() as u64,
            sha256,
        })
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, BlobError> {
        let path = self.path_for(key)?;
        fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                BlobError::NotFound(key.to_string())
            } else {
                BlobError::io(key, e)
            }
        })
    }

    async fn delete(&self, key: &str) -> Result<(), BlobError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(key = %key, "Deleted blob");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BlobError::io(key, e)),
        }
    }
}

/// Reduce a client filename to a safe single path component.
fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim()
        .trim_start_matches('.');

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_NAME_LEN)
        .collect();

    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

fn validate_key(key: &str) -> Result<(), BlobError> {
    let well_formed = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));

    if well_formed {
        Ok(())
    } else {
        Err(BlobError::InvalidKey(key.to_string()))
    }
}
