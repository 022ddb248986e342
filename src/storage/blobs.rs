//! Blob storage for uploaded files (profile avatars)
//!
//! Blobs are plain files under `{data_dir}/blobs/`, addressed by a relative
//! key such as `avatars/{user_id}.jpg`.

use crate::storage::error::{StoreError, StoreResult};
use std::path::{Component, Path, PathBuf};

/// Filesystem-backed blob store
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Key of a user's avatar image
    pub fn avatar_key(user_id: &str) -> String {
        format!("avatars/{}.jpg", user_id)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, key: &str) -> StoreResult<PathBuf> {
        let relative = Path::new(key.trim_start_matches('/'));
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if key.is_empty() || escapes {
            tracing::warn!(key = %key, "Rejected blob key outside the blob root");
            return Err(StoreError::not_found("blobs", key));
        }
        Ok(self.root.join(relative))
    }

    /// Write a blob, replacing any previous content
    pub async fn save(&self, key: &str, content: &[u8]) -> StoreResult<()> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, content).await?;

        tracing::debug!(key = %key, bytes = content.len(), "Blob saved");
        Ok(())
    }

    /// Read a blob
    pub async fn open(&self, key: &str) -> StoreResult<Vec<u8>> {
        let path = self.resolve(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::not_found("blobs", key))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn exists(&self, key: &str) -> bool {
        match self.resolve(key) {
            Ok(path) => tokio::fs::try_exists(path).await.unwrap_or(false),
            Err(_) => false,
        }
    }
}
