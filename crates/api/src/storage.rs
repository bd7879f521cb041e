//! Blob storage for uploaded compliance documents.
//!
//! The store is keyed by relative paths of the form
//! `users/<user_id>/submissions/<submission_id>/<category>/<field_id>/<name>`,
//! so deleting a document only needs the stored path. The default
//! implementation keeps blobs on the local filesystem under the configured
//! upload directory.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

/// Errors from the blob store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Invalid storage path: {0}")]
    InvalidPath(String),
    #[error("Object not found: {0}")]
    NotFound(String),
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Abstraction over the document blob store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store a blob at the given relative path, creating parent directories
    /// as needed. Overwrites any existing blob at that path.
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError>;

    /// Read a blob back.
    async fn get(&self, path: &str) -> Result<Vec<u8>, StorageError>;

    /// Delete a blob. Deleting a missing blob is not an error; removal is
    /// idempotent.
    async fn delete(&self, path: &str) -> Result<(), StorageError>;
}

/// Filesystem-backed store rooted at the configured upload directory.
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a relative storage path, rejecting anything that would
    /// escape the root.
    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let rel = Path::new(path);
        let escapes = rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if path.is_empty() || escapes {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(rel))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full, bytes).await?;
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let full = self.resolve(path)?;
        match tokio::fs::read(&full).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        let full = self.resolve(path)?;
        match tokio::fs::remove_file(&full).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> LocalObjectStore {
        let dir = std::env::temp_dir().join(format!("onboard-store-{}", uuid::Uuid::new_v4()));
        LocalObjectStore::new(dir)
    }

    #[tokio::test]
    async fn put_get_delete_roundtrip() {
        let store = store();
        let path = "users/u1/submissions/s1/compliance/aml-policy/aml-policy-1.pdf";

        store.put(path, b"document body").await.unwrap();
        assert_eq!(store.get(path).await.unwrap(), b"document body");

        store.delete(path).await.unwrap();
        assert!(matches!(
            store.get(path).await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = store();
        store.delete("users/u1/never-written.pdf").await.unwrap();
    }

    #[tokio::test]
    async fn traversal_components_rejected() {
        let store = store();
        assert!(matches!(
            store.put("../outside.pdf", b"x").await,
            Err(StorageError::InvalidPath(_))
        ));
        assert!(matches!(
            store.get("/etc/passwd").await,
            Err(StorageError::InvalidPath(_))
        ));
    }
}
