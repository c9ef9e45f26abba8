//! Blob storage for oversized document content

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::debug;

const PLACEHOLDER_PREFIX: &str = "[blob:";

/// Key→bytes storage
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<()>;

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
}

/// Blob key used for a document's relocated content
pub fn blob_key(document_id: &str) -> String {
    format!("documents/{}", document_id)
}

/// Placeholder persisted in a document's `content` field after relocation
pub fn placeholder(key: &str, original_chars: usize) -> String {
    format!(
        "{}{}] {} chars relocated to blob storage",
        PLACEHOLDER_PREFIX, key, original_chars
    )
}

/// Whether `content` is a relocation placeholder
pub fn is_placeholder(content: &str) -> bool {
    placeholder_key(content).is_some()
}

/// Extract the blob key from a placeholder
pub fn placeholder_key(content: &str) -> Option<&str> {
    let rest = content.strip_prefix(PLACEHOLDER_PREFIX)?;
    let end = rest.find(']')?;
    let key = &rest[..end];
    if key.is_empty() || !rest[end..].ends_with("relocated to blob storage") {
        return None;
    }
    Some(key)
}

/// One file per key under a root directory
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    // Keys are caller-controlled ids; hashing keeps them out of the path.
    fn path_for(&self, key: &str) -> PathBuf {
        let name = blake3::hash(key.as_bytes()).to_hex().to_string();
        self.root.join(format!("{}.blob", name))
    }

    /// Number of blobs on disk
    pub fn count(&self) -> Result<usize> {
        let mut count = 0;
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.path().extension().is_some_and(|e| e == "blob") {
                count += 1;
            }
        }
        Ok(count)
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<()> {
        let path = self.path_for(key);
        debug!("Writing blob {} ({} bytes) to {:?}", key, bytes.len(), path);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| Error::Blob(format!("Failed to write blob '{}': {}", key, e)))
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Blob(format!("Failed to read blob '{}': {}", key, e))),
        }
    }
}

/// In-process blob store
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<()> {
        self.blobs.write().await.insert(key.to_string(), bytes);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.blobs.read().await.get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_placeholder_form() {
        let key = blob_key("doc-42");
        let text = placeholder(&key, 40_000);
        assert_eq!(
            text,
            "[blob:documents/doc-42] 40000 chars relocated to blob storage"
        );
        assert!(is_placeholder(&text));
        assert_eq!(placeholder_key(&text), Some("documents/doc-42"));
        assert!(!is_placeholder("[blob:] nothing here"));
        assert!(!is_placeholder("ordinary content"));
    }

    #[tokio::test]
    async fn test_fs_blob_store_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let store = FsBlobStore::new(tmp.path().join("blobs")).unwrap();

        store
            .put("documents/../../etc/passwd", b"payload".to_vec())
            .await
            .unwrap();
        let loaded = store.get("documents/../../etc/passwd").await.unwrap();
        assert_eq!(loaded, Some(b"payload".to_vec()));
        assert_eq!(store.get("documents/missing").await.unwrap(), None);
        assert_eq!(store.count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_memory_blob_store_overwrites() {
        let store = MemoryBlobStore::new();
        store.put("k", b"one".to_vec()).await.unwrap();
        store.put("k", b"two".to_vec()).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(b"two".to_vec()));
        assert_eq!(store.len().await, 1);
    }
}
