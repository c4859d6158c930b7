//! Filesystem-backed [`BlobStore`](altify_core::ports::BlobStore).
//!
//! Objects are sharded two levels deep by a hash of their key — except here
//! the key is already task-id derived (spec §4.1: `image_key = tasks/{id}`),
//! so we hash the key itself rather than the object's bytes.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

use altify_core::error::{AltifyError, Result};
use altify_core::ports::BlobStore;
use async_trait::async_trait;

pub struct FilesystemBlobStore {
    root: PathBuf,
}

impl FilesystemBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.contains("..") {
            return Err(AltifyError::BadInput(format!("unsafe blob key: {key:?}")));
        }
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let shard = format!("{:02x}", hasher.finish() & 0xff);
        let filename = key.replace('/', "_");
        Ok(self.root.join(shard).join(filename))
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<()> {
        let path = self.object_path(key)?;
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AltifyError::Unavailable(format!("creating blob dir: {e}")))?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| AltifyError::Unavailable(format!("writing blob {key}: {e}")))
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.object_path(key)?;
        tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AltifyError::NotFound(format!("blob {key}")),
            _ => AltifyError::Unavailable(format!("reading blob {key}: {e}")),
        })
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.object_path(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AltifyError::Unavailable(format!("deleting blob {key}: {e}"))),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let path = self.object_path(key)?;
        Ok(tokio::fs::try_exists(&path).await.unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_round_trips_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemBlobStore::new(dir.path());
        store.put("tasks/t1", b"image-bytes".to_vec()).await.unwrap();
        assert_eq!(store.get("tasks/t1").await.unwrap(), b"image-bytes");
        assert!(store.exists("tasks/t1").await.unwrap());
    }

    #[tokio::test]
    async fn put_is_idempotent_put_if_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemBlobStore::new(dir.path());
        store.put("tasks/t1", b"first".to_vec()).await.unwrap();
        store.put("tasks/t1", b"second".to_vec()).await.unwrap();
        assert_eq!(store.get("tasks/t1").await.unwrap(), b"first");
    }

    #[tokio::test]
    async fn get_missing_key_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemBlobStore::new(dir.path());
        let err = store.get("tasks/missing").await.unwrap_err();
        assert!(matches!(err, AltifyError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_missing_key_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemBlobStore::new(dir.path());
        store.delete("tasks/never-existed").await.unwrap();
    }

    #[tokio::test]
    async fn rejects_path_traversal_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemBlobStore::new(dir.path());
        let err = store.get("../../etc/passwd").await.unwrap_err();
        assert!(matches!(err, AltifyError::BadInput(_)));
    }
}
