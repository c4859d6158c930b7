//! Blob Store (BS) adapter contract (spec §4.5).

use async_trait::async_trait;

use crate::error::Result;

/// Content-addressed object storage. Stores uploaded images under a key
/// derived from the task id (spec §4.1: `image_key = tasks/{id}`).
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write `bytes` under `key`. Put-if-absent: if an object already exists
    /// at `key`, this is a no-op success (idempotent with respect to the
    /// reconciler re-running ingress staging for the same task id).
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<()>;

    /// Read the object at `key`. Fails with [`crate::error::AltifyError::NotFound`]
    /// if no such object exists.
    async fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// Delete the object at `key`, if any. Not an error if it is already gone
    /// (ingress rollback and GC both call this defensively).
    async fn delete(&self, key: &str) -> Result<()>;

    /// Whether an object exists at `key`, without fetching its bytes. Used by
    /// the GC sweep to decide whether an RS row is an orphan (spec §7).
    async fn exists(&self, key: &str) -> Result<bool>;
}
