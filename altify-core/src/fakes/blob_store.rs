use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{AltifyError, Result};
use crate::ports::BlobStore;

/// In-memory [`BlobStore`]. `put` is put-if-absent, matching the real
/// contract: a second `put` of the same key is a silent no-op.
#[derive(Default)]
pub struct FakeBlobStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl FakeBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStore for FakeBlobStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<()> {
        let mut objects = self.objects.lock().unwrap();
        objects.entry(key.to_string()).or_insert(bytes);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let objects = self.objects.lock().unwrap();
        objects
            .get(key)
            .cloned()
            .ok_or_else(|| AltifyError::NotFound(format!("blob {key} not found")))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut objects = self.objects.lock().unwrap();
        objects.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let objects = self.objects.lock().unwrap();
        Ok(objects.contains_key(key))
    }
}
