use std::collections::HashMap;
use std::io::Cursor;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::error::StorageError;
use super::key::ObjectKey;
use super::traits::{BoxReader, ObjectMeta, ObjectStore};

/// In-process object store, used by the offline backend and tests.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<ObjectKey, Vec<u8>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, key: &ObjectKey, data: &[u8]) -> Result<ObjectMeta, StorageError> {
        self.objects.write().await.insert(key.clone(), data.to_vec());
        Ok(ObjectMeta::of(data))
    }

    async fn get_stream(&self, key: &ObjectKey) -> Result<BoxReader, StorageError> {
        let data = self.get(key).await?;
        Ok(Box::new(Cursor::new(data)))
    }

    async fn get(&self, key: &ObjectKey) -> Result<Vec<u8>, StorageError> {
        self.objects
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn exists(&self, key: &ObjectKey) -> Result<bool, StorageError> {
        Ok(self.objects.read().await.contains_key(key))
    }

    async fn delete(&self, key: &ObjectKey) -> Result<bool, StorageError> {
        Ok(self.objects.write().await.remove(key).is_some())
    }
}
