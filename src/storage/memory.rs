//! In-process storage backend.
//!
//! Keeps uploaded files in a map for local development and tests. Nothing
//! survives a restart.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{StorageBackend, StoredFile};
use crate::types::{AppError, AppResult};

#[derive(Debug, Clone)]
struct MemoryObject {
    name: String,
    folder_id: String,
    file: StoredFile,
}

#[derive(Clone, Default)]
pub struct MemoryStorage {
    objects: Arc<RwLock<HashMap<String, MemoryObject>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    async fn upload(&self, name: &str, data: Vec<u8>, mime_type: &str, folder_id: &str) -> AppResult<String> {
        let id = Uuid::new_v4().to_string();
        let object = MemoryObject {
            name: name.to_string(),
            folder_id: folder_id.to_string(),
            file: StoredFile {
                mime_type: mime_type.to_string(),
                data,
            },
        };
        debug!(file_id = %id, name = %object.name, folder_id = %object.folder_id, "Stored file in memory");
        self.objects.write().await.insert(id.clone(), object);
        Ok(id)
    }

    async fn fetch(&self, file_id: &str) -> AppResult<StoredFile> {
        self.objects
            .read()
            .await
            .get(file_id)
            .map(|object| object.file.clone())
            .ok_or_else(|| AppError::NotFound(format!("file {}", file_id)))
    }

    async fn delete(&self, file_id: &str) -> AppResult<()> {
        self.objects
            .write()
            .await
            .remove(file_id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("file {}", file_id)))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
