// Storage layer for uploaded documents
//
// Files are addressed by the identifier the backend hands out on upload.

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::StorageConfig;
use crate::types::{AppError, AppResult};

pub mod auth;
pub mod drive;
pub mod memory;

pub use auth::*;
pub use drive::*;
pub use memory::*;

/// A stored document as returned by [`StorageBackend::fetch`]
#[derive(Debug, Clone, PartialEq)]
pub struct StoredFile {
    pub mime_type: String,
    pub data: Vec<u8>,
}

#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Store `data` under `name` inside `folder_id`, returning the new file id
    async fn upload(&self, name: &str, data: Vec<u8>, mime_type: &str, folder_id: &str) -> AppResult<String>;

    async fn fetch(&self, file_id: &str) -> AppResult<StoredFile>;

    async fn delete(&self, file_id: &str) -> AppResult<()>;

    /// Short name used in logs and health checks
    fn name(&self) -> &'static str;
}

/// Build the backend selected by `STORAGE_PROVIDER`
pub fn create_storage(config: &StorageConfig) -> AppResult<Arc<dyn StorageBackend>> {
    match config.provider.as_str() {
        "drive" => {
            let tokens = TokenSource::from_config(config)?;
            Ok(Arc::new(DriveStorage::new(
                tokens,
                &config.drive_api_base,
                &config.drive_upload_base,
            )))
        }
        "memory" => Ok(Arc::new(MemoryStorage::new())),
        other => Err(AppError::Config(format!("Unsupported storage provider: {}", other))),
    }
}
