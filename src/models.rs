use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::data_registry::DocumentIndexRegistry;
use crate::qa::QaEngine;
use crate::storage::{create_storage, StorageBackend};
use crate::types::AppResult;

/// Process-wide state, built once at startup and cloned into every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub storage: Arc<dyn StorageBackend>,
    pub qa: Arc<QaEngine>,
    pub indexes: DocumentIndexRegistry,
}

impl AppState {
    pub fn new(config: Config, storage: Arc<dyn StorageBackend>, qa: QaEngine) -> Self {
        let indexes = DocumentIndexRegistry::new(
            config.rag.index_cache_size,
            Duration::from_secs(config.rag.index_cache_ttl_secs),
        );
        Self {
            config,
            storage,
            qa: Arc::new(qa),
            indexes,
        }
    }

    pub fn from_config(config: Config) -> AppResult<Self> {
        let storage = create_storage(&config.storage)?;
        let qa = QaEngine::from_config(&config)?;
        Ok(Self::new(config, storage, qa))
    }
}

// API Request/Response types

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct UploadResponse {
    pub file_id: String,
    pub file_name: String,
    pub message: String,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct DeleteResponse {
    pub status: String,
    pub file_id: String,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ChatRequest {
    pub file_id: String,
    pub message: String,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub storage: String,
}
