//! API Routes
//!
//! - `/` - Upload and chat screens
//! - `/api/files` - Document upload and deletion
//! - `/api/chat` - Streaming answers about an uploaded document
//! - `/api/health` - Health checks

pub mod chat;
pub mod files;
pub mod health;
pub mod ui;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::middleware::cors_layer;
use crate::models::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let cors = cors_layer(&state.config.server.cors_allowed_origins);

    Router::new()
        .merge(chat::router(state.clone()))
        .merge(files::router(state.clone()))
        .merge(health::router(state))
        .merge(ui::router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}

#[cfg(test)]
pub(crate) mod testing {
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use axum::response::Response;
    use serde::de::DeserializeOwned;
    use std::sync::Arc;

    use crate::config::Config;
    use crate::models::AppState;
    use crate::qa::testing::{qa_engine, RecordingAdapter};
    use crate::storage::MemoryStorage;

    const BOUNDARY: &str = "speakingdoc-test-boundary";

    pub fn test_config() -> Config {
        Config::from_lookup(|key| match key {
            "STORAGE_PROVIDER" => Some("memory".to_string()),
            "FOLDER_ID" => Some("test-folder".to_string()),
            _ => None,
        })
        .unwrap()
    }

    /// State over in-memory storage, the hashing embedder and a recording LLM
    pub fn test_state() -> (AppState, MemoryStorage, Arc<RecordingAdapter>) {
        let storage = MemoryStorage::new();
        let (engine, adapter) = qa_engine(2);
        let state = AppState::new(test_config(), Arc::new(storage.clone()), engine);
        (state, storage, adapter)
    }

    pub fn multipart_request(file_name: &str, data: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
                file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/files")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    pub async fn read_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    pub async fn read_json<T: DeserializeOwned>(response: Response) -> T {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }
}
