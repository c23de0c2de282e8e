// SpeakingDoc - chat with an uploaded document through a hosted LLM

pub mod config;
pub mod data_registry;
pub mod embeddings;
pub mod extraction;
pub mod llm;
pub mod middleware;
pub mod models;
pub mod qa;
pub mod routes;
pub mod storage;
pub mod types;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
