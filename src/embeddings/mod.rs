// Embeddings, chunking and vector search

use async_trait::async_trait;

use crate::types::AppResult;

pub mod mistral;
pub mod text_chunker;
pub mod vector_search;

pub use mistral::*;
pub use text_chunker::*;
pub use vector_search::*;

/// Maps texts to fixed-size vectors, one per input, in input order
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;
}
