//! Deterministic embedder and LLM stand-ins for tests

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

use super::{QaEngine, QaSettings};
use crate::embeddings::{Embedder, TextChunker};
use crate::llm::{LLMAdapter, LLM};
use crate::types::{AppResult, LLMRequest, LLMResponse, TokenUsage};

const DIMENSION: usize = 256;

/// Bag-of-words vectors: each lowercase word increments one hashed bucket
pub struct HashingEmbedder;

impl HashingEmbedder {
    pub fn vector(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; DIMENSION];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            vector[(hasher.finish() % DIMENSION as u64) as usize] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }
}

/// Records every request and answers with an echo of the prompt
#[derive(Default)]
pub struct RecordingAdapter {
    requests: Mutex<Vec<LLMRequest>>,
}

impl RecordingAdapter {
    pub fn answer_for(prompt: &str) -> String {
        format!("Echo: {}", prompt)
    }

    pub fn last_request(&self) -> Option<LLMRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    fn record(&self, request: &LLMRequest) -> String {
        self.requests.lock().unwrap().push(request.clone());
        let prompt = request.messages.last().map(|m| m.content.as_str()).unwrap_or_default();
        Self::answer_for(prompt)
    }
}

#[async_trait]
impl LLMAdapter for RecordingAdapter {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        Ok(LLMResponse {
            content: self.record(request),
            finish_reason: "stop".to_string(),
            usage: TokenUsage::default(),
        })
    }

    async fn create_chat_completion_stream(
        &self,
        request: &LLMRequest,
    ) -> AppResult<BoxStream<'static, AppResult<String>>> {
        let answer = self.record(request);
        let (head, tail) = answer.split_at("Echo: ".len());
        let pieces = vec![Ok(head.to_string()), Ok(tail.to_string())];
        Ok(stream::iter(pieces).boxed())
    }
}

/// Engine with 240-character chunks, the hashing embedder and a recording LLM
pub fn qa_engine(similarity_top_k: usize) -> (QaEngine, Arc<RecordingAdapter>) {
    let adapter = Arc::new(RecordingAdapter::default());
    let engine = QaEngine::new(
        LLM::with_adapter("recording", adapter.clone()),
        Arc::new(HashingEmbedder),
        TextChunker::new(60, 0),
        QaSettings {
            model: "test-model".to_string(),
            max_tokens: 256,
            temperature: None,
            system_prompt: "system prompt".to_string(),
            similarity_top_k,
        },
    );
    (engine, adapter)
}
