//! Question answering over an uploaded document.
//!
//! `build_index` chunks and embeds the extracted text; `query` retrieves the
//! most similar chunks for a question and streams the LLM answer grounded on
//! them. The engine is built once at startup and shared by every request.

use futures::stream::{self, BoxStream, StreamExt};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::Config;
use crate::embeddings::{DocumentIndex, Embedder, IndexedChunk, MistralEmbedder, TextChunker};
use crate::llm::{LLMProviderConfig, LLM};
use crate::types::{AppError, AppResult, LLMMessage, LLMRequest};

#[cfg(test)]
pub(crate) mod testing;

/// Shown to the user whenever a question cannot be answered
pub const QUERY_FAILED_MESSAGE: &str = "Query did not run due to an error !!";

#[derive(Debug, Clone)]
pub struct QaSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
    pub system_prompt: String,
    pub similarity_top_k: usize,
}

pub struct QaEngine {
    llm: LLM,
    embedder: Arc<dyn Embedder>,
    chunker: TextChunker,
    settings: QaSettings,
}

impl QaEngine {
    pub fn new(llm: LLM, embedder: Arc<dyn Embedder>, chunker: TextChunker, settings: QaSettings) -> Self {
        Self {
            llm,
            embedder,
            chunker,
            settings,
        }
    }

    pub fn from_config(config: &Config) -> AppResult<Self> {
        if config.llm.api_key.is_empty() {
            return Err(AppError::Config("MISTRAL_API_KEY must be set".to_string()));
        }

        let llm = LLM::new(LLMProviderConfig {
            name: config.llm.provider.clone(),
            api_key: config.llm.api_key.clone(),
            api_base: Some(config.llm.api_base.clone()),
        })?;
        let embedder = MistralEmbedder::with_api_base(
            &config.llm.api_key,
            &config.llm.embedding_model,
            &config.llm.api_base,
        );

        info!(
            provider = %config.llm.provider,
            model = %config.llm.model,
            embedding_model = %config.llm.embedding_model,
            "Initialized question answering engine"
        );

        Ok(Self::new(
            llm,
            Arc::new(embedder),
            TextChunker::new(config.rag.chunk_size, config.rag.chunk_overlap),
            QaSettings {
                model: config.llm.model.clone(),
                max_tokens: config.llm.max_tokens,
                temperature: config.llm.temperature,
                system_prompt: config.llm.system_prompt.clone(),
                similarity_top_k: config.rag.similarity_top_k,
            },
        ))
    }

    /// Chunk and embed a document's text
    pub async fn build_index(&self, text: &str) -> AppResult<DocumentIndex> {
        let chunks = self.chunker.chunk(text);
        if chunks.is_empty() {
            debug!("Document has no text to index");
            return Ok(DocumentIndex::default());
        }

        let embeddings = self.embedder.embed(&chunks).await?;
        if embeddings.len() != chunks.len() {
            return Err(AppError::Embedding(format!(
                "Expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let indexed = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(text, embedding)| IndexedChunk { text, embedding })
            .collect::<Vec<_>>();

        info!(chunk_count = indexed.len(), text_len = text.len(), "Built document index");
        Ok(DocumentIndex::new(indexed))
    }

    /// Answer `question` from the most relevant chunks, streaming the reply
    pub async fn query(
        &self,
        index: &DocumentIndex,
        question: &str,
    ) -> AppResult<BoxStream<'static, AppResult<String>>> {
        let context = self.retrieve(index, question).await?;
        let prompt = render_prompt(&context, question);

        let request = LLMRequest {
            model: self.settings.model.clone(),
            messages: vec![LLMMessage::user(prompt)],
            max_tokens: Some(self.settings.max_tokens),
            temperature: self.settings.temperature,
            system_instruction: Some(self.settings.system_prompt.clone()),
        };

        info!(
            question_len = question.len(),
            context_chunks = context.len(),
            "Running document query"
        );
        self.llm.create_chat_completion_stream(&request).await
    }

    async fn retrieve(&self, index: &DocumentIndex, question: &str) -> AppResult<Vec<String>> {
        if index.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self
            .embedder
            .embed(&[question.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Embedding("No embedding returned for question".to_string()))?;

        Ok(index
            .search(&query_embedding, self.settings.similarity_top_k)
            .into_iter()
            .map(|result| result.chunk.text.clone())
            .collect())
    }
}

/// Context-then-question prompt sent as the user message
pub fn render_prompt(context: &[String], question: &str) -> String {
    format!(
        "Context information is below.\n\
         ---------------------\n\
         {}\n\
         ---------------------\n\
         Given the context information and not prior knowledge, answer the query.\n\
         Query: {}\n\
         Answer: ",
        context.join("\n\n"),
        question
    )
}

/// Stream a fixed message one character at a time
pub fn message_stream(message: &str) -> BoxStream<'static, AppResult<String>> {
    let chars: Vec<AppResult<String>> = message.chars().map(|c| Ok(c.to_string())).collect();
    stream::iter(chars).boxed()
}
