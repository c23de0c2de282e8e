use async_trait::async_trait;
use futures::stream::BoxStream;
use std::sync::Arc;

use crate::types::{AppError, AppResult, LLMRequest, LLMResponse};

#[async_trait]
pub trait LLMAdapter: Send + Sync {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse>;

    /// Stream the completion as text deltas. The stream is finite and cannot
    /// be restarted.
    async fn create_chat_completion_stream(
        &self,
        request: &LLMRequest,
    ) -> AppResult<BoxStream<'static, AppResult<String>>>;
}

/// Configuration for the hosted LLM provider
pub struct LLMProviderConfig {
    pub name: String,
    pub api_key: String,
    pub api_base: Option<String>,
}

#[derive(Clone)]
pub struct LLM {
    adapter: Arc<dyn LLMAdapter>,
    provider_name: String,
}

impl LLM {
    pub fn new(provider: LLMProviderConfig) -> AppResult<Self> {
        let adapter: Arc<dyn LLMAdapter> = match provider.name.as_str() {
            "mistral" => {
                let adapter = match provider.api_base.as_deref() {
                    Some(base) => crate::llm::mistral::MistralAdapter::with_api_base(&provider.api_key, base),
                    None => crate::llm::mistral::MistralAdapter::new(&provider.api_key),
                };
                Arc::new(adapter)
            }
            other => return Err(AppError::Config(format!("Unsupported LLM provider: {}", other))),
        };

        Ok(Self {
            adapter,
            provider_name: provider.name,
        })
    }

    /// Wrap an existing adapter (alternative providers, tests)
    pub fn with_adapter(provider_name: impl Into<String>, adapter: Arc<dyn LLMAdapter>) -> Self {
        Self {
            adapter,
            provider_name: provider_name.into(),
        }
    }

    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    pub async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        self.adapter.create_chat_completion(request).await
    }

    pub async fn create_chat_completion_stream(
        &self,
        request: &LLMRequest,
    ) -> AppResult<BoxStream<'static, AppResult<String>>> {
        self.adapter.create_chat_completion_stream(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_selection() {
        let llm = LLM::new(LLMProviderConfig {
            name: "mistral".to_string(),
            api_key: "key".to_string(),
            api_base: None,
        })
        .unwrap();
        assert_eq!(llm.provider_name(), "mistral");

        let err = LLM::new(LLMProviderConfig {
            name: "unknown".to_string(),
            api_key: "key".to_string(),
            api_base: None,
        })
        .err()
        .unwrap();
        assert!(matches!(err, AppError::Config(_)));
    }
}
