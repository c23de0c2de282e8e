// Mistral chat completions adapter
// API Reference: https://docs.mistral.ai/api/#tag/chat
//
// Streaming responses are server-sent events carrying OpenAI-style
// `choices[].delta.content` fragments and end with `data: [DONE]`.

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::llm::provider::LLMAdapter;
use crate::llm::sse::{SseDecoder, DONE_MARKER};
use crate::types::{AppError, AppResult, LLMRequest, LLMResponse, TokenUsage};

pub const MISTRAL_API_BASE: &str = "https://api.mistral.ai/v1";

pub struct MistralAdapter {
    client: Client,
    api_key: String,
    api_base: String,
}

#[derive(Serialize)]
struct MistralChatRequest<'a> {
    model: &'a str,
    messages: Vec<MistralMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Serialize)]
struct MistralMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MistralChatResponse {
    choices: Vec<MistralChoice>,
    #[serde(default)]
    usage: Option<MistralUsage>,
}

#[derive(Deserialize)]
struct MistralChoice {
    message: MistralResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct MistralResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct MistralUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Deserialize)]
struct MistralStreamChunk {
    choices: Vec<MistralStreamChoice>,
}

#[derive(Deserialize)]
struct MistralStreamChoice {
    delta: MistralDelta,
}

#[derive(Deserialize)]
struct MistralDelta {
    #[serde(default)]
    content: Option<String>,
}

impl MistralAdapter {
    pub fn new(api_key: &str) -> Self {
        Self::with_api_base(api_key, MISTRAL_API_BASE)
    }

    pub fn with_api_base(api_key: &str, api_base: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    fn build_request<'a>(request: &'a LLMRequest, stream: bool) -> MistralChatRequest<'a> {
        let system = request
            .system_instruction
            .as_deref()
            .map(|content| MistralMessage { role: "system", content });

        let messages = system
            .into_iter()
            .chain(request.messages.iter().map(|m| MistralMessage {
                role: m.role.as_str(),
                content: m.content.as_str(),
            }))
            .collect();

        MistralChatRequest {
            model: &request.model,
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stream,
        }
    }

    async fn post(&self, body: &MistralChatRequest<'_>) -> AppResult<reqwest::Response> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::LLMApi(format!("Mistral request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::LLMApi(format!("Mistral API error ({}): {}", status, error_text)));
        }
        Ok(response)
    }
}

/// Parse one SSE payload into the text delta it carries, if any
fn parse_stream_payload(payload: &str) -> Option<AppResult<String>> {
    if payload == DONE_MARKER || payload.trim().is_empty() {
        return None;
    }

    match serde_json::from_str::<MistralStreamChunk>(payload) {
        Ok(chunk) => {
            let text: String = chunk
                .choices
                .into_iter()
                .filter_map(|choice| choice.delta.content)
                .collect();
            (!text.is_empty()).then_some(Ok(text))
        }
        Err(e) => Some(Err(AppError::LLMApi(format!("Malformed stream chunk: {}", e)))),
    }
}

#[async_trait]
impl LLMAdapter for MistralAdapter {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        let body = Self::build_request(request, false);
        let response: MistralChatResponse = self
            .post(&body)
            .await?
            .json()
            .await
            .map_err(|e| AppError::LLMApi(format!("Failed to parse Mistral response: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::LLMApi("Mistral returned no choices".to_string()))?;

        let usage = response
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();

        Ok(LLMResponse {
            content: choice.message.content.unwrap_or_default(),
            finish_reason: choice.finish_reason.unwrap_or_else(|| "stop".to_string()),
            usage,
        })
    }

    async fn create_chat_completion_stream(
        &self,
        request: &LLMRequest,
    ) -> AppResult<BoxStream<'static, AppResult<String>>> {
        let body = Self::build_request(request, true);
        let response = self.post(&body).await?;
        debug!(model = %request.model, "Streaming Mistral completion");

        let mut decoder = SseDecoder::new();
        let deltas = response
            .bytes_stream()
            .map(move |chunk| match chunk {
                Ok(bytes) => decoder
                    .feed(&bytes)
                    .iter()
                    .filter_map(|payload| parse_stream_payload(payload))
                    .collect::<Vec<_>>(),
                Err(e) => {
                    warn!(error = %e, "Mistral stream interrupted");
                    vec![Err(AppError::LLMApi(format!("Stream interrupted: {}", e)))]
                }
            })
            .flat_map(stream::iter);

        Ok(deltas.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LLMMessage;
    use mockito::Matcher;

    fn request() -> LLMRequest {
        LLMRequest {
            model: "mistral-small-latest".to_string(),
            messages: vec![LLMMessage::user("What is in the document?")],
            max_tokens: Some(1024),
            temperature: None,
            system_instruction: Some("Be brief.".to_string()),
        }
    }

    #[test]
    fn test_system_instruction_comes_first() {
        let req = request();
        let body = serde_json::to_value(MistralAdapter::build_request(&req, true)).unwrap();
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "Be brief.");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["stream"], true);
        assert_eq!(body["max_tokens"], 1024);
        assert!(body.get("temperature").is_none());
    }

    #[test]
    fn test_parse_stream_payload() {
        assert!(parse_stream_payload("[DONE]").is_none());
        assert!(parse_stream_payload(r#"{"choices":[{"index":0,"delta":{"role":"assistant"}}]}"#).is_none());
        let text = parse_stream_payload(r#"{"choices":[{"index":0,"delta":{"content":"Hi"}}]}"#)
            .unwrap()
            .unwrap();
        assert_eq!(text, "Hi");
        assert!(parse_stream_payload("{not json").unwrap().is_err());
    }

    #[tokio::test]
    async fn test_chat_completion() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer key")
            .match_body(Matcher::PartialJson(serde_json::json!({"stream": false})))
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"Answer"},"finish_reason":"stop"}],
                    "usage":{"prompt_tokens":10,"completion_tokens":2,"total_tokens":12}}"#,
            )
            .create_async()
            .await;

        let adapter = MistralAdapter::with_api_base("key", &format!("{}/v1", server.url()));
        let response = adapter.create_chat_completion(&request()).await.unwrap();
        assert_eq!(response.content, "Answer");
        assert_eq!(response.finish_reason, "stop");
        assert_eq!(response.usage.total_tokens, 12);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_streaming_completion() {
        let mut server = mockito::Server::new_async().await;
        let events = concat!(
            "data: {\"choices\":[{\"index\":0,\"delta\":{\"role\":\"assistant\",\"content\":\"\"}}]}\n\n",
            "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"The answer\"}}]}\n\n",
            "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\" is 42.\"},\"finish_reason\":\"stop\"}]}\n\n",
            "data: [DONE]\n\n",
        );
        server
            .mock("POST", "/v1/chat/completions")
            .match_body(Matcher::PartialJson(serde_json::json!({"stream": true})))
            .with_header("content-type", "text/event-stream")
            .with_body(events)
            .create_async()
            .await;

        let adapter = MistralAdapter::with_api_base("key", &format!("{}/v1", server.url()));
        let stream = adapter.create_chat_completion_stream(&request()).await.unwrap();
        let chunks: Vec<String> = stream.map(|c| c.unwrap()).collect().await;
        assert_eq!(chunks.concat(), "The answer is 42.");
    }

    #[tokio::test]
    async fn test_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(429)
            .with_body(r#"{"message":"rate limited"}"#)
            .create_async()
            .await;

        let adapter = MistralAdapter::with_api_base("key", &format!("{}/v1", server.url()));
        let result = adapter.create_chat_completion_stream(&request()).await;
        assert!(matches!(result, Err(AppError::LLMApi(msg)) if msg.contains("429")));
    }
}
