// LLM abstraction layer

pub mod mistral;
pub mod provider;
pub mod sse;

pub use provider::*;
pub use crate::types::{LLMMessage, LLMRequest, LLMResponse, TokenUsage};
