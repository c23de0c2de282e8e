use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::str::FromStr;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful, respectful and honest assistant. Please ensure that your \
responses are socially unbiased and positive in nature. If a question does not make any sense, explain why \
instead of answering something not correct. If you don't know the answer to a question, please don't share \
false information. Use the information and context from the document to answer the question. \
Word limit of your response is 700 words.";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub llm: LLMConfig,
    pub rag: RagConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// "drive" or "memory"
    pub provider: String,
    pub folder_id: String,
    pub service_account_file: Option<String>,
    pub access_token: Option<String>,
    pub drive_api_base: String,
    pub drive_upload_base: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LLMConfig {
    pub provider: String,
    pub api_key: String,
    pub api_base: String,
    pub model: String,
    pub embedding_model: String,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
    pub system_prompt: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RagConfig {
    pub similarity_top_k: usize,
    /// Chunk size in tokens
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in tokens
    pub chunk_overlap: usize,
    /// Most document indexes kept in memory; 0 disables caching
    pub index_cache_size: usize,
    pub index_cache_ttl_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup (the process environment
    /// in production, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let config = Self {
            server: ServerConfig {
                port: parse(&lookup, "PORT", 3000)?,
                host: get("HOST", "0.0.0.0"),
                cors_allowed_origins: get("ALLOWED_ORIGINS", "http://localhost:3000")
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            storage: StorageConfig {
                provider: get("STORAGE_PROVIDER", "drive"),
                folder_id: lookup("FOLDER_ID").unwrap_or_default(),
                service_account_file: lookup("SERVICE_ACCOUNT_FILE"),
                access_token: lookup("DRIVE_ACCESS_TOKEN"),
                drive_api_base: get("DRIVE_API_BASE", "https://www.googleapis.com/drive/v3"),
                drive_upload_base: get("DRIVE_UPLOAD_BASE", "https://www.googleapis.com/upload/drive/v3"),
            },
            llm: LLMConfig {
                provider: get("LLM_PROVIDER", "mistral"),
                api_key: lookup("MISTRAL_API_KEY").unwrap_or_default(),
                api_base: get("MISTRAL_API_BASE", "https://api.mistral.ai/v1"),
                model: get("MISTRAL_MODEL_NAME", "mistral-small-latest"),
                embedding_model: get("MISTRAL_EMBED_MODEL", "mistral-embed"),
                max_tokens: parse(&lookup, "LLM_MAX_TOKENS", 1024)?,
                temperature: lookup("LLM_TEMPERATURE")
                    .map(|v| v.parse::<f32>().context("LLM_TEMPERATURE must be a number"))
                    .transpose()?,
                system_prompt: get("LLM_SYSTEM_PROMPT", DEFAULT_SYSTEM_PROMPT),
            },
            rag: RagConfig {
                similarity_top_k: parse(&lookup, "RAG_SIMILARITY_TOP_K", 2)?,
                chunk_size: parse(&lookup, "RAG_CHUNK_SIZE", 1024)?,
                chunk_overlap: parse(&lookup, "RAG_CHUNK_OVERLAP", 200)?,
                index_cache_size: parse(&lookup, "RAG_INDEX_CACHE_SIZE", 16)?,
                index_cache_ttl_secs: parse(&lookup, "RAG_INDEX_CACHE_TTL_SECS", 900)?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.rag.similarity_top_k == 0 {
            anyhow::bail!("RAG_SIMILARITY_TOP_K must be at least 1");
        }
        if self.rag.chunk_size == 0 || self.rag.chunk_overlap >= self.rag.chunk_size {
            anyhow::bail!("RAG_CHUNK_OVERLAP must be smaller than a non-zero RAG_CHUNK_SIZE");
        }
        match self.storage.provider.as_str() {
            "drive" | "memory" => Ok(()),
            other => anyhow::bail!("Unsupported STORAGE_PROVIDER: {}", other),
        }
    }
}

fn parse<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {:?}", key, value)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.storage.provider, "drive");
        assert_eq!(config.llm.embedding_model, "mistral-embed");
        assert_eq!(config.llm.max_tokens, 1024);
        assert_eq!(config.llm.temperature, None);
        assert_eq!(config.llm.system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert_eq!(config.rag.similarity_top_k, 2);
        assert_eq!(config.rag.chunk_size, 1024);
        assert_eq!(config.rag.chunk_overlap, 200);
        assert_eq!(config.rag.index_cache_size, 16);
        assert_eq!(config.rag.index_cache_ttl_secs, 900);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("ALLOWED_ORIGINS", "http://a.test, http://b.test,"),
            ("STORAGE_PROVIDER", "memory"),
            ("FOLDER_ID", "folder-1"),
            ("MISTRAL_MODEL_NAME", "mistral-large-latest"),
            ("LLM_TEMPERATURE", "0.2"),
            ("RAG_SIMILARITY_TOP_K", "4"),
            ("RAG_INDEX_CACHE_SIZE", "0"),
            ("RAG_INDEX_CACHE_TTL_SECS", "60"),
        ])
        .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.cors_allowed_origins, vec!["http://a.test", "http://b.test"]);
        assert_eq!(config.storage.provider, "memory");
        assert_eq!(config.storage.folder_id, "folder-1");
        assert_eq!(config.llm.model, "mistral-large-latest");
        assert_eq!(config.llm.temperature, Some(0.2));
        assert_eq!(config.rag.similarity_top_k, 4);
        assert_eq!(config.rag.index_cache_size, 0);
        assert_eq!(config.rag.index_cache_ttl_secs, 60);
    }

    #[test]
    fn test_invalid_values() {
        assert!(config_from(&[("PORT", "eighty")]).is_err());
        assert!(config_from(&[("STORAGE_PROVIDER", "s3")]).is_err());
        assert!(config_from(&[("RAG_CHUNK_SIZE", "100"), ("RAG_CHUNK_OVERLAP", "100")]).is_err());
        assert!(config_from(&[("RAG_SIMILARITY_TOP_K", "0")]).is_err());
    }
}
