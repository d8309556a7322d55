use std::env;

use serde::{Deserialize, Serialize};

use crate::scrape::chunk::ChunkingConfig;

/// Typed view of the merged YAML configuration.
///
/// Every section has serde defaults so an absent or empty config file
/// produces a runnable local setup (SQLite index, OpenAI defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub server: ServerConfig,
    pub models: ModelConfig,
    pub vector_index: IndexConfig,
    pub chunking: ChunkingConfig,
    pub fetch: FetchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            cors_allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub base_url: String,
    pub api_key: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub request_timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            api_key: String::new(),
            chat_model: "gpt-4".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            request_timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Index backend: "sqlite" (local, default) or "pinecone".
    pub provider: String,
    pub api_key: String,
    pub index_host: String,
    pub top_k: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            provider: "sqlite".to_string(),
            api_key: String::new(),
            index_host: String::new(),
            top_k: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl RuntimeConfig {
    /// Environment variables take precedence over file values for
    /// secrets and endpoints.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = env::var("OPENAI_API_KEY") {
            if !key.trim().is_empty() {
                self.models.api_key = key;
            }
        }
        if let Ok(key) = env::var("PINECONE_API_KEY") {
            if !key.trim().is_empty() {
                self.vector_index.api_key = key;
            }
        }
        if let Ok(host) = env::var("PINECONE_INDEX_HOST") {
            if !host.trim().is_empty() {
                self.vector_index.index_host = host;
            }
        }
    }
}
