use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address
    pub bind_addr: String,
    /// JSON file holding the Bible corpus (book code → chapters → verses)
    pub corpus_path: PathBuf,
    /// Pause between the "out of scope" message and the rejection error, in ms
    pub reject_delay_ms: u64,
    /// Upper bound for every call to an external service, in seconds
    pub service_timeout_secs: u64,
    /// Serve vectors from this JSON file instead of Qdrant (offline mode)
    pub vectors_path: Option<PathBuf>,
    /// Embedding + classification provider
    pub llm: LlmConfig,
    /// Vector index
    pub qdrant: QdrantConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "ollama" or "openai"
    pub provider: String,
    /// Base URL for the LLM API
    pub base_url: String,
    /// Model name for query classification
    pub chat_model: String,
    /// Model name for embeddings
    pub embedding_model: String,
    /// API key (only needed for cloud providers)
    pub api_key: Option<String>,
    /// Embedding vector dimension
    pub embedding_dim: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QdrantConfig {
    pub url: String,
    pub api_key: Option<String>,
    /// Pre-populated collection holding one point per verse chunk
    pub collection: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:9000".to_string(),
            corpus_path: PathBuf::from("./data/bible-vie1934.json"),
            reject_delay_ms: 400,
            service_timeout_secs: 30,
            vectors_path: None,
            llm: LlmConfig::default(),
            qdrant: QdrantConfig::default(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            base_url: "https://api.openai.com".to_string(),
            chat_model: "gpt-4o-mini".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            api_key: None,
            embedding_dim: 1536,
        }
    }
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6333".to_string(),
            api_key: None,
            collection: "bible_vietnamese".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. `from_env` is the only
    /// production caller; tests pass a map.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = get("BIBLE_SEARCH_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Some(path) = get("BIBLE_SEARCH_CORPUS_PATH") {
            config.corpus_path = PathBuf::from(path);
        }
        if let Some(v) = get("BIBLE_SEARCH_REJECT_DELAY_MS").and_then(|v| v.parse().ok()) {
            config.reject_delay_ms = v;
        }
        if let Some(v) = get("SERVICE_TIMEOUT_SECS").and_then(|v| v.parse::<u64>().ok()) {
            config.service_timeout_secs = v.clamp(1, 120);
        }
        if let Some(path) = get("BIBLE_SEARCH_VECTORS_PATH").filter(|p| !p.is_empty()) {
            config.vectors_path = Some(PathBuf::from(path));
        }

        if let Some(provider) = get("LLM_PROVIDER") {
            config.llm.provider = provider;
        }
        if let Some(url) = get("LLM_BASE_URL") {
            config.llm.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(model) = get("LLM_CHAT_MODEL") {
            config.llm.chat_model = model;
        }
        if let Some(model) = get("LLM_EMBEDDING_MODEL") {
            config.llm.embedding_model = model;
        }
        if let Some(key) = get("LLM_API_KEY").or_else(|| get("OPENAI_API_KEY")) {
            config.llm.api_key = Some(key);
        }
        if let Some(d) = get("LLM_EMBEDDING_DIM").and_then(|v| v.parse().ok()) {
            config.llm.embedding_dim = d;
        }

        if let Some(url) = get("QDRANT_URL") {
            config.qdrant.url = url.trim_end_matches('/').to_string();
        }
        if let Some(key) = get("QDRANT_API_KEY") {
            config.qdrant.api_key = Some(key);
        }
        if let Some(name) = get("QDRANT_COLLECTION") {
            config.qdrant.collection = name;
        }

        config
    }
}
