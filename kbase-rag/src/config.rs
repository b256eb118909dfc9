//! Configuration for the retrieval pipeline and the session around it.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};
use crate::openai::DEFAULT_EMBEDDING_TIMEOUT;

/// Default directory holding the persisted vector index.
pub const DEFAULT_INDEX_DIR: &str = "./kbase_index";

/// Default OpenAI-compatible endpoint for answer generation.
pub const DEFAULT_MODEL_BASE_URL: &str = "https://api.perplexity.ai";

/// Default chat model.
pub const DEFAULT_MODEL: &str = "sonar";

/// Environment variable holding the language model credential.
pub const API_KEY_ENV: &str = "PERPLEXITY_API_KEY";

/// Configuration parameters for chunking and retrieval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of chunks handed to the answer generator.
    pub top_k: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self { chunk_size: 500, chunk_overlap: 50, top_k: 3 }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of chunks retrieved per question.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `chunk_size == 0`
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k == 0`
    pub fn build(self) -> Result<RagConfig> {
        if self.config.chunk_size == 0 {
            return Err(RagError::ConfigError("chunk_size must be greater than zero".to_string()));
        }
        if self.config.chunk_overlap >= self.config.chunk_size {
            return Err(RagError::ConfigError(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.config.chunk_overlap, self.config.chunk_size
            )));
        }
        if self.config.top_k == 0 {
            return Err(RagError::ConfigError("top_k must be greater than zero".to_string()));
        }
        Ok(self.config)
    }
}

/// Settings for the chat-completion model used to generate answers.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    /// Bearer credential for the model API.
    pub api_key: String,
    /// Base URL of an OpenAI-compatible API (without `/chat/completions`).
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// Sampling temperature; 0 gives deterministic decoding.
    pub temperature: f32,
    /// Upper bound on a single completion request.
    pub timeout: Duration,
}

impl ModelConfig {
    /// Settings for the default endpoint and model with the given key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_MODEL_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Which embedding provider the session uses.
#[derive(Debug, Clone, PartialEq)]
pub enum EmbeddingConfig {
    /// Local feature-hashing embeddings; no network access.
    Hashing {
        /// Length of each vector.
        dimensions: usize,
    },
    /// An OpenAI-compatible `/embeddings` endpoint.
    OpenAI {
        /// Bearer credential.
        api_key: String,
        /// Base URL (without `/embeddings`).
        base_url: String,
        /// Embedding model identifier.
        model: String,
        /// Requested output dimensions, if the model supports truncation.
        dimensions: Option<usize>,
        /// Limit on each embeddings request.
        timeout: Duration,
    },
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        EmbeddingConfig::Hashing { dimensions: 384 }
    }
}

/// Everything needed to construct a [`KnowledgeSession`](crate::KnowledgeSession).
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Chunking and retrieval parameters.
    pub rag: RagConfig,
    /// Directory holding the persisted index.
    pub index_dir: PathBuf,
    /// Timeout for fetching web pages.
    pub fetch_timeout: Duration,
    /// Answer model settings.
    pub model: ModelConfig,
    /// Embedding provider settings.
    pub embedding: EmbeddingConfig,
}

impl SessionConfig {
    /// Session defaults with the given model credential.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            rag: RagConfig::default(),
            index_dir: PathBuf::from(DEFAULT_INDEX_DIR),
            fetch_timeout: Duration::from_secs(10),
            model: ModelConfig::new(api_key),
            embedding: EmbeddingConfig::default(),
        }
    }

    /// Read the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `PERPLEXITY_API_KEY` is missing or
    /// any numeric setting fails to parse.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_key = get(API_KEY_ENV)
            .ok_or_else(|| RagError::ConfigError(format!("{API_KEY_ENV} is not set")))?;
        let mut config = SessionConfig::new(api_key);

        if let Some(model) = get("KBASE_MODEL") {
            config.model.model = model;
        }
        if let Some(base_url) = get("KBASE_MODEL_BASE_URL") {
            config.model.base_url = base_url;
        }
        if let Some(dir) = get("KBASE_INDEX_DIR") {
            config.index_dir = PathBuf::from(dir);
        }
        if let Some(secs) = parse_var::<u64>(&get, "KBASE_MODEL_TIMEOUT_SECS")? {
            config.model.timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64>(&get, "KBASE_FETCH_TIMEOUT_SECS")? {
            config.fetch_timeout = Duration::from_secs(secs);
        }

        let mut rag = RagConfig::builder();
        if let Some(size) = parse_var(&get, "KBASE_CHUNK_SIZE")? {
            rag = rag.chunk_size(size);
        }
        if let Some(overlap) = parse_var(&get, "KBASE_CHUNK_OVERLAP")? {
            rag = rag.chunk_overlap(overlap);
        }
        if let Some(k) = parse_var(&get, "KBASE_TOP_K")? {
            rag = rag.top_k(k);
        }
        config.rag = rag.build()?;

        let dimensions = parse_var::<usize>(&get, "KBASE_EMBEDDING_DIMENSIONS")?;
        config.embedding = match get("OPENAI_API_KEY") {
            Some(api_key) => EmbeddingConfig::OpenAI {
                api_key,
                base_url: get("KBASE_EMBEDDING_BASE_URL")
                    .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
                model: get("KBASE_EMBEDDING_MODEL")
                    .unwrap_or_else(|| "text-embedding-3-small".to_string()),
                dimensions,
                timeout: parse_var::<u64>(&get, "KBASE_EMBEDDING_TIMEOUT_SECS")?
                    .map_or(DEFAULT_EMBEDDING_TIMEOUT, Duration::from_secs),
            },
            None => EmbeddingConfig::Hashing { dimensions: dimensions.unwrap_or(384) },
        };

        Ok(config)
    }
}

fn parse_var<T: std::str::FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>> {
    match get(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| RagError::ConfigError(format!("{key} has an invalid value '{raw}'"))),
    }
}
