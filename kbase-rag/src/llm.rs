//! Language model client for answer generation.
//!
//! [`ChatCompletionModel`] talks to any OpenAI-compatible
//! `/chat/completions` endpoint; the default configuration targets
//! Perplexity's `sonar` model.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::config::ModelConfig;
use crate::error::{RagError, Result};

/// A text-in, text-out language model.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Model identifier used in logs and error messages.
    fn name(&self) -> &str;

    /// Send `prompt` as a single user message and return the reply text.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// A [`LanguageModel`] backed by an OpenAI-compatible chat completions API.
pub struct ChatCompletionModel {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
}

impl ChatCompletionModel {
    /// Create a client from model settings.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if the API key is empty or the HTTP
    /// client cannot be constructed.
    pub fn new(config: &ModelConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(RagError::ConfigError("model API key must not be empty".into()));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RagError::ConfigError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    /// Create a client with the default endpoint, model and a 0 temperature.
    pub fn with_api_key(api_key: impl Into<String>) -> Result<Self> {
        Self::new(&ModelConfig::new(api_key))
    }

    fn failure(&self, message: String) -> RagError {
        RagError::UpstreamError { model: self.model.clone(), message }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatRequestMessage<'a>; 1],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatRequestMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

#[async_trait]
impl LanguageModel for ChatCompletionModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        debug!(model = %self.model, prompt_len = prompt.len(), "requesting completion");

        let body = ChatRequest {
            model: &self.model,
            messages: [ChatRequestMessage { role: "user", content: prompt }],
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(
                    model = %self.model,
                    error = %e,
                    timeout = e.is_timeout(),
                    "completion request failed"
                );
                self.failure(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            error!(model = %self.model, %status, "completion API error");
            return Err(self.failure(format!("API returned {status}: {detail}")));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            error!(model = %self.model, error = %e, "failed to parse completion");
            self.failure(format!("failed to parse response: {e}"))
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| self.failure("response contained no message content".into()))
    }
}
