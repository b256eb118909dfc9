use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tracing::{error, info};

use crate::document::Document;
use crate::error::{RagError, Result};

use super::decode_entities;

/// Default limit on fetching one page.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

static HIDDEN_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b.*?</script\s*>|<style\b.*?</style\s*>|<!--.*?-->")
        .expect("unreachable error: invalid hidden block pattern")
});

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("unreachable error: invalid tag pattern"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("unreachable error: invalid whitespace pattern"));

/// Fetches a web page and keeps its visible text.
#[derive(Debug, Clone)]
pub struct WebLoader {
    client: reqwest::Client,
}

impl WebLoader {
    /// Create a loader whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RagError::ConfigError(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Fetch `url` and return one document whose source is the URL.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::FetchError`] for an invalid URL, a transport error
    /// or timeout, a non-success status, or an unreadable body.
    pub async fn fetch(&self, url: &str) -> Result<Vec<Document>> {
        let failure = |message: String| {
            error!(url, error = %message, "failed to fetch page");
            RagError::FetchError { url: url.to_string(), message }
        };

        let parsed = reqwest::Url::parse(url).map_err(|e| failure(format!("invalid URL: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(failure(format!("unsupported scheme '{}'", parsed.scheme())));
        }

        let response = self.client.get(parsed).send().await.map_err(|e| {
            if e.is_timeout() {
                failure(format!("request timed out: {e}"))
            } else {
                failure(format!("request failed: {e}"))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(failure(format!("server returned {status}")));
        }

        let html = response.text().await.map_err(|e| failure(format!("failed to read body: {e}")))?;
        let text = visible_text(&html);
        info!(url, chars = text.chars().count(), "fetched page");
        Ok(vec![Document::new(text, url)])
    }
}

/// Drop scripts, styles, comments and tags, then collapse whitespace.
pub(crate) fn visible_text(html: &str) -> String {
    let without_blocks = HIDDEN_BLOCK.replace_all(html, " ");
    let without_tags = TAG.replace_all(&without_blocks, " ");
    let decoded = decode_entities(&without_tags);
    WHITESPACE.replace_all(&decoded, " ").trim().to_string()
}
