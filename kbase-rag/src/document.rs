//! Data types for documents, chunks, and search results.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Metadata key holding the file name or URL a document came from.
pub const SOURCE_KEY: &str = "source";

/// Metadata key holding the 1-based page number of a PDF page.
pub const PAGE_KEY: &str = "page";

/// A metadata value: either free text or an integer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum MetadataValue {
    /// An integer value such as a page number.
    Int(i64),
    /// A text value such as a file name.
    Text(String),
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Int(value) => write!(f, "{value}"),
            MetadataValue::Text(value) => f.write_str(value),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::Text(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::Text(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        MetadataValue::Int(value)
    }
}

/// Key-value metadata attached to documents and chunks.
pub type Metadata = HashMap<String, MetadataValue>;

/// A normalized document produced by a loader.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// The text content of the document.
    pub content: String,
    /// Key-value metadata; always contains [`SOURCE_KEY`].
    pub metadata: Metadata,
}

impl Document {
    /// Create a document whose only metadata is its source.
    pub fn new(content: impl Into<String>, source: impl Into<String>) -> Self {
        let mut metadata = Metadata::new();
        metadata.insert(SOURCE_KEY.to_string(), MetadataValue::Text(source.into()));
        Self { content: content.into(), metadata }
    }

    /// Add a metadata entry.
    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<MetadataValue>,
    ) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// The `source` metadata rendered as text, or an empty string if absent.
    pub fn source(&self) -> String {
        self.metadata.get(SOURCE_KEY).map(ToString::to_string).unwrap_or_default()
    }
}

/// A bounded segment of a [`Document`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Identifier of the form `{document_index}-{chunk_index}`.
    pub id: String,
    /// The text content of the chunk.
    pub content: String,
    /// Metadata copied verbatim from the parent document.
    pub metadata: Metadata,
    /// Position of the parent document in the list given to the chunker.
    pub document_index: usize,
}

impl Chunk {
    /// The `source` metadata rendered as text, or an empty string if absent.
    pub fn source(&self) -> String {
        self.metadata.get(SOURCE_KEY).map(ToString::to_string).unwrap_or_default()
    }
}

/// A [`Chunk`] together with its embedding, as held by a vector store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexedChunk {
    /// The stored chunk.
    pub chunk: Chunk,
    /// The vector embedding of the chunk's content.
    pub embedding: Vec<f32>,
}

/// A retrieved [`Chunk`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// The similarity score (higher is more relevant).
    pub score: f32,
}
