//! Error types for the `kbase-rag` crate.

use thiserror::Error;

/// Errors that can occur while loading, indexing, or answering.
///
/// Only [`RagError::ConfigError`] is fatal to a session; every other variant
/// is scoped to the single ingest or ask operation that produced it.
#[derive(Debug, Error)]
pub enum RagError {
    /// A configuration validation error, including a missing model credential.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The file extension is not one of the supported document types.
    #[error("Unsupported file type: {name}")]
    UnsupportedType {
        /// The file name that was rejected.
        name: String,
    },

    /// A file could not be read from disk.
    #[error("Read error ({path}): {message}")]
    ReadError {
        /// The path that was requested.
        path: String,
        /// A description of the failure.
        message: String,
    },

    /// The document bytes could not be decoded as text.
    #[error("Decode error ({source_name}): {message}")]
    DecodeError {
        /// The file name of the document.
        source_name: String,
        /// A description of the failure.
        message: String,
    },

    /// A binary document (PDF, Word) could not be parsed.
    #[error("Parse error ({source_name}): {message}")]
    ParseError {
        /// The file name of the document.
        source_name: String,
        /// A description of the failure.
        message: String,
    },

    /// A web page could not be fetched.
    #[error("Fetch error ({url}): {message}")]
    FetchError {
        /// The requested URL.
        url: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// The language model call failed or timed out.
    #[error("Model error ({model}): {message}")]
    UpstreamError {
        /// The model that was queried.
        model: String,
        /// A description of the failure.
        message: String,
    },
}

impl RagError {
    /// Whether this error must halt the whole session rather than a single operation.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RagError::ConfigError(_))
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
