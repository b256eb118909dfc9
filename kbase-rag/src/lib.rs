//! # kbase-rag
//!
//! Retrieval-augmented question answering over a personal knowledge base.
//!
//! Documents are loaded from PDF, plain text, Markdown, Word files or web
//! pages, split into overlapping chunks, embedded and stored in a vector
//! index persisted to a local directory. Questions retrieve the most similar
//! chunks and a language model answers from that context only.
//!
//! ## Components
//!
//! - **Loaders** ([`loader`]): file and web page extraction
//! - **Chunking** ([`RecursiveChunker`]): separator-aware splitting with overlap
//! - **Embeddings** ([`EmbeddingProvider`]): [`HashingEmbeddingProvider`] (offline)
//!   and [`OpenAIEmbeddingProvider`]
//! - **Storage** ([`VectorStore`]): [`LocalVectorStore`] and [`InMemoryVectorStore`]
//! - **Retrieval** ([`VectorIndex`], [`Retriever`]) and generation ([`AnswerGenerator`])
//! - **Session** ([`KnowledgeSession`]): ingest, ask and reset
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use kbase_rag::{DocumentSource, KnowledgeSession, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> kbase_rag::Result<()> {
//!     let mut session = KnowledgeSession::from_config(SessionConfig::from_env()?).await?;
//!     session.ingest(DocumentSource::parse("handbook.pdf")).await?;
//!     println!("{}", session.ask("What is the refund policy?").await);
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod generator;
pub mod hashing;
pub mod index;
pub mod inmemory;
pub mod llm;
pub mod loader;
pub mod local;
pub mod openai;
pub mod retriever;
pub mod session;
pub mod vectorstore;

pub use chunking::{Chunker, RecursiveChunker};
pub use config::{EmbeddingConfig, ModelConfig, RagConfig, RagConfigBuilder, SessionConfig};
pub use document::{Chunk, Document, IndexedChunk, Metadata, MetadataValue, SearchResult};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use generator::{AnswerGenerator, build_prompt};
pub use hashing::HashingEmbeddingProvider;
pub use index::VectorIndex;
pub use inmemory::InMemoryVectorStore;
pub use llm::{ChatCompletionModel, LanguageModel};
pub use loader::{DocumentLoader, WebLoader};
pub use local::LocalVectorStore;
pub use openai::OpenAIEmbeddingProvider;
pub use retriever::Retriever;
pub use session::{
    AskOutcome, ChatMessage, DocumentSource, IngestReport, KnowledgeSession,
    KnowledgeSessionBuilder, NO_DOCUMENTS_MESSAGE, Role, SessionState,
};
pub use vectorstore::VectorStore;
