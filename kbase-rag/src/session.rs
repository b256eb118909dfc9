//! Knowledge-base session.
//!
//! [`KnowledgeSession`] owns everything a conversation with the knowledge
//! base needs: the loaded documents, the vector index built from them, the
//! retriever and answer generator, and the chat history. It replaces any
//! process-wide state; callers create one per user and drive it through
//! [`ingest`](KnowledgeSession::ingest), [`ask`](KnowledgeSession::ask) and
//! [`reset`](KnowledgeSession::reset).
//!
//! # Example
//!
//! ```rust,ignore
//! use kbase_rag::{DocumentSource, KnowledgeSession, SessionConfig};
//!
//! let mut session = KnowledgeSession::from_config(SessionConfig::from_env()?).await?;
//! session.ingest(DocumentSource::Url("https://example.com".into())).await?;
//! let outcome = session.ask("What is this page about?").await;
//! println!("{outcome}");
//! ```

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::chunking::{Chunker, RecursiveChunker};
use crate::config::{EmbeddingConfig, RagConfig, SessionConfig};
use crate::document::{Chunk, Document};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generator::AnswerGenerator;
use crate::hashing::HashingEmbeddingProvider;
use crate::index::VectorIndex;
use crate::llm::{ChatCompletionModel, LanguageModel};
use crate::loader::{self, DEFAULT_FETCH_TIMEOUT, WebLoader};
use crate::local::LocalVectorStore;
use crate::openai::OpenAIEmbeddingProvider;
use crate::retriever::Retriever;
use crate::vectorstore::VectorStore;

/// Answer given when a question arrives before any document was ingested.
pub const NO_DOCUMENTS_MESSAGE: &str = "No documents loaded. Please upload documents first.";

/// Where a batch of documents comes from.
#[derive(Debug, Clone)]
pub enum DocumentSource {
    /// An uploaded file; `name` picks the loader and becomes the source.
    File {
        /// Original file name, including extension.
        name: String,
        /// Raw file contents.
        bytes: Vec<u8>,
    },
    /// A file on the local filesystem.
    Path(PathBuf),
    /// A web page to fetch.
    Url(String),
}

impl DocumentSource {
    /// An uploaded file.
    pub fn file(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        DocumentSource::File { name: name.into(), bytes: bytes.into() }
    }

    /// Treat `input` as a URL when it starts with `http://` or `https://`,
    /// otherwise as a filesystem path.
    pub fn parse(input: &str) -> Self {
        let lower = input.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            DocumentSource::Url(input.to_string())
        } else {
            DocumentSource::Path(PathBuf::from(input))
        }
    }

    /// A human-readable label for logs.
    pub fn label(&self) -> String {
        match self {
            DocumentSource::File { name, .. } => name.clone(),
            DocumentSource::Path(path) => path.display().to_string(),
            DocumentSource::Url(url) => url.clone(),
        }
    }
}

/// Whether the session can answer questions yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No documents loaded.
    Empty,
    /// At least one document is indexed.
    Ready,
}

/// Summary of a successful ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    /// Documents added by this ingest; 0 when the source held no text.
    pub documents_added: usize,
    /// Chunks in the index after the ingest.
    pub chunk_count: usize,
}

/// Result of asking a question.
#[derive(Debug)]
pub enum AskOutcome {
    /// Nothing has been ingested yet.
    NoDocuments,
    /// The model answered using the retrieved chunks.
    Answered {
        /// The model's reply, verbatim.
        text: String,
        /// The chunks the answer was grounded on, best first.
        context: Vec<Chunk>,
    },
    /// Retrieval or generation failed.
    Failed {
        /// The underlying error.
        error: RagError,
    },
}

impl AskOutcome {
    /// The text shown to the user.
    pub fn text(&self) -> String {
        self.to_string()
    }

    /// Whether the model produced an answer.
    pub fn is_answered(&self) -> bool {
        matches!(self, AskOutcome::Answered { .. })
    }
}

impl fmt::Display for AskOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AskOutcome::NoDocuments => f.write_str(NO_DOCUMENTS_MESSAGE),
            AskOutcome::Answered { text, .. } => f.write_str(text),
            AskOutcome::Failed { error } => write!(f, "Error processing question: {error}"),
        }
    }
}

/// Who wrote a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person asking.
    User,
    /// The knowledge base.
    Assistant,
}

/// One entry of the chat history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author of the message.
    pub role: Role,
    /// Message text as displayed.
    pub content: String,
}

/// A question-answering session over an evolving set of documents.
///
/// Mutating operations take `&mut self`, so an ingest, question and reset
/// can never overlap on the same session.
pub struct KnowledgeSession {
    config: RagConfig,
    chunker: Arc<dyn Chunker>,
    index: VectorIndex,
    retriever: Retriever,
    generator: AnswerGenerator,
    web: WebLoader,
    documents: Vec<Document>,
    history: Vec<ChatMessage>,
}

impl KnowledgeSession {
    /// Create a new [`KnowledgeSessionBuilder`].
    pub fn builder() -> KnowledgeSessionBuilder {
        KnowledgeSessionBuilder::default()
    }

    /// Wire the default components described by `config`: a
    /// [`LocalVectorStore`] in `config.index_dir`, the configured embedding
    /// provider and a [`ChatCompletionModel`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] for an empty credential or invalid
    /// settings, or the store's error if the stale index cannot be removed.
    pub async fn from_config(config: SessionConfig) -> Result<Self> {
        let embedding_provider: Arc<dyn EmbeddingProvider> = match &config.embedding {
            EmbeddingConfig::Hashing { dimensions } => {
                if *dimensions == 0 {
                    return Err(RagError::ConfigError(
                        "embedding dimensions must be greater than zero".to_string(),
                    ));
                }
                Arc::new(HashingEmbeddingProvider::new(*dimensions))
            }
            EmbeddingConfig::OpenAI { api_key, base_url, model, dimensions, timeout } => {
                let mut provider = OpenAIEmbeddingProvider::new(api_key.clone())?
                    .with_base_url(base_url.clone())
                    .with_model(model.clone())
                    .with_timeout(*timeout)?;
                if let Some(dimensions) = dimensions {
                    provider = provider.with_dimensions(*dimensions);
                }
                Arc::new(provider)
            }
        };
        let language_model = Arc::new(ChatCompletionModel::new(&config.model)?);

        info!(
            index_dir = %config.index_dir.display(),
            model = %config.model.model,
            embeddings = embedding_provider.name(),
            "starting knowledge session"
        );

        Self::builder()
            .config(config.rag)
            .embedding_provider(embedding_provider)
            .vector_store(Arc::new(LocalVectorStore::new(config.index_dir)))
            .language_model(language_model)
            .fetch_timeout(config.fetch_timeout)
            .build()
            .await
    }

    /// Chunking and retrieval parameters.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Documents ingested so far, in ingest order.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Chat history, oldest first.
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// [`SessionState::Ready`] once any document is loaded.
    pub fn state(&self) -> SessionState {
        if self.documents.is_empty() { SessionState::Empty } else { SessionState::Ready }
    }

    /// The vector index backing retrieval.
    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    /// Load `source`, then rebuild the index over every document.
    ///
    /// The document list only grows once the rebuild has succeeded; on any
    /// error the session is left exactly as it was.
    ///
    /// # Errors
    ///
    /// Returns the loader's error ([`RagError::UnsupportedType`],
    /// [`RagError::ReadError`], [`RagError::DecodeError`], [`RagError::ParseError`],
    /// [`RagError::FetchError`]) or the rebuild's error
    /// ([`RagError::EmbeddingError`], [`RagError::VectorStoreError`]).
    pub async fn ingest(&mut self, source: DocumentSource) -> Result<IngestReport> {
        let label = source.label();
        let loaded = match source {
            DocumentSource::File { name, bytes } => loader::load_file(&bytes, &name),
            DocumentSource::Path(path) => loader::read_file(&path).await,
            DocumentSource::Url(url) => self.web.fetch(&url).await,
        };
        let new_documents = loaded.inspect_err(|e| {
            warn!(source = %label, error = %e, "ingest rejected");
        })?;

        if new_documents.is_empty() {
            warn!(source = %label, "source contained no text; nothing ingested");
            return Ok(IngestReport { documents_added: 0, chunk_count: self.index.len().await? });
        }

        let documents_added = new_documents.len();
        let mut candidate = Vec::with_capacity(self.documents.len() + documents_added);
        candidate.extend(self.documents.iter().cloned());
        candidate.extend(new_documents);

        let chunks = self.chunker.split(&candidate);
        let chunk_count = self.index.rebuild(chunks).await.inspect_err(|e| {
            error!(source = %label, error = %e, "index rebuild failed; documents not added");
        })?;
        self.documents = candidate;

        info!(
            source = %label,
            documents_added,
            total_documents = self.documents.len(),
            chunk_count,
            "ingested documents"
        );
        Ok(IngestReport { documents_added, chunk_count })
    }

    /// Answer `question` from the indexed documents and record the exchange.
    ///
    /// Never fails: problems are reported as [`AskOutcome::Failed`], whose
    /// text is what the user sees.
    pub async fn ask(&mut self, question: &str) -> AskOutcome {
        let outcome = self.answer(question).await;
        if let AskOutcome::Failed { error } = &outcome {
            error!(error = %error, "question failed");
        }

        self.history.push(ChatMessage { role: Role::User, content: question.to_string() });
        self.history.push(ChatMessage { role: Role::Assistant, content: outcome.text() });
        outcome
    }

    async fn answer(&self, question: &str) -> AskOutcome {
        if self.state() == SessionState::Empty {
            return AskOutcome::NoDocuments;
        }

        let context = match self.retriever.retrieve(question).await {
            Ok(context) => context,
            Err(error) => return AskOutcome::Failed { error },
        };
        match self.generator.answer(question, &context).await {
            Ok(text) => AskOutcome::Answered { text, context },
            Err(error) => AskOutcome::Failed { error },
        }
    }

    /// Chunks most relevant to `question`; empty while no documents are loaded.
    pub async fn retrieve(&self, question: &str) -> Result<Vec<Chunk>> {
        if self.state() == SessionState::Empty {
            return Ok(Vec::new());
        }
        self.retriever.retrieve(question).await
    }

    /// Forget every document and message and delete the persisted index.
    ///
    /// In-memory state is cleared even if deleting the index fails; the
    /// error is still returned.
    pub async fn reset(&mut self) -> Result<()> {
        self.documents.clear();
        self.history.clear();
        self.index.destroy().await?;
        info!("session reset");
        Ok(())
    }
}

/// Builder for constructing a [`KnowledgeSession`].
///
/// The embedding provider, vector store and language model are required.
/// The configuration defaults to [`RagConfig::default`] and the chunker to a
/// [`RecursiveChunker`] sized from that configuration.
///
/// # Example
///
/// ```rust,ignore
/// let session = KnowledgeSession::builder()
///     .embedding_provider(Arc::new(HashingEmbeddingProvider::default()))
///     .vector_store(Arc::new(InMemoryVectorStore::new()))
///     .language_model(Arc::new(my_model))
///     .build()
///     .await?;
/// ```
#[derive(Default)]
pub struct KnowledgeSessionBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    language_model: Option<Arc<dyn LanguageModel>>,
    chunker: Option<Arc<dyn Chunker>>,
    fetch_timeout: Option<Duration>,
}

impl KnowledgeSessionBuilder {
    /// Set the chunking and retrieval parameters.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Set the model that writes answers.
    pub fn language_model(mut self, model: Arc<dyn LanguageModel>) -> Self {
        self.language_model = Some(model);
        self
    }

    /// Replace the default [`RecursiveChunker`].
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Set the timeout for fetching web pages.
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    /// Build the session, deleting whatever index the store already holds so
    /// that it matches the empty document list.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if a required component is missing
    /// or the configuration is inconsistent.
    pub async fn build(self) -> Result<KnowledgeSession> {
        let config = self.config.unwrap_or_default();
        let config = RagConfig::builder()
            .chunk_size(config.chunk_size)
            .chunk_overlap(config.chunk_overlap)
            .top_k(config.top_k)
            .build()?;

        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::ConfigError("vector_store is required".to_string()))?;
        let language_model = self
            .language_model
            .ok_or_else(|| RagError::ConfigError("language_model is required".to_string()))?;
        let chunker = self.chunker.unwrap_or_else(|| {
            Arc::new(RecursiveChunker::new(config.chunk_size, config.chunk_overlap))
        });
        let web = WebLoader::new(self.fetch_timeout.unwrap_or(DEFAULT_FETCH_TIMEOUT))?;

        let index = VectorIndex::new(embedding_provider, vector_store);
        index.destroy().await?;

        Ok(KnowledgeSession {
            retriever: Retriever::with_top_k(index.clone(), config.top_k),
            generator: AnswerGenerator::new(language_model),
            config,
            chunker,
            index,
            web,
            documents: Vec::new(),
            history: Vec::new(),
        })
    }
}
