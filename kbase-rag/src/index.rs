//! Vector index: an embedding provider paired with a vector store.
//!
//! [`VectorIndex::rebuild`] re-embeds the full chunk set and swaps it in as a
//! unit. Embedding happens before the store is touched, so a failed rebuild
//! leaves the previous index in place.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::document::{Chunk, IndexedChunk, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

/// Searchable index over embedded chunks.
#[derive(Clone)]
pub struct VectorIndex {
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
}

impl VectorIndex {
    /// Create an index from its two collaborators.
    pub fn new(
        embedding_provider: Arc<dyn EmbeddingProvider>,
        vector_store: Arc<dyn VectorStore>,
    ) -> Self {
        Self { embedding_provider, vector_store }
    }

    /// Return a reference to the embedding provider.
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedding_provider
    }

    /// Return a reference to the vector store.
    pub fn vector_store(&self) -> &Arc<dyn VectorStore> {
        &self.vector_store
    }

    /// Replace the index contents with embeddings of `chunks`.
    ///
    /// Returns the number of chunks now indexed.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingError`] if any chunk fails to embed (the
    /// previous contents are kept), or the store's error if persisting fails.
    pub async fn rebuild(&self, chunks: Vec<Chunk>) -> Result<usize> {
        let provider = self.embedding_provider.name().to_string();

        let embeddings = if chunks.is_empty() {
            Vec::new()
        } else {
            let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
            self.embedding_provider.embed_batch(&texts).await.map_err(|e| {
                error!(
                    provider = %provider,
                    chunk_count = chunks.len(),
                    error = %e,
                    "embedding failed during rebuild"
                );
                match e {
                    RagError::EmbeddingError { .. } => e,
                    other => RagError::EmbeddingError {
                        provider: provider.clone(),
                        message: other.to_string(),
                    },
                }
            })?
        };

        if embeddings.len() != chunks.len() {
            error!(
                provider = %provider,
                expected = chunks.len(),
                got = embeddings.len(),
                "embedding count mismatch"
            );
            return Err(RagError::EmbeddingError {
                provider,
                message: format!(
                    "expected {} embeddings, received {}",
                    chunks.len(),
                    embeddings.len()
                ),
            });
        }

        if let Some(first) = embeddings.first() {
            let dimensions = first.len();
            if dimensions == 0 || embeddings.iter().any(|e| e.len() != dimensions) {
                error!(provider = %provider, "inconsistent embedding dimensions");
                return Err(RagError::EmbeddingError {
                    provider,
                    message: "embeddings have inconsistent or zero dimensions".into(),
                });
            }
        }

        let entries: Vec<IndexedChunk> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexedChunk { chunk, embedding })
            .collect();
        let chunk_count = entries.len();

        self.vector_store.replace(entries).await?;
        info!(chunk_count, backend = self.vector_store.backend(), "rebuilt vector index");
        Ok(chunk_count)
    }

    /// Return the `k` stored chunks most similar to `query`, best first.
    ///
    /// An empty index returns an empty `Vec` without embedding the query.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        if k == 0 || self.vector_store.is_empty().await? {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedding_provider.embed(query).await.map_err(|e| {
            error!(error = %e, "embedding failed during search");
            e
        })?;

        let results = self.vector_store.search(&query_embedding, k).await?;
        debug!(result_count = results.len(), k, "index search completed");
        Ok(results)
    }

    /// Number of indexed chunks.
    pub async fn len(&self) -> Result<usize> {
        self.vector_store.len().await
    }

    /// Whether the index holds no chunks.
    pub async fn is_empty(&self) -> Result<bool> {
        self.vector_store.is_empty().await
    }

    /// Drop every entry and delete persisted storage.
    pub async fn destroy(&self) -> Result<()> {
        self.vector_store.destroy().await
    }
}
