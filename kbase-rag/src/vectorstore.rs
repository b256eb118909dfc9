//! Vector store trait for storing and searching vector embeddings.

use async_trait::async_trait;

use crate::document::{IndexedChunk, SearchResult};
use crate::error::Result;

/// A storage backend for embedded chunks with similarity search.
///
/// A store holds a single collection whose contents are replaced wholesale
/// by [`replace`](VectorStore::replace). Entries keep their insertion order,
/// which breaks ties between equal scores.
///
/// # Example
///
/// ```rust,ignore
/// use kbase_rag::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.replace(entries).await?;
/// let results = store.search(&query_embedding, 3).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Short name used in logs and error messages.
    fn backend(&self) -> &str;

    /// Replace all stored entries with `entries`.
    ///
    /// On error the previous contents must remain intact.
    async fn replace(&self, entries: Vec<IndexedChunk>) -> Result<()>;

    /// Search for the `top_k` most similar chunks to the given embedding.
    ///
    /// Returns results ordered by descending similarity score.
    async fn search(&self, embedding: &[f32], top_k: usize) -> Result<Vec<SearchResult>>;

    /// Number of stored entries.
    async fn len(&self) -> Result<usize>;

    /// Whether the store holds no entries.
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Remove every entry and any persisted storage.
    async fn destroy(&self) -> Result<()>;
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Score every entry against `embedding` and keep the best `top_k`.
///
/// The sort is stable, so equal scores stay in insertion order.
pub(crate) fn rank(entries: &[IndexedChunk], embedding: &[f32], top_k: usize) -> Vec<SearchResult> {
    let mut scored: Vec<SearchResult> = entries
        .iter()
        .map(|entry| SearchResult {
            chunk: entry.chunk.clone(),
            score: cosine_similarity(&entry.embedding, embedding),
        })
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(top_k);
    scored
}
