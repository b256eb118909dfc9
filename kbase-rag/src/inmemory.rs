//! In-memory vector store using cosine similarity.
//!
//! This module provides [`InMemoryVectorStore`], a vector store backed by a
//! `Vec` protected by a `tokio::sync::RwLock`. Nothing is written to disk, so
//! it suits tests and throwaway sessions.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::document::{IndexedChunk, SearchResult};
use crate::error::Result;
use crate::vectorstore::{VectorStore, rank};

/// An in-memory vector store using cosine similarity for search.
///
/// # Example
///
/// ```rust,ignore
/// use kbase_rag::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.replace(entries).await?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    entries: RwLock<Vec<IndexedChunk>>,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn backend(&self) -> &str {
        "InMemory"
    }

    async fn replace(&self, entries: Vec<IndexedChunk>) -> Result<()> {
        *self.entries.write().await = entries;
        Ok(())
    }

    async fn search(&self, embedding: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        let entries = self.entries.read().await;
        Ok(rank(&entries, embedding, top_k))
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.entries.read().await.len())
    }

    async fn destroy(&self) -> Result<()> {
        self.entries.write().await.clear();
        Ok(())
    }
}
