//! Fixed top-k retrieval over a [`VectorIndex`].

use tracing::debug;

use crate::document::Chunk;
use crate::error::Result;
use crate::index::VectorIndex;

/// Number of chunks retrieved per question unless configured otherwise.
pub const DEFAULT_TOP_K: usize = 3;

/// Wraps a [`VectorIndex`] with a fixed `k`.
#[derive(Clone)]
pub struct Retriever {
    index: VectorIndex,
    top_k: usize,
}

impl Retriever {
    /// Create a retriever returning [`DEFAULT_TOP_K`] chunks.
    pub fn new(index: VectorIndex) -> Self {
        Self::with_top_k(index, DEFAULT_TOP_K)
    }

    /// Create a retriever returning up to `top_k` chunks.
    pub fn with_top_k(index: VectorIndex, top_k: usize) -> Self {
        Self { index, top_k }
    }

    /// The configured `k`.
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Chunks most relevant to `question`, best first. Empty when nothing is indexed.
    pub async fn retrieve(&self, question: &str) -> Result<Vec<Chunk>> {
        let results = self.index.search(question, self.top_k).await?;
        debug!(question_len = question.len(), retrieved = results.len(), "retrieved context");
        Ok(results.into_iter().map(|r| r.chunk).collect())
    }
}
