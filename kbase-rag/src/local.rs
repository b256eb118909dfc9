//! Vector store persisted to a local directory.
//!
//! The whole index lives in `<dir>/index.json`. Every [`replace`] serializes
//! the new contents to a temporary file and renames it over the old one, so a
//! failed write leaves the previous index on disk and in memory.
//!
//! [`replace`]: crate::VectorStore::replace

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::document::{IndexedChunk, SearchResult};
use crate::error::{RagError, Result};
use crate::vectorstore::{VectorStore, rank};

/// File name of the serialized index inside the store directory.
pub const INDEX_FILE: &str = "index.json";

const TEMP_FILE: &str = "index.json.tmp";
const FORMAT_VERSION: u32 = 1;
const BACKEND: &str = "Local";

#[derive(Deserialize)]
struct PersistedIndex {
    version: u32,
    dimensions: usize,
    entries: Vec<IndexedChunk>,
}

/// A vector store that keeps entries in memory and mirrors them to disk.
#[derive(Debug)]
pub struct LocalVectorStore {
    dir: PathBuf,
    entries: RwLock<Vec<IndexedChunk>>,
}

impl LocalVectorStore {
    /// Create an empty store rooted at `dir` without touching the filesystem.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), entries: RwLock::new(Vec::new()) }
    }

    /// Open the store at `dir`, loading a previously persisted index if one exists.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::VectorStoreError`] if the index file exists but
    /// cannot be read or has an unknown format.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let store = Self::new(dir);
        let path = store.index_path();

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(dir = %store.dir.display(), "no persisted index");
                return Ok(store);
            }
            Err(e) => return Err(io_failure("read", &path, e)),
        };

        let persisted: PersistedIndex = serde_json::from_slice(&bytes).map_err(|e| {
            error!(path = %path.display(), error = %e, "corrupt index file");
            RagError::VectorStoreError {
                backend: BACKEND.into(),
                message: format!("failed to parse {}: {e}", path.display()),
            }
        })?;

        if persisted.version != FORMAT_VERSION {
            return Err(RagError::VectorStoreError {
                backend: BACKEND.into(),
                message: format!("unsupported index format version {}", persisted.version),
            });
        }

        info!(
            dir = %store.dir.display(),
            entries = persisted.entries.len(),
            dimensions = persisted.dimensions,
            "loaded persisted index"
        );
        *store.entries.write().await = persisted.entries;
        Ok(store)
    }

    /// Directory holding the persisted index.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn index_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILE)
    }

    async fn persist(&self, entries: &[IndexedChunk]) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| io_failure("create", &self.dir, e))?;

        let snapshot = PersistedIndexRef {
            version: FORMAT_VERSION,
            dimensions: entries.first().map(|e| e.embedding.len()).unwrap_or(0),
            entries,
        };
        let bytes = serde_json::to_vec(&snapshot).map_err(|e| RagError::VectorStoreError {
            backend: BACKEND.into(),
            message: format!("failed to serialize index: {e}"),
        })?;

        let temp = self.dir.join(TEMP_FILE);
        tokio::fs::write(&temp, &bytes).await.map_err(|e| io_failure("write", &temp, e))?;
        let path = self.index_path();
        tokio::fs::rename(&temp, &path).await.map_err(|e| io_failure("rename", &path, e))?;

        debug!(path = %path.display(), bytes = bytes.len(), "persisted index");
        Ok(())
    }
}

#[derive(Serialize)]
struct PersistedIndexRef<'a> {
    version: u32,
    dimensions: usize,
    entries: &'a [IndexedChunk],
}

fn io_failure(action: &str, path: &Path, e: std::io::Error) -> RagError {
    error!(action, path = %path.display(), error = %e, "index storage failure");
    RagError::VectorStoreError {
        backend: BACKEND.into(),
        message: format!("failed to {action} {}: {e}", path.display()),
    }
}

#[async_trait]
impl VectorStore for LocalVectorStore {
    fn backend(&self) -> &str {
        BACKEND
    }

    async fn replace(&self, entries: Vec<IndexedChunk>) -> Result<()> {
        let mut current = self.entries.write().await;
        self.persist(&entries).await?;
        *current = entries;
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
        let mut current = self.entries.write().await;
        current.clear();
        match tokio::fs::remove_dir_all(&self.dir).await {
            Ok(()) => info!(dir = %self.dir.display(), "deleted persisted index"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(io_failure("delete", &self.dir, e)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Chunk, Document};

    fn entries(texts: &[&str]) -> Vec<IndexedChunk> {
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| IndexedChunk {
                chunk: Chunk {
                    id: format!("0-{i}"),
                    content: text.to_string(),
                    metadata: Document::new("", "notes.txt").metadata,
                    document_index: 0,
                },
                embedding: vec![i as f32, 1.0],
            })
            .collect()
    }

    #[tokio::test]
    async fn replace_persists_and_open_reloads() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("index");

        let store = LocalVectorStore::new(&dir);
        store.replace(entries(&["a", "b", "c"])).await.unwrap();
        assert!(dir.join(INDEX_FILE).exists());
        assert!(!dir.join(TEMP_FILE).exists());

        let reopened = LocalVectorStore::open(&dir).await.unwrap();
        assert_eq!(reopened.len().await.unwrap(), 3);
        let hits = reopened.search(&[0.0, 1.0], 1).await.unwrap();
        assert_eq!(hits[0].chunk.content, "a");
    }

    #[tokio::test]
    async fn replace_overwrites_previous_contents() {
        let temp = tempfile::tempdir().unwrap();
        let store = LocalVectorStore::new(temp.path().join("index"));
        store.replace(entries(&["a", "b", "c"])).await.unwrap();
        store.replace(entries(&["d"])).await.unwrap();

        let reopened = LocalVectorStore::open(store.dir()).await.unwrap();
        assert_eq!(reopened.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn destroy_removes_directory() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("index");
        let store = LocalVectorStore::new(&dir);
        store.replace(entries(&["a"])).await.unwrap();

        store.destroy().await.unwrap();
        assert!(!dir.exists());
        assert!(store.is_empty().await.unwrap());

        // Destroying twice is fine, and the store can be rebuilt afterwards.
        store.destroy().await.unwrap();
        store.replace(entries(&["b"])).await.unwrap();
        assert!(dir.join(INDEX_FILE).exists());
    }

    #[tokio::test]
    async fn failed_delete_still_empties_the_store() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("index");
        let store = LocalVectorStore::new(&dir);
        store.replace(entries(&["a", "b"])).await.unwrap();

        // A plain file where the directory was cannot be removed as a directory.
        std::fs::remove_dir_all(&dir).unwrap();
        std::fs::write(&dir, b"not a directory").unwrap();

        let err = store.destroy().await.unwrap_err();
        assert!(matches!(err, RagError::VectorStoreError { .. }));
        assert!(store.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn open_missing_directory_is_empty() {
        let temp = tempfile::tempdir().unwrap();
        let store = LocalVectorStore::open(temp.path().join("absent")).await.unwrap();
        assert!(store.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn corrupt_index_is_reported() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join(INDEX_FILE), b"{not json").unwrap();
        let err = LocalVectorStore::open(temp.path()).await.unwrap_err();
        assert!(matches!(err, RagError::VectorStoreError { .. }));
    }
}
