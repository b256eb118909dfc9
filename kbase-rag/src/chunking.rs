//! Document chunking.
//!
//! [`RecursiveChunker`] splits text hierarchically (paragraphs, lines,
//! sentences, words, then single characters) and merges the pieces back into
//! chunks of at most `chunk_size` characters, carrying up to `chunk_overlap`
//! characters of trailing context into the next chunk.
//!
//! Sizes are measured in Unicode scalar values, so multi-byte text is never
//! cut inside a character.

use std::collections::VecDeque;

use crate::document::{Chunk, Document};

/// Separators tried in order, from coarsest to finest. The empty separator
/// means "cut between characters".
const SEPARATORS: &[&str] = &["\n\n", "\n", ". ", "! ", "? ", " ", ""];

/// A strategy for splitting documents into chunks.
pub trait Chunker: Send + Sync {
    /// Split one document into chunks.
    ///
    /// `document_index` is recorded on every produced chunk so it can be
    /// traced back to its parent. Returns an empty `Vec` for empty text.
    fn chunk(&self, document: &Document, document_index: usize) -> Vec<Chunk>;

    /// Split a sequence of documents, numbering them by position.
    fn split(&self, documents: &[Document]) -> Vec<Chunk> {
        documents.iter().enumerate().flat_map(|(i, doc)| self.chunk(doc, i)).collect()
    }
}

/// Splits text hierarchically: paragraphs → lines → sentences → words → characters.
///
/// # Example
///
/// ```rust,ignore
/// use kbase_rag::{Chunker, RecursiveChunker};
///
/// let chunker = RecursiveChunker::new(500, 50);
/// let chunks = chunker.split(&documents);
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size`: maximum number of characters per chunk (at least 1)
    /// * `chunk_overlap`: characters of context shared by consecutive chunks
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self { chunk_size, chunk_overlap: chunk_overlap.min(chunk_size - 1) }
    }

    /// Split raw text into chunk strings.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, SEPARATORS)
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        // Pick the coarsest separator that actually occurs in the text.
        let position = separators
            .iter()
            .position(|sep| sep.is_empty() || text.contains(sep))
            .unwrap_or(separators.len().saturating_sub(1));
        let separator = separators.get(position).copied().unwrap_or("");
        let finer = separators.get(position + 1..).unwrap_or(&[]);

        let pieces = if separator.is_empty() {
            split_chars(text)
        } else {
            split_keeping_separator(text, separator)
        };

        let mut chunks = Vec::new();
        let mut fitting: Vec<&str> = Vec::new();

        for piece in pieces {
            if char_len(piece) <= self.chunk_size {
                fitting.push(piece);
                continue;
            }
            if !fitting.is_empty() {
                chunks.extend(self.merge(&fitting));
                fitting.clear();
            }
            if finer.is_empty() {
                chunks.push(piece.trim().to_string());
            } else {
                chunks.extend(self.split_recursive(piece, finer));
            }
        }

        if !fitting.is_empty() {
            chunks.extend(self.merge(&fitting));
        }

        chunks.retain(|chunk| !chunk.is_empty());
        chunks
    }

    /// Greedily join pieces into chunks no longer than `chunk_size`, keeping a
    /// tail of at most `chunk_overlap` characters as the start of the next chunk.
    fn merge(&self, pieces: &[&str]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut window: VecDeque<(&str, usize)> = VecDeque::new();
        let mut total = 0;

        for &piece in pieces {
            let len = char_len(piece);
            if total + len > self.chunk_size && !window.is_empty() {
                push_joined(&mut chunks, &window);
                while total > self.chunk_overlap || (total + len > self.chunk_size && total > 0) {
                    let Some((_, dropped)) = window.pop_front() else {
                        break;
                    };
                    total -= dropped;
                }
            }
            window.push_back((piece, len));
            total += len;
        }

        push_joined(&mut chunks, &window);
        chunks
    }
}

impl Default for RecursiveChunker {
    fn default() -> Self {
        Self::new(500, 50)
    }
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, document: &Document, document_index: usize) -> Vec<Chunk> {
        if document.content.trim().is_empty() {
            return Vec::new();
        }

        self.split_text(&document.content)
            .into_iter()
            .enumerate()
            .map(|(i, content)| Chunk {
                id: format!("{document_index}-{i}"),
                content,
                metadata: document.metadata.clone(),
                document_index,
            })
            .collect()
    }
}

fn push_joined(chunks: &mut Vec<String>, window: &VecDeque<(&str, usize)>) {
    let joined: String = window.iter().map(|(piece, _)| *piece).collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Split text at a separator while keeping the separator attached to the preceding segment.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut result = Vec::new();
    let mut start = 0;

    while let Some(pos) = text[start..].find(separator) {
        let end = start + pos + separator.len();
        result.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        result.push(&text[start..]);
    }

    result
}

fn split_chars(text: &str) -> Vec<&str> {
    text.char_indices().map(|(i, c)| &text[i..i + c.len_utf8()]).collect()
}
