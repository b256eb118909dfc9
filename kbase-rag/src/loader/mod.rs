//! Document loaders.
//!
//! Every loader turns raw input into zero or more [`Document`]s whose
//! `source` metadata names where the text came from. File loaders implement
//! [`DocumentLoader`] and are chosen by extension through [`loader_for`];
//! web pages go through [`WebLoader`], which is async.

mod docx;
mod pdf;
mod text;
mod web;

use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::{error, info};

use crate::document::Document;
use crate::error::{RagError, Result};

pub use docx::DocxLoader;
pub use pdf::PdfLoader;
pub use text::TextLoader;
pub use web::{DEFAULT_FETCH_TIMEOUT, WebLoader};

/// Turns the bytes of an uploaded file into documents.
pub trait DocumentLoader: Send + Sync {
    /// Decode `bytes`; `name` becomes the `source` metadata of each document.
    fn load(&self, bytes: &[u8], name: &str) -> Result<Vec<Document>>;
}

/// File types accepted for upload, keyed by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// `.pdf`
    Pdf,
    /// `.txt` and `.md`
    Text,
    /// `.docx`
    Docx,
}

impl FileKind {
    /// Classify a file name by its lower-cased extension.
    pub fn from_name(name: &str) -> Option<Self> {
        let extension = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "pdf" => Some(FileKind::Pdf),
            "txt" | "md" => Some(FileKind::Text),
            "docx" => Some(FileKind::Docx),
            _ => None,
        }
    }
}

/// Pick the loader for a file name.
///
/// # Errors
///
/// Returns [`RagError::UnsupportedType`] for any extension other than
/// `.pdf`, `.txt`, `.md` or `.docx`.
pub fn loader_for(name: &str) -> Result<Box<dyn DocumentLoader>> {
    match FileKind::from_name(name) {
        Some(FileKind::Pdf) => Ok(Box::new(PdfLoader)),
        Some(FileKind::Text) => Ok(Box::new(TextLoader)),
        Some(FileKind::Docx) => Ok(Box::new(DocxLoader)),
        None => {
            error!(name, "unsupported file type");
            Err(RagError::UnsupportedType { name: name.to_string() })
        }
    }
}

/// Load an uploaded file, dispatching on its name.
pub fn load_file(bytes: &[u8], name: &str) -> Result<Vec<Document>> {
    let documents = loader_for(name)?.load(bytes, name)?;
    info!(source = name, documents = documents.len(), "loaded file");
    Ok(documents)
}

/// Read `path` from disk and load it; the file name becomes the source.
pub async fn read_file(path: impl AsRef<Path>) -> Result<Vec<Document>> {
    let path = path.as_ref();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    // Reject the extension before touching the disk.
    loader_for(&name)?;

    let bytes = tokio::fs::read(path).await.map_err(|e| {
        error!(path = %path.display(), error = %e, "failed to read file");
        RagError::ReadError { path: path.display().to_string(), message: e.to_string() }
    })?;
    load_file(&bytes, &name)
}

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);")
        .expect("unreachable error: invalid entity pattern")
});

/// Decode the XML predefined entities, `&nbsp;` and numeric character references.
///
/// Unknown named entities are left as written.
pub(crate) fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    ENTITY
        .replace_all(text, |caps: &Captures<'_>| {
            let body = &caps[1];
            let decoded = match body {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some(' '),
                _ if body.starts_with("#x") || body.starts_with("#X") => {
                    u32::from_str_radix(&body[2..], 16).ok().and_then(char::from_u32)
                }
                _ if body.starts_with('#') => {
                    body[1..].parse::<u32>().ok().and_then(char::from_u32)
                }
                _ => None,
            };
            decoded.map(String::from).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
