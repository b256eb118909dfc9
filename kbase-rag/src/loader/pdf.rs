use tracing::{debug, error, warn};

use crate::document::{Document, PAGE_KEY};
use crate::error::{RagError, Result};

use super::DocumentLoader;

/// Loads a PDF as one document per non-blank page.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfLoader;

impl DocumentLoader for PdfLoader {
    fn load(&self, bytes: &[u8], name: &str) -> Result<Vec<Document>> {
        let pdf = lopdf::Document::load_mem(bytes).map_err(|e| {
            error!(source = name, error = %e, "failed to parse PDF");
            RagError::ParseError {
                source_name: name.to_string(),
                message: format!("failed to load PDF: {e}"),
            }
        })?;

        let pages = pdf.get_pages();
        let mut documents = Vec::with_capacity(pages.len());
        for &page in pages.keys() {
            let text = match pdf.extract_text(&[page]) {
                Ok(text) => text,
                Err(e) => {
                    warn!(source = name, page, error = %e, "skipping unreadable page");
                    continue;
                }
            };
            if text.trim().is_empty() {
                debug!(source = name, page, "skipping blank page");
                continue;
            }
            documents.push(Document::new(text, name).with_metadata(PAGE_KEY, i64::from(page)));
        }
        Ok(documents)
    }
}
