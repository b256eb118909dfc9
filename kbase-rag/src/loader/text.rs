use tracing::error;

use crate::document::Document;
use crate::error::{RagError, Result};

use super::DocumentLoader;

/// Loads `.txt` and `.md` files as a single UTF-8 document.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextLoader;

impl DocumentLoader for TextLoader {
    fn load(&self, bytes: &[u8], name: &str) -> Result<Vec<Document>> {
        let text = std::str::from_utf8(bytes).map_err(|e| {
            error!(source = name, error = %e, "invalid UTF-8");
            RagError::DecodeError { source_name: name.to_string(), message: e.to_string() }
        })?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        Ok(vec![Document::new(text, name)])
    }
}
