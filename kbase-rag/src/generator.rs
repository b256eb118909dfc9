//! Grounded answer generation.

use std::sync::Arc;

use tracing::debug;

use crate::document::Chunk;
use crate::error::Result;
use crate::llm::LanguageModel;

/// Instruction placed ahead of the retrieved context.
pub const PROMPT_PREAMBLE: &str = "Answer the question based only on the following context:";

/// Render the prompt sent to the model.
///
/// Chunk contents are joined with a blank line, in retrieval order.
pub fn build_prompt(question: &str, context: &[Chunk]) -> String {
    let context = context.iter().map(|c| c.content.as_str()).collect::<Vec<_>>().join("\n\n");
    format!("{PROMPT_PREAMBLE}\n{context}\n\nQuestion: {question}")
}

/// Produces answers constrained to retrieved context.
#[derive(Clone)]
pub struct AnswerGenerator {
    model: Arc<dyn LanguageModel>,
}

impl AnswerGenerator {
    /// Create a generator around a language model.
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// The underlying model.
    pub fn model(&self) -> &Arc<dyn LanguageModel> {
        &self.model
    }

    /// Ask the model `question` against `context`.
    ///
    /// An empty context is still sent; the model decides how to respond.
    pub async fn answer(&self, question: &str, context: &[Chunk]) -> Result<String> {
        let prompt = build_prompt(question, context);
        debug!(model = self.model.name(), context_chunks = context.len(), "generating answer");
        self.model.complete(&prompt).await
    }
}
