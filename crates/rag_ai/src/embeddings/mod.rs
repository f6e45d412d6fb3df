use rag_core::error::AppError;
use serde::{Deserialize, Serialize};

/// Whether texts are being embedded for storage in the index or as a search query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputType {
    SearchDocument,
    SearchQuery,
}

pub trait Embedder {
    /// One vector per input text, in input order.
    fn embed(&self, model: &str, texts: &[String], input_type: InputType) -> Result<Vec<Vec<f32>>, AppError>;

    fn embed_one(&self, model: &str, text: &str, input_type: InputType) -> Result<Vec<f32>, AppError> {
        let mut out = self.embed(model, &[text.to_string()], input_type)?;
        match out.pop() {
            Some(v) if out.is_empty() => Ok(v),
            _ => Err(AppError::new(
                "AI_EMBEDDINGS_FAILED",
                "Expected exactly one embedding",
            )),
        }
    }
}

pub mod http_embed;
