use rag_core::error::AppError;
use serde::{Deserialize, Serialize};

use super::{Embedder, InputType};
use crate::client::ServiceClient;

/// The service accepts at most this many texts per embed call.
const MAX_TEXTS_PER_REQUEST: usize = 96;

#[derive(Debug, Clone)]
pub struct HttpEmbedder {
    client: ServiceClient,
}

impl HttpEmbedder {
    pub fn new(client: ServiceClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Clone, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    texts: &'a [String],
    input_type: InputType,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl Embedder for HttpEmbedder {
    fn embed(&self, model: &str, texts: &[String], input_type: InputType) -> Result<Vec<Vec<f32>>, AppError> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(MAX_TEXTS_PER_REQUEST) {
            let req = EmbedRequest {
                model,
                texts: batch,
                input_type,
            };
            let resp: EmbedResponse = self
                .client
                .post_json("/v1/embed", &req, "AI_EMBEDDINGS_FAILED", "embeddings")?;

            if resp.embeddings.len() != batch.len() {
                return Err(AppError::new(
                    "AI_EMBEDDINGS_FAILED",
                    "Embeddings response count does not match request",
                )
                .with_details(format!("expected={}; got={}", batch.len(), resp.embeddings.len())));
            }
            if resp.embeddings.iter().any(|v| v.is_empty()) {
                return Err(AppError::new(
                    "AI_EMBEDDINGS_FAILED",
                    "Embeddings response contained an empty vector",
                ));
            }
            out.extend(resp.embeddings);
        }
        tracing::debug!(model, count = out.len(), "embedded texts");
        Ok(out)
    }
}
