use rag_core::error::AppError;
use serde::{Deserialize, Serialize};

use super::{RerankHit, Reranker};
use crate::client::ServiceClient;

#[derive(Debug, Clone)]
pub struct HttpReranker {
    client: ServiceClient,
}

impl HttpReranker {
    pub fn new(client: ServiceClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Clone, Serialize)]
struct RerankRequest<'a> {
    model: &'a str,
    query: &'a str,
    documents: &'a [String],
    top_n: usize,
}

#[derive(Debug, Clone, Deserialize)]
struct RerankResponse {
    results: Vec<RerankHit>,
}

impl Reranker for HttpReranker {
    fn rerank(&self, model: &str, query: &str, documents: &[String], top_n: usize) -> Result<Vec<RerankHit>, AppError> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }
        let req = RerankRequest {
            model,
            query,
            documents,
            top_n: top_n.min(documents.len()),
        };
        let resp: RerankResponse = self
            .client
            .post_json("/v1/rerank", &req, "AI_RERANK_FAILED", "rerank")?;

        if let Some(bad) = resp.results.iter().find(|h| h.index >= documents.len()) {
            return Err(AppError::new(
                "AI_RERANK_FAILED",
                "Rerank result points outside the submitted documents",
            )
            .with_details(format!("index={}; documents={}", bad.index, documents.len())));
        }
        Ok(resp.results)
    }
}
