use rag_core::error::AppError;
use serde::{Deserialize, Serialize};

/// One reranked document: `index` points into the list that was sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RerankHit {
    pub index: usize,
    pub relevance_score: f32,
}

pub trait Reranker {
    /// Hits ordered by descending relevance, at most `top_n` of them.
    fn rerank(&self, model: &str, query: &str, documents: &[String], top_n: usize) -> Result<Vec<RerankHit>, AppError>;
}

pub mod http_rerank;
