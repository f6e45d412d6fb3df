use std::collections::HashMap;

use rag_core::error::AppError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

mod similarity;

/// A sub-document chunk stored in the index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexedChunk {
    pub chunk_id: String,
    pub source_document: String,
    pub ordinal: u32,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    pub chunk: IndexedChunk,
    pub score: f32,
    pub rank: usize,
}

/// Content-derived chunk id: stable across rebuilds for the same source and text.
pub fn chunk_id_for(source_document: &str, text: &str) -> String {
    let payload = format!("source={source_document}\ntext={text}");
    hex::encode(Sha256::digest(payload.as_bytes()))
}

#[derive(Debug, Clone)]
struct Entry {
    chunk: IndexedChunk,
    vector: Vec<f32>,
    norm: f32,
}

/// Brute-force in-memory cosine index. Nothing is persisted.
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    dims: Option<usize>,
    entries: Vec<Entry>,
    by_id: HashMap<String, usize>,
}

impl VectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dims(&self) -> Option<usize> {
        self.dims
    }

    /// Add one chunk. Re-adding identical content is a no-op that returns the existing id.
    pub fn add(
        &mut self,
        source_document: &str,
        ordinal: u32,
        text: &str,
        vector: Vec<f32>,
    ) -> Result<String, AppError> {
        let chunk_id = chunk_id_for(source_document, text);
        if self.by_id.contains_key(&chunk_id) {
            return Ok(chunk_id);
        }
        if vector.is_empty() {
            return Err(AppError::new("AI_INDEX_INVALID", "Cannot index an empty vector")
                .with_details(format!("source={source_document}; ordinal={ordinal}")));
        }
        match self.dims {
            Some(d) if d != vector.len() => {
                return Err(AppError::new("AI_INDEX_INVALID", "Vector dims do not match index dims")
                    .with_details(format!("index_dims={d}; got={}", vector.len())));
            }
            Some(_) => {}
            None => self.dims = Some(vector.len()),
        }

        let norm = similarity::l2_norm(&vector);
        self.by_id.insert(chunk_id.clone(), self.entries.len());
        self.entries.push(Entry {
            chunk: IndexedChunk {
                chunk_id: chunk_id.clone(),
                source_document: source_document.to_string(),
                ordinal,
                text: text.to_string(),
            },
            vector,
            norm,
        });
        Ok(chunk_id)
    }

    pub fn get(&self, chunk_id: &str) -> Option<&IndexedChunk> {
        self.by_id.get(chunk_id).map(|&i| &self.entries[i].chunk)
    }

    /// chunk_id -> source document, for resolving raw retrieval ids.
    pub fn id_to_source(&self) -> HashMap<String, String> {
        self.entries
            .iter()
            .map(|e| (e.chunk.chunk_id.clone(), e.chunk.source_document.clone()))
            .collect()
    }

    /// Top `top_k` chunks by cosine similarity, ranked from 1. Ties order by `chunk_id`.
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchHit>, AppError> {
        let Some(dims) = self.dims else {
            return Err(AppError::new(
                "AI_INDEX_NOT_READY",
                "Index is empty; add documents before searching",
            ));
        };
        if query.len() != dims {
            return Err(AppError::new(
                "AI_RETRIEVAL_FAILED",
                "Query embedding dims do not match index dims",
            )
            .with_details(format!("index_dims={dims}; query_dims={}", query.len())));
        }
        let qnorm = similarity::l2_norm(query);
        if qnorm == 0.0 {
            return Err(AppError::new("AI_RETRIEVAL_FAILED", "Query embedding norm is zero"));
        }

        let mut scored: Vec<(&Entry, f32)> = self
            .entries
            .iter()
            .filter(|e| e.norm > 0.0)
            .map(|e| (e, similarity::cosine_with_norms(query, qnorm, &e.vector, e.norm)))
            .collect();
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.chunk.chunk_id.cmp(&b.0.chunk.chunk_id))
        });
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .enumerate()
            .map(|(i, (e, score))| SearchHit {
                chunk: e.chunk.clone(),
                score,
                rank: i + 1,
            })
            .collect())
    }
}
