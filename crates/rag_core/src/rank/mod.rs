use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::domain::RetrievedItem;
use crate::error::{AppError, RANK_UNKNOWN_IDENTIFIER};

/// Maps a source-document name onto the key used for golden-document comparison.
pub trait Normalize {
    fn normalize(&self, source: &str) -> String;
}

impl<F> Normalize for F
where
    F: Fn(&str) -> String,
{
    fn normalize(&self, source: &str) -> String {
        self(source)
    }
}

/// Dataset-specific normalization: drop a leading path stub, then remove marker substrings
/// (for example `/doc_source`). The default strips nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceNormalizer {
    #[serde(default)]
    pub path_stub: Option<String>,
    #[serde(default)]
    pub strip_substrings: Vec<String>,
}

impl SourceNormalizer {
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn new(path_stub: impl Into<String>, strip_substrings: Vec<String>) -> Self {
        Self {
            path_stub: Some(path_stub.into()),
            strip_substrings,
        }
    }
}

impl Normalize for SourceNormalizer {
    fn normalize(&self, source: &str) -> String {
        let trimmed = match self.path_stub.as_deref() {
            Some(stub) if !stub.is_empty() => source.strip_prefix(stub).unwrap_or(source),
            _ => source,
        };
        let mut out = trimmed.to_string();
        for s in self.strip_substrings.iter().filter(|s| !s.is_empty()) {
            out = out.replace(s.as_str(), "");
        }
        out
    }
}

/// Conventional "not retrieved within the window" rank: one past the result length.
pub fn default_not_found_rank(retrieved_len: usize) -> usize {
    retrieved_len + 1
}

/// First-occurrence rank per normalized source. Later chunks of the same document never
/// overwrite an earlier rank.
pub fn first_occurrence_ranks(
    retrieved: &[RetrievedItem],
    normalizer: &dyn Normalize,
) -> HashMap<String, usize> {
    let mut ranks = HashMap::with_capacity(retrieved.len());
    for item in retrieved {
        ranks
            .entry(normalizer.normalize(&item.source_document))
            .or_insert(item.rank);
    }
    ranks
}

pub fn rank_of_golden_with(
    golden: &str,
    retrieved: &[RetrievedItem],
    normalizer: &dyn Normalize,
    not_found_rank: usize,
) -> usize {
    let key = normalizer.normalize(golden);
    first_occurrence_ranks(retrieved, normalizer)
        .get(&key)
        .copied()
        .unwrap_or(not_found_rank)
}

/// 1-based rank of the first retrieved chunk belonging to `golden`, or `not_found_rank`.
pub fn rank_of_golden(golden: &str, retrieved: &[RetrievedItem], not_found_rank: usize) -> usize {
    rank_of_golden_with(golden, retrieved, &SourceNormalizer::identity(), not_found_rank)
}

/// Like [`rank_of_golden_with`], but starting from raw retrieval identifiers that must be
/// resolved to their source documents first.
pub fn rank_of_golden_by_ids<S: AsRef<str>>(
    golden: &str,
    retrieved_ids: &[S],
    id_to_source: &HashMap<String, String>,
    normalizer: &dyn Normalize,
    not_found_rank: usize,
) -> Result<usize, AppError> {
    let mut items = Vec::with_capacity(retrieved_ids.len());
    for (i, id) in retrieved_ids.iter().enumerate() {
        let id = id.as_ref();
        let source = id_to_source.get(id).ok_or_else(|| {
            AppError::new(
                RANK_UNKNOWN_IDENTIFIER,
                "Retrieved identifier has no document mapping",
            )
            .with_details(format!("identifier={id}; rank={}", i + 1))
        })?;
        items.push(RetrievedItem::new(id, source.clone(), i + 1));
    }
    Ok(rank_of_golden_with(golden, &items, normalizer, not_found_rank))
}

/// Aggregate view over many golden-rank lookups.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankSummary {
    pub queries: usize,
    pub misses: usize,
    pub mean_rank: f64,
    /// Mean reciprocal rank; misses contribute 0.
    pub mrr: f64,
    pub hit_rate_at_k: BTreeMap<usize, f64>,
}

/// Summarize ranks. Any rank `>= not_found_rank` counts as a miss.
pub fn summarize_ranks(ranks: &[usize], not_found_rank: usize, ks: &[usize]) -> RankSummary {
    if ranks.is_empty() {
        return RankSummary {
            hit_rate_at_k: ks.iter().map(|&k| (k, 0.0)).collect(),
            ..RankSummary::default()
        };
    }

    let n = ranks.len() as f64;
    let found = |r: usize| r >= 1 && r < not_found_rank;

    let misses = ranks.iter().filter(|&&r| !found(r)).count();
    let mean_rank = ranks.iter().map(|&r| r as f64).sum::<f64>() / n;
    let mrr = ranks
        .iter()
        .filter(|&&r| found(r))
        .map(|&r| 1.0 / r as f64)
        .sum::<f64>()
        / n;
    let hit_rate_at_k = ks
        .iter()
        .map(|&k| {
            let hits = ranks.iter().filter(|&&r| found(r) && r <= k).count();
            (k, hits as f64 / n)
        })
        .collect();

    RankSummary {
        queries: ranks.len(),
        misses,
        mean_rank,
        mrr,
        hit_rate_at_k,
    }
}
