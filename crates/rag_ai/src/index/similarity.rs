pub(crate) fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

pub(crate) fn l2_norm(v: &[f32]) -> f32 {
    dot(v, v).sqrt()
}

/// Cosine similarity with precomputed norms; callers skip zero-norm vectors.
pub(crate) fn cosine_with_norms(query: &[f32], query_norm: f32, doc: &[f32], doc_norm: f32) -> f32 {
    dot(query, doc) / (query_norm * doc_norm)
}
