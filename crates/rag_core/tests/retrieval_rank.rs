use std::collections::HashMap;

use rag_core::domain::RetrievedItem;
use rag_core::rank::{
    default_not_found_rank, rank_of_golden, rank_of_golden_by_ids, rank_of_golden_with, summarize_ranks,
    SourceNormalizer,
};

fn docs_normalizer() -> SourceNormalizer {
    SourceNormalizer::new("/mnt/corpus/", vec!["/doc_source".to_string()])
}

#[test]
fn golden_rank_matches_documented_examples() {
    let retrieved = RetrievedItem::ranked_from_sources(&["a.md", "b.md", "a.md"]);
    assert_eq!(rank_of_golden("a.md", &retrieved, 5), 1);

    let only_a = RetrievedItem::ranked_from_sources(&["a.md"]);
    assert_eq!(rank_of_golden("z.md", &only_a, 5), 5);
}

#[test]
fn chunk_level_results_resolve_to_documents() {
    let mut id_to_source = HashMap::new();
    for (id, src) in [
        ("c-17", "/mnt/corpus/sagemaker/doc_source/endpoints.md"),
        ("c-03", "/mnt/corpus/sagemaker/doc_source/training.md"),
        ("c-18", "/mnt/corpus/sagemaker/doc_source/endpoints.md"),
        ("c-40", "/mnt/corpus/sagemaker/doc_source/pricing.md"),
    ] {
        id_to_source.insert(id.to_string(), src.to_string());
    }

    let ids = ["c-03", "c-17", "c-18", "c-40"];
    let nf = default_not_found_rank(ids.len());
    let normalizer = docs_normalizer();

    let rank = |golden: &str| rank_of_golden_by_ids(golden, &ids, &id_to_source, &normalizer, nf).unwrap();
    assert_eq!(rank("sagemaker/endpoints.md"), 2);
    assert_eq!(rank("sagemaker/pricing.md"), 4);
    assert_eq!(rank("sagemaker/security.md"), 5);
}

#[test]
fn ranks_use_item_rank_not_position() {
    // A window that starts at rank 11 (second page of results).
    let retrieved = vec![
        RetrievedItem::new("x", "/mnt/corpus/s/doc_source/a.md", 11),
        RetrievedItem::new("y", "/mnt/corpus/s/doc_source/b.md", 12),
    ];
    assert_eq!(rank_of_golden_with("s/b.md", &retrieved, &docs_normalizer(), 13), 12);
}

#[test]
fn evaluation_summary_over_many_questions() {
    let ranks = [1, 1, 3, 21, 2];
    let summary = summarize_ranks(&ranks, 21, &[1, 5]);
    assert_eq!(summary.queries, 5);
    assert_eq!(summary.misses, 1);
    assert_eq!(summary.hit_rate_at_k[&1], 0.4);
    assert_eq!(summary.hit_rate_at_k[&5], 0.8);
}
