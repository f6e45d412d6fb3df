use rag_core::citations::DocumentIdDecoder;
use rag_core::domain::Citation;
use rag_core::error::AppError;

/// Check that every citation points at a document that was actually sent.
///
/// Citation ids must decode (without renumbering) to a 0-based index into the request's
/// document list.
pub fn enforce_citation_targets(
    citations: &[Citation],
    document_count: usize,
    decoder: &dyn DocumentIdDecoder,
) -> Result<(), AppError> {
    for c in citations {
        for id in &c.document_ids {
            let decoded = decoder.decode(id, false).map_err(|e| {
                AppError::new("AI_CITATION_INVALID", "Citation id could not be decoded")
                    .with_details(format!("document_id={id}; cause={}", e.message))
            })?;
            let index = decoded
                .parse::<usize>()
                .map_err(|_| {
                    AppError::new("AI_CITATION_INVALID", "Citation id is not a document index")
                        .with_details(format!("document_id={id}"))
                })?;
            if index >= document_count {
                return Err(AppError::new(
                    "AI_CITATION_INVALID",
                    "Answer cited a document that was not supplied",
                )
                .with_details(format!("document_id={id}; documents={document_count}")));
            }
        }
    }
    Ok(())
}

/// Require at least one citation when documents were supplied.
pub fn enforce_citations_present(citations: &[Citation], document_count: usize) -> Result<(), AppError> {
    if document_count > 0 && citations.is_empty() {
        return Err(AppError::new(
            "AI_CITATION_REQUIRED",
            "Answer must cite the supplied documents",
        ));
    }
    Ok(())
}
