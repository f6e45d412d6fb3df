use pretty_assertions::assert_eq;

use rag_core::chunking::{chunk, chunk_numbered, LabelPattern};
use rag_core::citations::{splice, splice_with_markers, strip_markers, PrefixIdDecoder};
use rag_core::domain::{Chunk, Citation, DocumentRecord};

const AGREEMENT: &str = "MASTER SERVICES AGREEMENT\nEffective as of the date of last signature.\n\n1.\nDefinitions. \"Services\" means the hosted platform.\n\n2.\nTerm. This Agreement continues for twelve (12) months.\n3.\nTermination. Either party may terminate on thirty (30) days notice.\n";

#[test]
fn agreement_chunks_in_document_order() {
    let chunks = chunk_numbered(AGREEMENT);
    let labels: Vec<&str> = chunks.iter().map(|c| c.label.as_str()).collect();
    assert_eq!(labels, vec!["Preamble", "1", "2", "3"]);
    assert_eq!(
        chunks[2],
        Chunk::new("2", "Term. This Agreement continues for twelve (12) months.\n")
    );
    // Blank lines stay with the paragraph that precedes the next label.
    assert!(chunks[1].body.ends_with("platform.\n\n"));
}

#[test]
fn chunks_concatenate_back_to_the_document() {
    let chunks = chunk(AGREEMENT, &LabelPattern::numbered());
    let mut rebuilt = String::new();
    for c in &chunks {
        if !c.is_preamble() {
            rebuilt.push_str(&format!("{}.\n", c.label));
        }
        rebuilt.push_str(&c.body);
    }
    assert_eq!(rebuilt, AGREEMENT);
}

#[test]
fn chunks_become_title_snippet_documents() {
    let docs: Vec<DocumentRecord> = chunk_numbered(AGREEMENT).iter().map(DocumentRecord::from).collect();
    let json = serde_json::to_value(&docs[3]).unwrap();
    assert_eq!(json["title"], "3");
    assert!(json["snippet"].as_str().unwrap().starts_with("Termination."));
    assert_eq!(json.as_object().unwrap().len(), 2);
}

#[test]
fn generated_answer_gets_citations_for_the_cited_paragraphs() {
    let answer = "The agreement lasts twelve months and can be ended with thirty days notice.";
    // Spans as a generation service reports them: doc indices refer to the document list above.
    let citations = vec![
        Citation::new(20, 33, vec!["doc_2".to_string()]),
        Citation::new(56, 74, vec!["doc_3".to_string(), "doc_0".to_string()]),
    ];
    let out = splice(answer, &citations, true).unwrap();
    assert_eq!(
        out,
        "The agreement lasts twelve months [3] and can be ended with thirty days notice [4, 1]."
    );

    let spliced = splice_with_markers(answer, &citations, &PrefixIdDecoder::default(), true).unwrap();
    assert_eq!(spliced.text, out);
    assert_eq!(strip_markers(&spliced.text, &spliced.markers), answer);
}
