use serde::{Deserialize, Serialize};

/// A span of generated text attributed to one or more supplied documents.
///
/// Notes:
/// - `start`/`end` are character offsets (Unicode scalar values) into the text as generated,
///   before any markers are spliced in.
/// - `document_ids` keep the generation service's encoding: a fixed-length prefix followed by a
///   0-based index into the document list that was sent with the request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Citation {
    pub start: usize,
    pub end: usize,
    pub document_ids: Vec<String>,
}

impl Citation {
    pub fn new(start: usize, end: usize, document_ids: Vec<String>) -> Self {
        Self {
            start,
            end,
            document_ids,
        }
    }
}

/// One entry of a ranked retrieval result. Several entries may share `source_document`
/// because retrieval runs over sub-document chunks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetrievedItem {
    pub identifier: String,
    pub source_document: String,
    pub rank: usize,
}

impl RetrievedItem {
    pub fn new(identifier: impl Into<String>, source_document: impl Into<String>, rank: usize) -> Self {
        Self {
            identifier: identifier.into(),
            source_document: source_document.into(),
            rank,
        }
    }

    /// Build a ranked list from source names alone, assigning ranks 1..=n in order.
    pub fn ranked_from_sources<S: AsRef<str>>(sources: &[S]) -> Vec<Self> {
        sources
            .iter()
            .enumerate()
            .map(|(i, s)| Self::new(format!("item_{i}"), s.as_ref(), i + 1))
            .collect()
    }
}

/// Label used for text that appears before the first numbered paragraph.
pub const PREAMBLE_LABEL: &str = "Preamble";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    pub label: String,
    pub body: String,
}

impl Chunk {
    pub fn new(label: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            body: body.into(),
        }
    }

    pub fn is_preamble(&self) -> bool {
        self.label == PREAMBLE_LABEL
    }
}

/// Document as handed to the chat service.
///
/// The two shapes are serialized untagged so the wire body carries exactly
/// `{title, snippet}` or `{text, identifier}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum DocumentRecord {
    Snippet { title: String, snippet: String },
    Passage { text: String, identifier: String },
}

impl DocumentRecord {
    pub fn snippet(title: impl Into<String>, snippet: impl Into<String>) -> Self {
        Self::Snippet {
            title: title.into(),
            snippet: snippet.into(),
        }
    }

    pub fn passage(text: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self::Passage {
            text: text.into(),
            identifier: identifier.into(),
        }
    }
}

impl From<&Chunk> for DocumentRecord {
    fn from(chunk: &Chunk) -> Self {
        Self::snippet(chunk.label.clone(), chunk.body.clone())
    }
}

/// Verdict returned by the grading model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GradeResult {
    pub reasoning: String,
    pub score: u8,
}

impl GradeResult {
    pub fn passed(&self) -> bool {
        self.score == 1
    }
}

/// Inputs for one grading call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GradingSample {
    pub question: String,
    pub golden_answer: String,
    pub reference: String,
    pub completion: String,
}
