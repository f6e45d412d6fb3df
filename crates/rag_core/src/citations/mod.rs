use serde::{Deserialize, Serialize};

use crate::domain::Citation;
use crate::error::{AppError, CITATION_MALFORMED_INPUT};

/// At most this many document references are rendered inside one marker.
pub const MAX_IDS_PER_MARKER: usize = 3;
const OVERFLOW_MARKER: &str = "...";

/// Turns a service-encoded document id into the text shown inside a marker.
pub trait DocumentIdDecoder {
    fn decode(&self, document_id: &str, renumber: bool) -> Result<String, AppError>;
}

/// Decoder for ids of the form `<fixed-length prefix><0-based index>`, e.g. `doc_3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixIdDecoder {
    pub prefix_len: usize,
}

impl PrefixIdDecoder {
    pub fn new(prefix_len: usize) -> Self {
        Self { prefix_len }
    }
}

impl Default for PrefixIdDecoder {
    fn default() -> Self {
        Self::new(4)
    }
}

impl DocumentIdDecoder for PrefixIdDecoder {
    fn decode(&self, document_id: &str, renumber: bool) -> Result<String, AppError> {
        let rest = document_id
            .char_indices()
            .nth(self.prefix_len)
            .map(|(byte, _)| &document_id[byte..])
            .ok_or_else(|| {
                AppError::new(CITATION_MALFORMED_INPUT, "Document id shorter than its prefix")
                    .with_details(format!("document_id={document_id}; prefix_len={}", self.prefix_len))
            })?;

        if !renumber {
            return Ok(rest.to_string());
        }
        let index: usize = rest.parse().map_err(|_| {
            AppError::new(
                CITATION_MALFORMED_INPUT,
                "Document id does not end in a numeric index",
            )
            .with_details(format!("document_id={document_id}"))
        })?;
        let renumbered = index.checked_add(1).ok_or_else(|| {
            AppError::new(CITATION_MALFORMED_INPUT, "Document index is out of range")
                .with_details(format!("document_id={document_id}"))
        })?;
        Ok(renumbered.to_string())
    }
}

/// A marker inserted by [`splice_with_markers`], located in output coordinates (characters).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertedMarker {
    pub position: usize,
    pub text: String,
}

impl InsertedMarker {
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spliced {
    pub text: String,
    pub markers: Vec<InsertedMarker>,
}

/// Render the marker appended after a cited span: ` [a, b, c, ...]`.
pub fn render_marker(
    document_ids: &[String],
    decoder: &dyn DocumentIdDecoder,
    renumber: bool,
) -> Result<String, AppError> {
    if document_ids.is_empty() {
        return Err(AppError::new(
            CITATION_MALFORMED_INPUT,
            "Citation must reference at least one document",
        ));
    }

    let mut parts = document_ids
        .iter()
        .take(MAX_IDS_PER_MARKER)
        .map(|id| decoder.decode(id, renumber))
        .collect::<Result<Vec<_>, _>>()?;
    if document_ids.len() > MAX_IDS_PER_MARKER {
        parts.push(OVERFLOW_MARKER.to_string());
    }
    Ok(format!(" [{}]", parts.join(", ")))
}

fn validate_citations(text_chars: usize, citations: &[Citation]) -> Result<(), AppError> {
    let mut prev: Option<&Citation> = None;
    for (i, c) in citations.iter().enumerate() {
        if c.end < c.start {
            return Err(AppError::new(CITATION_MALFORMED_INPUT, "Citation end precedes its start")
                .with_details(format!("index={i}; start={}; end={}", c.start, c.end)));
        }
        if c.end > text_chars {
            return Err(AppError::new(CITATION_MALFORMED_INPUT, "Citation extends past end of text")
                .with_details(format!("index={i}; end={}; text_len={text_chars}", c.end)));
        }
        if let Some(p) = prev {
            if c.start < p.start {
                return Err(AppError::new(
                    CITATION_MALFORMED_INPUT,
                    "Citation starts are not in ascending order",
                )
                .with_details(format!("index={i}; start={}; previous_start={}", c.start, p.start)));
            }
            if c.start < p.end {
                return Err(AppError::new(CITATION_MALFORMED_INPUT, "Citation spans overlap")
                    .with_details(format!("index={i}; start={}; previous_end={}", c.start, p.end)));
            }
        }
        prev = Some(c);
    }
    Ok(())
}

/// Forward-only char -> byte offset translation over one string.
struct CharCursor<'a> {
    chars: std::str::Chars<'a>,
    char_pos: usize,
    byte_pos: usize,
}

impl<'a> CharCursor<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars(),
            char_pos: 0,
            byte_pos: 0,
        }
    }

    fn seek(&mut self, target: usize) -> usize {
        while self.char_pos < target {
            match self.chars.next() {
                Some(ch) => {
                    self.byte_pos += ch.len_utf8();
                    self.char_pos += 1;
                }
                None => break,
            }
        }
        self.byte_pos
    }
}

/// Splice citation markers into `text`, reporting where each marker landed.
///
/// Citations are in original-text coordinates, ascending and non-overlapping. Input that breaks
/// that contract is rejected before any output is produced.
pub fn splice_with_markers(
    text: &str,
    citations: &[Citation],
    decoder: &dyn DocumentIdDecoder,
    renumber: bool,
) -> Result<Spliced, AppError> {
    validate_citations(text.chars().count(), citations)?;
    let rendered = citations
        .iter()
        .map(|c| render_marker(&c.document_ids, decoder, renumber))
        .collect::<Result<Vec<_>, _>>()?;

    let extra: usize = rendered.iter().map(String::len).sum();
    let mut out = String::with_capacity(text.len() + extra);
    let mut markers = Vec::with_capacity(citations.len());
    let mut cursor = CharCursor::new(text);
    let mut copied_to = 0usize;
    // Characters inserted so far; original offset `x` sits at `x + shift` in `out`.
    let mut shift = 0usize;

    for (c, marker) in citations.iter().zip(rendered) {
        let end_byte = cursor.seek(c.end);
        out.push_str(&text[copied_to..end_byte]);
        copied_to = end_byte;

        let position = c.end + shift;
        shift += marker.chars().count();
        out.push_str(&marker);
        markers.push(InsertedMarker {
            position,
            text: marker,
        });
    }
    out.push_str(&text[copied_to..]);

    Ok(Spliced { text: out, markers })
}

pub fn splice_with(
    text: &str,
    citations: &[Citation],
    decoder: &dyn DocumentIdDecoder,
    renumber: bool,
) -> Result<String, AppError> {
    splice_with_markers(text, citations, decoder, renumber).map(|s| s.text)
}

/// Splice with the default `doc_`-style decoder (4-character prefix).
pub fn splice(text: &str, citations: &[Citation], renumber: bool) -> Result<String, AppError> {
    splice_with(text, citations, &PrefixIdDecoder::default(), renumber)
}

/// Remove previously inserted markers, recovering the text that was spliced.
pub fn strip_markers(spliced: &str, markers: &[InsertedMarker]) -> String {
    let mut out = String::with_capacity(spliced.len());
    let mut pending = markers.iter().peekable();
    let mut skip_until = 0usize;
    for (i, ch) in spliced.chars().enumerate() {
        if i < skip_until {
            continue;
        }
        if let Some(m) = pending.peek() {
            if m.position == i {
                skip_until = i + m.char_len();
                pending.next();
                if skip_until > i {
                    continue;
                }
            }
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cite(start: usize, end: usize, ids: &[&str]) -> Citation {
        Citation::new(start, end, ids.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn splices_single_citation_after_span() {
        let out = splice("The sky is blue.", &[cite(4, 7, &["doc_0"])], false).expect("splice");
        assert_eq!(out, "The sky [0] is blue.");
    }

    #[test]
    fn renumber_shows_one_based_indices() {
        let out = splice("The sky is blue.", &[cite(4, 7, &["doc_0", "doc_2"])], true).expect("splice");
        assert_eq!(out, "The sky [1, 3] is blue.");
    }

    #[test]
    fn later_citations_account_for_earlier_markers() {
        let text = "Cats purr. Dogs bark. Birds sing.";
        let citations = vec![
            cite(0, 9, &["doc_0"]),
            cite(11, 20, &["doc_1", "doc_2"]),
            cite(22, 32, &["doc_3"]),
        ];
        let spliced = splice_with_markers(text, &citations, &PrefixIdDecoder::default(), false)
            .expect("splice");
        assert_eq!(
            spliced.text,
            "Cats purr [0]. Dogs bark [1, 2]. Birds sing [3]."
        );
        let positions: Vec<usize> = spliced.markers.iter().map(|m| m.position).collect();
        assert_eq!(positions, vec![9, 24, 43]);
        for m in &spliced.markers {
            let at: String = spliced.text.chars().skip(m.position).take(m.char_len()).collect();
            assert_eq!(at, m.text);
        }
    }

    #[test]
    fn more_than_three_ids_are_elided() {
        let out = splice("abc", &[cite(0, 3, &["doc_0", "doc_1", "doc_2", "doc_3", "doc_4"])], false)
            .expect("splice");
        assert_eq!(out, "abc [0, 1, 2, ...]");
    }

    #[test]
    fn empty_citation_list_is_identity() {
        let text = "Nothing cited here.";
        assert_eq!(splice(text, &[], false).expect("splice"), text);
        assert_eq!(splice("", &[], true).expect("splice"), "");
    }

    #[test]
    fn offsets_count_characters_not_bytes() {
        let text = "Café au lait, très bien.";
        let out = splice(text, &[cite(0, 4, &["doc_1"]), cite(14, 23, &["doc_0"])], true)
            .expect("splice");
        assert_eq!(out, "Café [2] au lait, très bien [1].");
    }

    #[test]
    fn zero_width_citation_at_end_of_text() {
        let out = splice("done", &[cite(4, 4, &["doc_7"])], false).expect("splice");
        assert_eq!(out, "done [7]");
    }

    #[test]
    fn length_grows_by_marker_lengths_and_markers_strip_back_out() {
        let text = "Alpha beta gamma delta epsilon.";
        let citations = vec![cite(0, 5, &["doc_0"]), cite(6, 10, &["doc_1"]), cite(23, 30, &["doc_0", "doc_1", "doc_2", "doc_3"])];
        let spliced = splice_with_markers(text, &citations, &PrefixIdDecoder::default(), false)
            .expect("splice");
        let added: usize = spliced.markers.iter().map(InsertedMarker::char_len).sum();
        assert_eq!(spliced.text.chars().count(), text.chars().count() + added);
        assert_eq!(strip_markers(&spliced.text, &spliced.markers), text);
    }

    #[test]
    fn rejects_end_before_start() {
        let err = splice("abcdef", &[cite(4, 2, &["doc_0"])], false).expect_err("should fail");
        assert_eq!(err.code, CITATION_MALFORMED_INPUT);
    }

    #[test]
    fn rejects_non_monotonic_starts() {
        let err = splice("abcdefgh", &[cite(4, 6, &["doc_0"]), cite(0, 2, &["doc_1"])], false)
            .expect_err("should fail");
        assert_eq!(err.code, CITATION_MALFORMED_INPUT);
        assert!(err.message.contains("ascending"));
    }

    #[test]
    fn rejects_overlap_and_out_of_bounds() {
        let overlap = splice("abcdefgh", &[cite(0, 4, &["doc_0"]), cite(2, 6, &["doc_1"])], false)
            .expect_err("overlap");
        assert_eq!(overlap.code, CITATION_MALFORMED_INPUT);

        let oob = splice("abc", &[cite(1, 9, &["doc_0"])], false).expect_err("oob");
        assert_eq!(oob.code, CITATION_MALFORMED_INPUT);
    }

    #[test]
    fn rejects_ids_that_cannot_be_decoded() {
        assert!(splice("abc", &[cite(0, 1, &["doc"])], false).is_err());
        assert!(splice("abc", &[cite(0, 1, &["doc_x"])], true).is_err());
        assert!(splice("abc", &[cite(0, 1, &[])], false).is_err());
        // Without renumbering the suffix is shown as-is.
        assert_eq!(splice("abc", &[cite(0, 1, &["doc_x"])], false).expect("splice"), "a [x]bc");
    }

    #[test]
    fn renumbering_the_largest_index_is_malformed_not_a_panic() {
        let id = format!("doc_{}", usize::MAX);
        let err = splice("abc", &[Citation::new(0, 1, vec![id.clone()])], true).expect_err("overflow");
        assert_eq!(err.code, CITATION_MALFORMED_INPUT);
        // Shown verbatim when not renumbering.
        let out = splice("abc", &[Citation::new(0, 1, vec![id])], false).expect("splice");
        assert_eq!(out, format!("a [{}]bc", usize::MAX));
    }

    struct UpperDecoder;

    impl DocumentIdDecoder for UpperDecoder {
        fn decode(&self, document_id: &str, _renumber: bool) -> Result<String, AppError> {
            Ok(document_id.to_uppercase())
        }
    }

    #[test]
    fn custom_decoder_is_used_for_marker_text() {
        let out = splice_with("abc", &[cite(0, 3, &["ref-a"])], &UpperDecoder, false).expect("splice");
        assert_eq!(out, "abc [REF-A]");
    }
}
