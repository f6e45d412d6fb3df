use std::sync::LazyLock;

use regex::Regex;

use crate::domain::{Chunk, PREAMBLE_LABEL};
use crate::error::AppError;

/// Default paragraph label: a line consisting of digits and one trailing period, e.g. `12.`
pub const NUMBERED_PARAGRAPH_PATTERN: &str = r"^\d+\.$";

static NUMBERED: LazyLock<LabelPattern> = LazyLock::new(|| LabelPattern {
    regex: Regex::new(NUMBERED_PARAGRAPH_PATTERN).expect("numbered paragraph pattern is valid"),
});

/// Line predicate that decides whether a line opens a new labelled paragraph.
///
/// Patterns always have to match the whole line (without its line terminator).
#[derive(Debug, Clone)]
pub struct LabelPattern {
    regex: Regex,
}

impl LabelPattern {
    pub fn new(pattern: &str) -> Result<Self, AppError> {
        let regex = Regex::new(&format!("^(?:{pattern})$")).map_err(|e| {
            AppError::new("CHUNK_PATTERN_INVALID", "Paragraph label pattern failed to compile")
                .with_details(format!("pattern={pattern}; err={e}"))
        })?;
        Ok(Self { regex })
    }

    pub fn numbered() -> Self {
        NUMBERED.clone()
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Label for `line` if it is a label line: the line with one trailing period removed.
    pub fn label_for(&self, line: &str) -> Option<String> {
        if !self.regex.is_match(line) {
            return None;
        }
        Some(line.strip_suffix('.').unwrap_or(line).to_string())
    }
}

impl Default for LabelPattern {
    fn default() -> Self {
        Self::numbered()
    }
}

fn strip_line_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

/// Split a numbered-paragraph document into labelled chunks, in document order.
///
/// Text ahead of the first label line becomes a `Preamble` chunk; it is omitted when empty.
/// Body text keeps its original line terminators.
pub fn chunk(document: &str, pattern: &LabelPattern) -> Vec<Chunk> {
    let mut out = Vec::new();
    let mut label = PREAMBLE_LABEL.to_string();
    let mut body = String::new();
    // False while still collecting the preamble.
    let mut labelled = false;

    for line in document.split_inclusive('\n') {
        match pattern.label_for(strip_line_terminator(line)) {
            Some(next) => {
                if labelled || !body.is_empty() {
                    out.push(Chunk::new(std::mem::replace(&mut label, next), std::mem::take(&mut body)));
                } else {
                    label = next;
                }
                labelled = true;
            }
            None => body.push_str(line),
        }
    }
    if labelled || !body.is_empty() {
        out.push(Chunk::new(label, body));
    }
    out
}

pub fn chunk_numbered(document: &str) -> Vec<Chunk> {
    chunk(document, &NUMBERED)
}

/// Normalize line endings to `\n`.
pub fn normalize_text(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Greedy blank-line paragraph packing for corpus documents that have no numbered structure.
///
/// Paragraphs are joined with a blank line until adding the next one would exceed `max_chars`
/// (counted in characters, not bytes);
/// a single paragraph longer than `max_chars` is kept whole.
pub fn chunk_by_paragraphs(text: &str, max_chars: usize) -> Vec<String> {
    let normalized = normalize_text(text);
    let paras = normalized
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty());

    let mut out = Vec::new();
    let mut buf = String::new();
    let mut buf_chars = 0;
    for p in paras {
        let p_chars = p.chars().count();
        let add_len = if buf.is_empty() { p_chars } else { 2 + p_chars };
        if !buf.is_empty() && buf_chars + add_len > max_chars {
            out.push(std::mem::take(&mut buf));
            buf_chars = 0;
        }
        if !buf.is_empty() {
            buf.push_str("\n\n");
            buf_chars += 2;
        }
        buf.push_str(p);
        buf_chars += p_chars;
    }
    if !buf.is_empty() {
        out.push(buf);
    }
    out
}
