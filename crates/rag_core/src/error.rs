use serde::{Deserialize, Serialize};
use std::fmt;

/// Citation spans out of order, overlapping, or outside the text.
pub const CITATION_MALFORMED_INPUT: &str = "CITATION_MALFORMED_INPUT";
/// A retrieval identifier with no entry in the id -> document mapping.
pub const RANK_UNKNOWN_IDENTIFIER: &str = "RANK_UNKNOWN_IDENTIFIER";
/// A grader response that is not `{reasoning, score}` JSON after fence stripping.
pub const GRADING_PARSE_FAILED: &str = "GRADING_PARSE_FAILED";

/// Single structured error shape shared by the pure utilities and the service layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppError {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
    pub retryable: bool,
}

impl AppError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            retryable: false,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn is(&self, code: &str) -> bool {
        self.code == code
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.details.as_deref() {
            Some(d) => write!(f, "[{}] {} ({d})", self.code, self.message),
            None => write!(f, "[{}] {}", self.code, self.message),
        }
    }
}

impl std::error::Error for AppError {}
