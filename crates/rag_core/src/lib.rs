pub mod chunking;
pub mod citations;
pub mod domain;
pub mod error;
pub mod grading;
pub mod rank;

#[cfg(test)]
mod tests {
    use super::error::{AppError, CITATION_MALFORMED_INPUT};

    #[test]
    fn app_error_is_structured() {
        let err = AppError::new(CITATION_MALFORMED_INPUT, "bad spans")
            .with_details("index=2")
            .with_retryable(false);
        assert_eq!(err.code, "CITATION_MALFORMED_INPUT");
        assert_eq!(err.message, "bad spans");
        assert_eq!(err.retryable, false);
        assert!(err.is(CITATION_MALFORMED_INPUT));
        assert_eq!(err.to_string(), "[CITATION_MALFORMED_INPUT] bad spans (index=2)");
    }

    #[test]
    fn app_error_serializes_for_callers() {
        let err = AppError::new("AI_CHAT_FAILED", "chat failed").with_retryable(true);
        let json = serde_json::to_value(&err).expect("json");
        assert_eq!(json["code"], "AI_CHAT_FAILED");
        assert_eq!(json["retryable"], true);
        assert!(json["details"].is_null());
    }
}
