use std::fs;
use std::path::Path;

use rag_core::citations::PrefixIdDecoder;
use rag_core::error::AppError;
use rag_core::rank::SourceNormalizer;
use serde::{Deserialize, Serialize};

/// Environment variable that overrides `api_key` from the config file.
pub const API_KEY_ENV: &str = "RAG_API_KEY";

/// Settings for one pipeline run. Every field has a default, so a config file only needs the
/// keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub base_url: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub request_timeout_secs: u64,

    pub embed_model: String,
    pub rerank_model: String,
    pub chat_model: String,
    pub grader_model: String,

    /// Candidates pulled from the vector index before reranking.
    pub top_k: usize,
    /// Passages kept after reranking and sent to the chat model.
    pub top_n: usize,
    pub max_chunk_chars: usize,

    pub citation_id_prefix_len: usize,
    pub renumber_citations: bool,
    pub require_citations: bool,

    pub source_normalizer: SourceNormalizer,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.cohere.com".to_string(),
            api_key: None,
            request_timeout_secs: 30,
            embed_model: "embed-english-v3.0".to_string(),
            rerank_model: "rerank-english-v3.0".to_string(),
            chat_model: "command-r".to_string(),
            grader_model: "command-r-plus".to_string(),
            top_k: 25,
            top_n: 5,
            max_chunk_chars: 1600,
            citation_id_prefix_len: 4,
            renumber_citations: true,
            require_citations: false,
            source_normalizer: SourceNormalizer::identity(),
        }
    }
}

impl RagConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, AppError> {
        let cfg: Self = serde_json::from_str(raw).map_err(|e| {
            AppError::new("CONFIG_INVALID", "Failed to decode config JSON").with_details(e.to_string())
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read a JSON config file and apply environment overrides.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let raw = fs::read_to_string(path).map_err(|e| {
            AppError::new("CONFIG_READ_FAILED", "Failed to read config file")
                .with_details(format!("path={}; err={}", path.display(), e))
        })?;
        let cfg = Self::from_json_str(&raw)?.with_env_overrides();
        tracing::debug!(path = %path.display(), base_url = %cfg.base_url, "loaded config");
        Ok(cfg)
    }

    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(key) = lookup(API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key.trim().to_string());
        }
        self
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let invalid = |msg: &str, details: String| {
            Err(AppError::new("CONFIG_INVALID", msg).with_details(details))
        };
        if self.base_url.trim().is_empty() {
            return invalid("base_url is required", String::new());
        }
        if self.top_k == 0 || self.top_n == 0 {
            return invalid(
                "top_k and top_n must be positive",
                format!("top_k={}; top_n={}", self.top_k, self.top_n),
            );
        }
        if self.top_n > self.top_k {
            return invalid(
                "top_n must not exceed top_k",
                format!("top_k={}; top_n={}", self.top_k, self.top_n),
            );
        }
        if self.max_chunk_chars == 0 {
            return invalid("max_chunk_chars must be positive", String::new());
        }
        if self.request_timeout_secs == 0 {
            return invalid("request_timeout_secs must be positive", String::new());
        }
        for (name, model) in [
            ("embed_model", &self.embed_model),
            ("rerank_model", &self.rerank_model),
            ("chat_model", &self.chat_model),
            ("grader_model", &self.grader_model),
        ] {
            if model.trim().is_empty() {
                return invalid("model names must not be empty", format!("field={name}"));
            }
        }
        Ok(())
    }

    pub fn id_decoder(&self) -> PrefixIdDecoder {
        PrefixIdDecoder::new(self.citation_id_prefix_len)
    }

    /// Rank reported when the golden document is outside the reranked window.
    pub fn not_found_rank(&self) -> usize {
        self.top_n + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let cfg = RagConfig::default();
        cfg.validate().expect("valid");
        assert_eq!(cfg.not_found_rank(), 6);
        assert_eq!(cfg.id_decoder(), PrefixIdDecoder::new(4));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut f = tempfile::NamedTempFile::new().expect("tempfile");
        write!(
            f,
            r#"{{"top_k": 10, "top_n": 3, "source_normalizer": {{"path_stub": "/data/", "strip_substrings": ["/doc_source"]}}}}"#
        )
        .expect("write");

        let cfg = RagConfig::load(f.path()).expect("load");
        assert_eq!(cfg.top_k, 10);
        assert_eq!(cfg.top_n, 3);
        assert_eq!(cfg.chat_model, "command-r");
        assert_eq!(
            cfg.source_normalizer,
            SourceNormalizer::new("/data/", vec!["/doc_source".to_string()])
        );
    }

    #[test]
    fn rejects_inconsistent_windows() {
        let err = RagConfig::from_json_str(r#"{"top_k": 3, "top_n": 5}"#).expect_err("invalid");
        assert_eq!(err.code, "CONFIG_INVALID");
        let err = RagConfig::from_json_str(r#"{"top_n": 0}"#).expect_err("invalid");
        assert_eq!(err.code, "CONFIG_INVALID");
        let err = RagConfig::from_json_str("not json").expect_err("invalid");
        assert_eq!(err.code, "CONFIG_INVALID");
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = RagConfig::load(&dir.path().join("absent.json")).expect_err("missing");
        assert_eq!(err.code, "CONFIG_READ_FAILED");
    }

    #[test]
    fn api_key_comes_from_environment_lookup_and_is_never_serialized() {
        let cfg = RagConfig::default().with_overrides_from(|k| {
            (k == API_KEY_ENV).then(|| " secret-key ".to_string())
        });
        assert_eq!(cfg.api_key.as_deref(), Some("secret-key"));

        let json = serde_json::to_string(&cfg).expect("json");
        assert!(!json.contains("secret-key"));

        let blank = RagConfig::default().with_overrides_from(|_| Some("  ".to_string()));
        assert_eq!(blank.api_key, None);
    }
}
