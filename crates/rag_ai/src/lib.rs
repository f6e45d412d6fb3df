pub mod client;
pub mod config;
pub mod embeddings;
pub mod guardrails;
pub mod index;
pub mod llm;
pub mod pipeline;
pub mod rerank;

#[cfg(test)]
mod tests {
    use super::client::ServiceClient;
    use super::config::RagConfig;
    use super::guardrails::{enforce_citation_targets, enforce_citations_present};
    use rag_core::citations::PrefixIdDecoder;
    use rag_core::domain::Citation;

    #[test]
    fn requires_https_or_loopback_base_url() {
        assert!(ServiceClient::new("https://api.cohere.com").is_ok());
        assert!(ServiceClient::new("https://api.cohere.com/").is_ok()); // trailing slash is trimmed
        assert!(ServiceClient::new("https://gateway.internal:8443/llm").is_ok());
        assert!(ServiceClient::new("http://127.0.0.1:8080").is_ok());
        assert!(ServiceClient::new("http://127.0.0.1").is_ok());

        assert!(ServiceClient::new("http://api.cohere.com").is_err());
        assert!(ServiceClient::new("ftp://api.cohere.com").is_err());
        assert!(ServiceClient::new("https://").is_err());

        // Harden against prefix-based bypasses.
        assert!(ServiceClient::new("http://127.0.0.1.evil.com:8080").is_err());
        assert!(ServiceClient::new("http://127.0.0.1@evil.com").is_err());
        assert!(ServiceClient::new("https://user@api.cohere.com").is_err());
        assert!(ServiceClient::new("http://127.0.0.1:").is_err());
        assert!(ServiceClient::new("http://127.0.0.1:0").is_err());
        assert!(ServiceClient::new("http://127.0.0.1:99999").is_err());
    }

    #[test]
    fn client_from_config_trims_base_url() {
        let cfg = RagConfig {
            base_url: "http://127.0.0.1:9000/".to_string(),
            ..RagConfig::default()
        };
        let client = ServiceClient::from_config(&cfg).expect("client");
        assert_eq!(client.base_url(), "http://127.0.0.1:9000");
    }

    #[test]
    fn api_key_check_needs_a_key() {
        let client = ServiceClient::new("http://127.0.0.1:9").expect("client");
        let err = client.check_api_key().expect_err("no key");
        assert_eq!(err.code, "AI_API_KEY_MISSING");
    }

    #[test]
    fn citation_guards_check_presence_and_targets() {
        let decoder = PrefixIdDecoder::default();
        let ok = vec![Citation::new(0, 3, vec!["doc_0".to_string(), "doc_1".to_string()])];
        let out_of_range = vec![Citation::new(0, 3, vec!["doc_2".to_string()])];
        let garbled = vec![Citation::new(0, 3, vec!["doc_x".to_string()])];

        assert!(enforce_citation_targets(&ok, 2, &decoder).is_ok());
        assert_eq!(
            enforce_citation_targets(&out_of_range, 2, &decoder).expect_err("range").code,
            "AI_CITATION_INVALID"
        );
        assert_eq!(
            enforce_citation_targets(&garbled, 2, &decoder).expect_err("garbled").code,
            "AI_CITATION_INVALID"
        );
        let short = vec![Citation::new(0, 3, vec!["doc".to_string()])];
        assert_eq!(
            enforce_citation_targets(&short, 2, &decoder).expect_err("short").code,
            "AI_CITATION_INVALID"
        );

        assert!(enforce_citations_present(&[], 0).is_ok());
        assert_eq!(
            enforce_citations_present(&[], 3).expect_err("missing").code,
            "AI_CITATION_REQUIRED"
        );
    }
}
