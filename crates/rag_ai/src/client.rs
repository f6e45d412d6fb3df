use std::time::Duration;

use rag_core::error::AppError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::RagConfig;

/// Blocking JSON client for the hosted embedding / rerank / chat service.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

fn is_loopback_http(url: &str) -> bool {
    url == "http://127.0.0.1" || url.starts_with("http://127.0.0.1:") || url.starts_with("http://127.0.0.1/")
}

impl ServiceClient {
    /// Remote endpoints must use https; plain http is only accepted on `127.0.0.1`.
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        let invalid = |msg: &str| {
            AppError::new("AI_BASE_URL_INVALID", msg).with_details(format!("base_url={base_url}"))
        };

        let rest = if let Some(rest) = base_url.strip_prefix("https://") {
            rest
        } else if is_loopback_http(&base_url) {
            &base_url["http://".len()..]
        } else {
            return Err(invalid("Service base URL must use https (or http on 127.0.0.1)"));
        };

        let authority = rest.split('/').next().unwrap_or("");
        if authority.is_empty() || authority.contains('@') {
            return Err(invalid("Service base URL has an invalid host"));
        }
        if let Some((host, port)) = authority.rsplit_once(':') {
            let port_ok = matches!(port.parse::<u16>(), Ok(p) if p != 0);
            if host.is_empty() || !port_ok {
                return Err(invalid("Service base URL has an invalid port"));
            }
        }

        Ok(Self {
            base_url,
            api_key: None,
            timeout: Duration::from_secs(30),
        })
    }

    pub fn from_config(cfg: &RagConfig) -> Result<Self, AppError> {
        let mut client = Self::new(&cfg.base_url)?.with_timeout(Duration::from_secs(cfg.request_timeout_secs));
        if let Some(key) = cfg.api_key.as_deref() {
            client = client.with_api_key(key);
        }
        Ok(client)
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn post_json<B, R>(&self, path: &str, body: &B, code: &str, what: &str) -> Result<R, AppError>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let payload = serde_json::to_value(body).map_err(|e| {
            AppError::new(code, format!("Failed to encode {what} request")).with_details(e.to_string())
        })?;

        let mut req = ureq::post(&url).timeout(self.timeout);
        if let Some(key) = self.api_key.as_deref() {
            req = req.set("Authorization", &format!("Bearer {key}"));
        }

        tracing::debug!(%url, what, "service request");
        match req.send_json(payload) {
            Ok(r) => r.into_json::<R>().map_err(|e| {
                AppError::new(code, format!("Failed to decode {what} response")).with_details(e.to_string())
            }),
            Err(ureq::Error::Status(status, r)) => {
                let body = r.into_string().unwrap_or_default();
                tracing::warn!(%url, status, what, "service request rejected");
                Err(AppError::new(code, format!("{what} request failed"))
                    .with_details(format!("status={status}; body={}", truncate(&body, 300)))
                    .with_retryable(status == 429 || status >= 500))
            }
            Err(e) => {
                tracing::warn!(%url, error = %e, what, "service unreachable");
                Err(AppError::new(code, format!("Failed to call {what} endpoint"))
                    .with_details(e.to_string())
                    .with_retryable(true))
            }
        }
    }

    /// Verify the configured key with the service.
    pub fn check_api_key(&self) -> Result<(), AppError> {
        #[derive(Serialize)]
        struct Empty {}
        #[derive(Deserialize)]
        struct CheckResponse {
            valid: bool,
        }

        if self.api_key.is_none() {
            return Err(AppError::new("AI_API_KEY_MISSING", "No API key configured"));
        }
        let resp: CheckResponse = self.post_json("/v1/check-api-key", &Empty {}, "AI_SERVICE_UNHEALTHY", "API key check")?;
        if !resp.valid {
            return Err(AppError::new("AI_API_KEY_INVALID", "Service rejected the API key"));
        }
        Ok(())
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((byte, _)) => &s[..byte],
        None => s,
    }
}
