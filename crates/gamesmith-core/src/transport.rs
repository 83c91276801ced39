//! Network seam for a single attempt.
//!
//! [`CompletionTransport`] performs one request/response exchange and knows
//! nothing about timeouts or retries; the flow races it against its own
//! timer and drops the future to abort an attempt.  [`HttpTransport`] is the
//! `reqwest`-backed implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};

use crate::config::GeneratorConfig;
use crate::error::{GenerationError, Result};
use crate::request::GenerationRequest;

/// Upper bound on establishing the TCP/TLS connection.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A fully received response, before any decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Canonical reason phrase for `status` (may be empty).
    pub status_text: String,
    /// Response body as text.
    pub body: String,
}

impl RawResponse {
    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A transport-level failure (connection refused, DNS, TLS, broken body).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct TransportError {
    pub reason: String,
}

impl TransportError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Performs one chat-completion exchange.
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    /// Send `request` and return the complete response.  Dropping the
    /// returned future must abort the exchange.
    async fn send(&self, request: &GenerationRequest) -> std::result::Result<RawResponse, TransportError>;
}

// ---------------------------------------------------------------------------
// HTTP transport
// ---------------------------------------------------------------------------

/// Posts requests to an OpenAI-compatible chat-completion endpoint.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    url: String,
    headers: HeaderMap,
    http: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport for `config.api_url` authenticated with
    /// `config.api_key`.
    pub fn new(config: &GeneratorConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(GenerationError::Config {
                reason: "missing API key".into(),
            });
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", config.api_key.trim())).map_err(|e| {
                GenerationError::Config {
                    reason: format!("invalid authorization header: {e}"),
                }
            })?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| GenerationError::Config {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            url: config.api_url.clone(),
            headers,
            http,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl CompletionTransport for HttpTransport {
    async fn send(&self, request: &GenerationRequest) -> std::result::Result<RawResponse, TransportError> {
        tracing::debug!(url = %self.url, model = %request.model(), "sending completion request");

        let resp = self
            .http
            .post(&self.url)
            .headers(self.headers.clone())
            .json(&request.to_body())
            .send()
            .await?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| TransportError::new(format!("failed to read response body: {e}")))?;

        Ok(RawResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_owned(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_api_key_is_config_error() {
        let err = HttpTransport::new(&GeneratorConfig::default()).unwrap_err();
        assert!(matches!(err, GenerationError::Config { .. }));
    }

    #[test]
    fn key_with_newline_is_rejected() {
        let config = GeneratorConfig {
            api_key: "sk-a\nb".into(),
            ..GeneratorConfig::default()
        };
        assert!(HttpTransport::new(&config).is_err());
    }

    #[test]
    fn headers_carry_bearer_token() {
        let config = GeneratorConfig {
            api_key: "sk-test".into(),
            ..GeneratorConfig::default()
        };
        let transport = HttpTransport::new(&config).unwrap();
        assert_eq!(transport.headers[AUTHORIZATION], "Bearer sk-test");
        assert_eq!(transport.headers[CONTENT_TYPE], "application/json");
        assert_eq!(transport.url(), config.api_url);
    }

    #[test]
    fn success_range() {
        let ok = RawResponse {
            status: 204,
            status_text: String::new(),
            body: String::new(),
        };
        assert!(ok.is_success());
        assert!(
            !RawResponse {
                status: 429,
                ..ok
            }
            .is_success()
        );
    }
}
