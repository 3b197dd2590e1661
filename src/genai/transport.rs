//! HTTP transport for the generative-AI endpoint
//!
//! The retry loop only needs "POST this JSON, tell me the status and body".
//! Keeping that behind a trait lets the loop be driven by scripted replies in
//! tests while production goes through reqwest.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::fmt::Display;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Per-request timeout for the reqwest transport
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// A raw HTTP reply: status code plus the body text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub body: String,
}

impl HttpReply {
    /// Whether the status is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failure to obtain any HTTP response at all
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Connection, DNS, TLS or timeout failure
    #[error("network request failed: {0}")]
    Network(String),

    /// The response started but its body could not be read
    #[error("failed to read response body: {0}")]
    Body(String),
}

/// Sends one JSON POST request
#[async_trait]
pub trait Transport: Send + Sync {
    /// POSTs `body` to `url` and returns the reply, whatever its status
    async fn post_json(&self, url: &str, body: &Value) -> Result<HttpReply, TransportError>;
}

/// Transport backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ReqwestTransport {
    /// Creates a transport with a default client and a 120 second timeout
    pub fn new() -> Self {
        let built = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build();
        Self {
            client: client_or_default(built),
        }
    }

    /// Creates a transport with a custom HTTP client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

/// Falls back to an untimed default client when the configured one cannot be built
fn client_or_default<E: Display>(built: Result<Client, E>) -> Client {
    built.unwrap_or_else(|e| {
        warn!(
            error = %e,
            "Failed to build HTTP client with a {}s timeout, requests will not time out",
            REQUEST_TIMEOUT_SECS
        );
        Client::new()
    })
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post_json(&self, url: &str, body: &Value) -> Result<HttpReply, TransportError> {
        // reqwest errors can embed the URL, which carries the API key
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.without_url().to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Body(e.without_url().to_string()))?;

        Ok(HttpReply { status, body })
    }
}
