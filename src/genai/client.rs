//! Resilient client for the generative-AI endpoint
//!
//! [`ResilientClient::call`] turns one logical request into up to
//! [`MAX_ATTEMPTS`](super::retry::MAX_ATTEMPTS) HTTP attempts. Each attempt is
//! classified as a success, a retryable failure or a terminal failure, and the
//! loop either returns, gives up, or sleeps and tries again.

use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use super::envelope::{decode_payload, GenerateRequest, MalformedResponse};
use super::retry::{is_retryable_status, AttemptFailure, RetryPolicy};
use super::transport::{HttpReply, Transport};

/// Base URL (including API version) of the generative-AI API
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Terminal outcome of a logical call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// A non-retryable status; no further attempts were made
    #[error("request rejected with status {status}: {body}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },

    /// Every attempt returned a 2xx without a usable payload
    #[error("invalid response structure after {attempts} attempts: {reason}")]
    InvalidResponse {
        /// Attempts made
        attempts: u32,
        /// What was wrong with the last response
        reason: MalformedResponse,
    },

    /// Retries ran out on server errors, rate limits or network failures
    #[error("request failed after {attempts} attempts: {last}")]
    Exhausted {
        /// Attempts made
        attempts: u32,
        /// The last observed cause
        last: AttemptFailure,
    },
}

impl ClientError {
    /// Builds the terminal error for a call that ran out of attempts
    fn exhausted(attempts: u32, last: AttemptFailure) -> Self {
        match last {
            AttemptFailure::Malformed(reason) => ClientError::InvalidResponse { attempts, reason },
            last => ClientError::Exhausted { attempts, last },
        }
    }

    /// Number of HTTP attempts made before retries ran out
    ///
    /// `None` for a rejection, which ends the call wherever it happens.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            ClientError::Rejected { .. } => None,
            ClientError::InvalidResponse { attempts, .. }
            | ClientError::Exhausted { attempts, .. } => Some(*attempts),
        }
    }
}

/// Classification of one attempt
#[derive(Debug)]
enum AttemptOutcome {
    Success(Value),
    Retryable(AttemptFailure),
    Terminal(ClientError),
}

/// Endpoint and credentials for the generative-AI API
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL including the API version segment
    pub api_base: String,
    /// API key sent as the `key` query parameter
    pub api_key: String,
    /// Model used by request builders that do not name one
    pub default_model: String,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_base", &self.api_base)
            .field("api_key", &"[REDACTED]")
            .field("default_model", &self.default_model)
            .finish()
    }
}

impl ClientConfig {
    /// Config for the public endpoint with the default model
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: api_key.into(),
            default_model: DEFAULT_MODEL.to_string(),
        }
    }
}

/// Client that hides transient failures of the generative-AI endpoint
///
/// Holds no per-call state, so one instance can serve many concurrent calls.
#[derive(Clone)]
pub struct ResilientClient {
    transport: Arc<dyn Transport>,
    config: ClientConfig,
    policy: RetryPolicy,
}

impl std::fmt::Debug for ResilientClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilientClient")
            .field("config", &self.config)
            .field("policy", &self.policy)
            .finish()
    }
}

impl ResilientClient {
    /// Creates a client with the default retry policy
    pub fn new(transport: Arc<dyn Transport>, config: ClientConfig) -> Self {
        Self {
            transport,
            config,
            policy: RetryPolicy::default(),
        }
    }

    /// Replaces the retry policy
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Model used when a request builder is not given one explicitly
    pub fn default_model(&self) -> &str {
        &self.config.default_model
    }

    /// The retry policy in effect
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Full `generateContent` URL for a model, including the API key
    pub fn endpoint_url(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.config.api_base.trim_end_matches('/'),
            model,
            self.config.api_key
        )
    }

    /// Performs one logical request, retrying transient failures
    ///
    /// The request body is built once and sent unchanged on every attempt.
    ///
    /// # Arguments
    /// * `request` - Model, prompts and response schema
    ///
    /// # Returns
    /// * `Ok(Value)` - The JSON payload embedded in the response envelope
    /// * `Err(ClientError)` - A rejection, or the last cause once attempts run out
    pub async fn call(&self, request: &GenerateRequest) -> Result<Value, ClientError> {
        let url = self.endpoint_url(&request.model);
        let body = request.to_body();
        let max_attempts = self.policy.max_attempts.max(1);

        let mut attempt: u32 = 0;
        loop {
            debug!(
                model = %request.model,
                attempt = attempt + 1,
                "Sending generateContent request"
            );

            let failure = match self.attempt(&url, &body).await {
                AttemptOutcome::Success(payload) => {
                    if attempt > 0 {
                        debug!(
                            model = %request.model,
                            attempts = attempt + 1,
                            "Request succeeded after retries"
                        );
                    }
                    return Ok(payload);
                }
                AttemptOutcome::Terminal(err) => {
                    warn!(model = %request.model, error = %err, "Request rejected");
                    return Err(err);
                }
                AttemptOutcome::Retryable(failure) => failure,
            };

            // Final attempt: no more waiting
            if attempt + 1 >= max_attempts {
                let err = ClientError::exhausted(attempt + 1, failure);
                warn!(model = %request.model, error = %err, "Giving up");
                return Err(err);
            }

            let delay = self.policy.delay_for(attempt, &failure, self.policy.jitter());
            warn!(
                model = %request.model,
                attempt = attempt + 1,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                cause = %failure,
                "Retryable failure, backing off"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// Makes one HTTP attempt and classifies the result
    async fn attempt(&self, url: &str, body: &Value) -> AttemptOutcome {
        match self.transport.post_json(url, body).await {
            Ok(reply) => classify_reply(reply),
            Err(err) => AttemptOutcome::Retryable(AttemptFailure::Network(err)),
        }
    }
}

/// Maps an HTTP reply onto success, retryable failure or terminal failure
fn classify_reply(reply: HttpReply) -> AttemptOutcome {
    if reply.is_success() {
        return match decode_payload(&reply.body) {
            Ok(payload) => AttemptOutcome::Success(payload),
            Err(malformed) => AttemptOutcome::Retryable(AttemptFailure::Malformed(malformed)),
        };
    }

    if is_retryable_status(reply.status) {
        AttemptOutcome::Retryable(AttemptFailure::Status {
            status: reply.status,
            body: reply.body,
        })
    } else {
        AttemptOutcome::Terminal(ClientError::Rejected {
            status: reply.status,
            body: reply.body,
        })
    }
}
