//! Generative-AI API access
//!
//! This module provides a client for the `generateContent` endpoint that
//! retries transient failures (5xx, 429, network errors and malformed 2xx
//! responses) with exponential backoff and jitter, and fails fast on other
//! client errors.

mod client;
mod envelope;
mod retry;
mod transport;

pub use client::{ClientConfig, ClientError, ResilientClient, DEFAULT_API_BASE, DEFAULT_MODEL};
pub use envelope::{decode_payload, extract_text, GenerateRequest, MalformedResponse};
pub use retry::{is_retryable_status, AttemptFailure, RetryPolicy, MAX_ATTEMPTS};
pub use transport::{HttpReply, ReqwestTransport, Transport, TransportError};
