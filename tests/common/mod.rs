//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use castcall::genai::{
    ClientConfig, HttpReply, ResilientClient, RetryPolicy, Transport, TransportError,
};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Transport that replays scripted replies and counts calls
///
/// Once the script runs out, every further call gets `fallback`.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<HttpReply, TransportError>>>,
    fallback: Result<HttpReply, TransportError>,
    calls: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Result<HttpReply, TransportError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            fallback: Err(TransportError::Network("script exhausted".to_string())),
            calls: AtomicUsize::new(0),
        })
    }

    /// Answers every call with the same reply
    pub fn always(reply: Result<HttpReply, TransportError>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            fallback: reply,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn post_json(&self, _url: &str, _body: &Value) -> Result<HttpReply, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // Let concurrent callers interleave like they would on a real network
        tokio::task::yield_now().await;
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }
}

/// A 200 reply whose envelope embeds `payload`
pub fn ok_reply(payload: Value) -> Result<HttpReply, TransportError> {
    let body = json!({
        "candidates": [{ "content": { "parts": [{ "text": payload.to_string() }] } }]
    });
    Ok(HttpReply {
        status: 200,
        body: body.to_string(),
    })
}

/// A reply with the given status and a small error body
pub fn status_reply(status: u16) -> Result<HttpReply, TransportError> {
    Ok(HttpReply {
        status,
        body: json!({ "error": { "code": status } }).to_string(),
    })
}

/// A 200 reply carrying a fee estimate
pub fn fee_reply(fee: f64, popularity: &str) -> Result<HttpReply, TransportError> {
    ok_reply(json!({ "fee": fee, "popularity": popularity }))
}

/// Client over `transport` that retries without sleeping
pub fn fast_client(transport: Arc<ScriptedTransport>) -> ResilientClient {
    ResilientClient::new(transport, ClientConfig::new("test-key"))
        .with_policy(RetryPolicy::immediate())
}
