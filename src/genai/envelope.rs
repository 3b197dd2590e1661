//! Wire format for the `generateContent` endpoint
//!
//! Request bodies are built from a [`GenerateRequest`]; responses are decoded
//! field by field so each missing level of the envelope maps to its own
//! [`MalformedResponse`] variant.

use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

/// One logical "ask the model a structured question" request
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    /// Model variant, e.g. `gemini-2.0-flash`
    pub model: String,
    /// User prompt text
    pub prompt: String,
    /// System instruction text
    pub system_instruction: String,
    /// Schema the remote model is asked to follow (not validated locally)
    pub response_schema: Value,
}

impl GenerateRequest {
    /// Builds the JSON body sent to the endpoint
    pub fn to_body(&self) -> Value {
        json!({
            "contents": [{
                "parts": [{ "text": self.prompt }]
            }],
            "systemInstruction": {
                "parts": [{ "text": self.system_instruction }]
            },
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": self.response_schema
            }
        })
    }
}

/// Ways a successful (2xx) response can fail to carry a usable payload
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedResponse {
    /// The body itself is not a JSON envelope
    #[error("response body is not a valid envelope: {0}")]
    NotAnEnvelope(String),

    /// `candidates` is absent or empty
    #[error("response has no candidates")]
    NoCandidates,

    /// The first candidate has no `content`
    #[error("candidate has no content")]
    NoContent,

    /// `content.parts` is absent or empty
    #[error("content has no parts")]
    NoParts,

    /// The first part carries no `text`
    #[error("part has no text")]
    NoText,

    /// The embedded text is not valid JSON
    #[error("embedded payload is not valid JSON: {0}")]
    InvalidPayload(String),
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

/// Extracts the embedded text payload from a response envelope
pub fn extract_text(body: &str) -> Result<String, MalformedResponse> {
    let envelope: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| MalformedResponse::NotAnEnvelope(e.to_string()))?;

    let candidate = envelope
        .candidates
        .into_iter()
        .next()
        .ok_or(MalformedResponse::NoCandidates)?;
    let content = candidate.content.ok_or(MalformedResponse::NoContent)?;
    let part = content
        .parts
        .into_iter()
        .next()
        .ok_or(MalformedResponse::NoParts)?;

    part.text.ok_or(MalformedResponse::NoText)
}

/// Decodes a response envelope all the way down to the JSON payload
///
/// # Arguments
/// * `body` - Raw response body from a 2xx reply
///
/// # Returns
/// * `Ok(Value)` - The parsed payload
/// * `Err(MalformedResponse)` - The first missing or invalid level
pub fn decode_payload(body: &str) -> Result<Value, MalformedResponse> {
    let text = extract_text(body)?;
    serde_json::from_str(&text).map_err(|e| MalformedResponse::InvalidPayload(e.to_string()))
}
