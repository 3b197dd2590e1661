//! HTTP front door for the game
//!
//! Three POST-only JSON endpoints: `/analyzeBook`, `/getActorFee` and
//! `/generateMovieResults`. Each checks its required body fields (400 with the
//! missing names), answers other methods with 405, maps internal failures to a
//! short 500 message, and returns the model's JSON on success.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

use crate::cache::ActorFeeCache;
use crate::genai::ResilientClient;
use crate::prompts::{self, CastMember};

/// Shared state for all handlers
#[derive(Debug, Clone)]
pub struct AppState {
    /// Client for the generative-AI endpoint
    pub client: ResilientClient,
    /// Actor fee cache
    pub fee_cache: ActorFeeCache,
}

/// Errors returned to HTTP callers
#[derive(Debug, Error)]
pub enum ApiError {
    /// Required body fields were absent, null, blank or of the wrong kind
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    /// Anything that went wrong after validation
    #[error("{0}")]
    Internal(&'static str),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::MissingFields(missing) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Missing required fields", "missing": missing })),
            )
                .into_response(),
            ApiError::Internal(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": message })),
            )
                .into_response(),
        }
    }
}

/// Build the axum router with all game routes
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/analyzeBook", post(analyze_book))
        .route("/getActorFee", post(get_actor_fee))
        .route("/generateMovieResults", post(generate_movie_results))
        .with_state(Arc::new(state))
}

/// Parses a request body, treating anything but a JSON value as empty
fn parse_body(body: &Bytes) -> Value {
    serde_json::from_slice(body).unwrap_or(Value::Null)
}

/// A required body field and the kind of JSON it must hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Required {
    /// Must be a non-blank string
    Text(&'static str),
    /// Must be present and not null
    Value(&'static str),
}

impl Required {
    fn name(self) -> &'static str {
        match self {
            Required::Text(name) | Required::Value(name) => name,
        }
    }

    fn is_satisfied_by(self, body: &Value) -> bool {
        match (self, body.get(self.name())) {
            (_, None | Some(Value::Null)) => false,
            (Required::Text(_), Some(Value::String(s))) => !s.trim().is_empty(),
            (Required::Text(_), Some(_)) => false,
            (Required::Value(_), Some(_)) => true,
        }
    }
}

/// Names of required fields that are absent, null or of the wrong kind
///
/// A text field holding a number, bool, array or object counts as missing,
/// as does one holding a blank string.
pub fn missing_fields(body: &Value, required: &[Required]) -> Vec<&'static str> {
    required
        .iter()
        .filter(|field| !field.is_satisfied_by(body))
        .map(|field| field.name())
        .collect()
}

fn require(body: &Value, required: &[Required]) -> Result<(), ApiError> {
    let missing = missing_fields(body, required);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ApiError::MissingFields(missing))
    }
}

/// POST /analyzeBook: summary, genre and characters of a book
async fn analyze_book(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let body = parse_body(&body);
    require(&body, &[Required::Text("bookTitle")])?;

    let title = body["bookTitle"].as_str().unwrap_or_default();
    let author = body.get("author").and_then(Value::as_str);
    info!(book = %title, "Analyzing book");

    let request = prompts::book_analysis_request(state.client.default_model(), title, author);
    state.client.call(&request).await.map(Json).map_err(|e| {
        error!(error = %e, "Book analysis failed");
        ApiError::Internal("Failed to analyze book")
    })
}

/// POST /getActorFee: cached fee estimate for an actor
async fn get_actor_fee(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let body = parse_body(&body);
    require(&body, &[Required::Text("actorName")])?;

    let actor_name = body["actorName"].as_str().unwrap_or_default();
    let fee = state
        .fee_cache
        .get_or_fetch(actor_name, &state.client)
        .await
        .map_err(|e| {
            error!(actor = %actor_name, error = %e, "Actor fee lookup failed");
            ApiError::Internal("Failed to get actor fee")
        })?;

    Ok(Json(json!({ "fee": fee.fee, "popularity": fee.popularity })))
}

/// POST /generateMovieResults: simulated reception of the finished film
async fn generate_movie_results(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let body = parse_body(&body);
    require(&body, &[Required::Text("bookTitle"), Required::Value("cast")])?;

    let title = body["bookTitle"].as_str().unwrap_or_default();
    let cast: Vec<CastMember> = serde_json::from_value(body["cast"].clone()).map_err(|e| {
        error!(error = %e, "Invalid cast list");
        ApiError::Internal("Failed to generate movie results")
    })?;
    let budget = body.get("budget").and_then(Value::as_f64);
    info!(book = %title, cast = cast.len(), "Generating movie results");

    let request =
        prompts::movie_results_request(state.client.default_model(), title, &cast, budget);
    state.client.call(&request).await.map(Json).map_err(|e| {
        error!(error = %e, "Movie result generation failed");
        ApiError::Internal("Failed to generate movie results")
    })
}
