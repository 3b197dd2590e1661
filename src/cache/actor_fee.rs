//! Actor-fee cache over a document store
//!
//! Entries live at `artifacts/<appId>/public/data/actorCache/<normalized name>`
//! with the fields `actorName`, `fee`, `popularity`, `cachedAt` and `source`.
//! Expiry is checked when an entry is read; nothing is ever swept or deleted.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::genai::{ClientError, ResilientClient};
use crate::prompts::{self, ActorFee};
use crate::store::{Document, DocumentPath, DocumentStore, DocumentWrite};

/// Number of days a cached fee stays valid
pub const CACHE_TTL_DAYS: i64 = 30;

/// Provenance tag written with every entry
pub const CACHE_SOURCE: &str = "gemini-api";

/// Collection holding the cached fees
const COLLECTION: &str = "actorCache";

/// Field the store stamps with its write time
const CACHED_AT_FIELD: &str = "cachedAt";

/// Errors from a fee lookup that missed the cache
#[derive(Debug, Error)]
pub enum FeeLookupError {
    /// The AI call failed for good
    #[error("actor fee request failed: {0}")]
    Client(#[from] ClientError),

    /// The model answered with JSON that is not a fee estimate
    #[error("unexpected actor fee payload: {0}")]
    UnexpectedShape(String),
}

/// Document shape as read back from the store
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredFee {
    fee: f64,
    popularity: String,
    cached_at: Option<i64>,
}

/// Canonical cache key for an actor name: trimmed and lowercased
///
/// `"Tom Hanks"`, `"  TOM HANKS "` and `"tom hanks"` all map to `"tom hanks"`.
pub fn normalize_actor_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Whether an entry written at `cached_at` is still valid at `now`
///
/// Valid while less than 30 days have elapsed; exactly 30 days is expired.
pub fn is_fresh(cached_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now.signed_duration_since(cached_at) < Duration::days(CACHE_TTL_DAYS)
}

/// TTL cache for actor fee estimates
///
/// Holds no in-process state beyond its handles; concurrent misses for the
/// same actor each call the API and the last write wins.
#[derive(Clone)]
pub struct ActorFeeCache {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    app_id: String,
}

impl std::fmt::Debug for ActorFeeCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActorFeeCache")
            .field("app_id", &self.app_id)
            .finish()
    }
}

impl ActorFeeCache {
    /// Creates a cache over `store`, judging freshness with `clock`
    ///
    /// # Arguments
    /// * `store` - Where entries are persisted
    /// * `clock` - Time source used to compare against `cachedAt`
    /// * `app_id` - Application namespace in the document path
    pub fn new(
        store: Arc<dyn DocumentStore>,
        clock: Arc<dyn Clock>,
        app_id: impl Into<String>,
    ) -> Self {
        Self {
            store,
            clock,
            app_id: app_id.into(),
        }
    }

    /// Document path of the entry for a normalized key
    pub fn document_path(&self, key: &str) -> DocumentPath {
        DocumentPath::new([
            "artifacts",
            self.app_id.as_str(),
            "public",
            "data",
            COLLECTION,
            key,
        ])
    }

    /// Looks up a valid cached fee
    ///
    /// Returns `None` when there is no entry, the entry is 30 or more days
    /// old, the entry lacks a usable timestamp or fee, or the store read fails.
    pub async fn get(&self, actor_name: &str) -> Option<ActorFee> {
        let key = normalize_actor_name(actor_name);
        let path = self.document_path(&key);

        let document = match self.store.get(&path).await {
            Ok(Some(document)) => document,
            Ok(None) => {
                debug!(actor = %key, "Actor fee cache miss");
                return None;
            }
            Err(e) => {
                warn!(actor = %key, error = %e, "Actor fee cache read failed, treating as miss");
                return None;
            }
        };

        let stored: StoredFee = match serde_json::from_value(Value::Object(document)) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(actor = %key, error = %e, "Ignoring unreadable actor fee cache entry");
                return None;
            }
        };

        let Some(cached_at) = stored
            .cached_at
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        else {
            warn!(actor = %key, "Actor fee cache entry has no valid timestamp");
            return None;
        };

        if !is_fresh(cached_at, self.clock.now()) {
            debug!(actor = %key, cached_at = %cached_at, "Actor fee cache entry expired");
            return None;
        }

        debug!(actor = %key, "Actor fee cache hit");
        Some(ActorFee {
            fee: stored.fee,
            popularity: stored.popularity,
        })
    }

    /// Writes a fee, replacing any previous entry for the same actor
    ///
    /// Failures are logged and swallowed.
    pub async fn set(&self, actor_name: &str, fee: &ActorFee) {
        let key = normalize_actor_name(actor_name);
        let path = self.document_path(&key);

        let mut fields = Document::new();
        fields.insert("actorName".to_string(), json!(actor_name.trim()));
        fields.insert("fee".to_string(), json!(fee.fee));
        fields.insert("popularity".to_string(), json!(fee.popularity));
        fields.insert("source".to_string(), json!(CACHE_SOURCE));
        let write = DocumentWrite::new(fields).server_timestamp(CACHED_AT_FIELD);

        match self.store.set(&path, write).await {
            Ok(()) => debug!(actor = %key, "Cached actor fee"),
            Err(e) => warn!(actor = %key, error = %e, "Actor fee cache write failed"),
        }
    }

    /// Returns the cached fee, or asks the model and caches the answer
    ///
    /// # Arguments
    /// * `actor_name` - Actor as typed by the player
    /// * `client` - Client used on a miss
    ///
    /// # Returns
    /// * `Ok(ActorFee)` - From the cache (no API call) or freshly fetched (one logical call)
    /// * `Err(FeeLookupError)` - The API call failed or returned the wrong shape
    pub async fn get_or_fetch(
        &self,
        actor_name: &str,
        client: &ResilientClient,
    ) -> Result<ActorFee, FeeLookupError> {
        if let Some(fee) = self.get(actor_name).await {
            return Ok(fee);
        }

        let request = prompts::actor_fee_request(client.default_model(), actor_name);
        let payload = client.call(&request).await?;
        let fee: ActorFee = serde_json::from_value(payload)
            .map_err(|e| FeeLookupError::UnexpectedShape(e.to_string()))?;

        self.set(actor_name, &fee).await;
        Ok(fee)
    }
}
