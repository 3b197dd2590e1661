//! Cache module for AI-derived actor fees
//!
//! This module provides a TTL cache in front of the actor-fee lookup. Entries
//! are keyed by normalized actor name, live in a [`DocumentStore`](crate::store::DocumentStore)
//! and are valid for 30 days from the store-assigned write time. Store faults
//! never reach the caller: a failed read is a miss and a failed write is a no-op.

mod actor_fee;

pub use actor_fee::{
    is_fresh, normalize_actor_name, ActorFeeCache, FeeLookupError, CACHE_SOURCE, CACHE_TTL_DAYS,
};
