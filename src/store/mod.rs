//! Document store abstraction
//!
//! The actor-fee cache persists through a [`DocumentStore`]: single-document
//! get and set by path, no transactions, last write wins. Timestamps marked on
//! a [`DocumentWrite`] are filled in by the store at write time, never by the
//! caller, so a client with a skewed clock cannot extend an entry's lifetime.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// A stored document: a flat JSON object
pub type Document = Map<String, Value>;

/// Errors raised by a document store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem or connection failure
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// A document could not be encoded or decoded
    #[error("document serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The store refused or could not serve the request
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Slash-separated location of a document, kept as discrete segments
///
/// Segments are stored separately so a segment containing `/` (an actor name,
/// say) stays one segment rather than splitting the path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentPath {
    segments: Vec<String>,
}

impl DocumentPath {
    /// Creates a path from its segments
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// The path's segments, in order
    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

/// A full-document write, with optional store-assigned timestamp fields
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentWrite {
    fields: Document,
    server_timestamps: Vec<String>,
}

impl DocumentWrite {
    /// Creates a write of the given fields
    pub fn new(fields: Document) -> Self {
        Self {
            fields,
            server_timestamps: Vec::new(),
        }
    }

    /// Asks the store to set `field` to its own current time
    pub fn server_timestamp(mut self, field: impl Into<String>) -> Self {
        self.server_timestamps.push(field.into());
        self
    }

    /// Produces the stored document, stamping timestamp fields with `now`
    ///
    /// Timestamps are whole Unix seconds.
    pub fn resolve(self, now: DateTime<Utc>) -> Document {
        let mut fields = self.fields;
        for field in self.server_timestamps {
            fields.insert(field, Value::from(now.timestamp()));
        }
        fields
    }
}

/// Single-document get/set storage
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Reads a document, `Ok(None)` if nothing is stored at `path`
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError>;

    /// Writes a document, replacing whatever was stored at `path`
    async fn set(&self, path: &DocumentPath, write: DocumentWrite) -> Result<(), StoreError>;
}
