//! In-process document store

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{Document, DocumentPath, DocumentStore, DocumentWrite, StoreError};
use crate::clock::{Clock, SystemClock};

/// Document store held in memory, stamping writes with its own clock
pub struct MemoryStore {
    documents: RwLock<HashMap<DocumentPath, Document>>,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Creates an empty store using wall-clock time
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty store with a custom clock
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Number of stored documents
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    /// Whether the store holds no documents
    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError> {
        Ok(self.documents.read().await.get(path).cloned())
    }

    async fn set(&self, path: &DocumentPath, write: DocumentWrite) -> Result<(), StoreError> {
        let document = write.resolve(self.clock.now());
        self.documents.write().await.insert(path.clone(), document);
        Ok(())
    }
}
