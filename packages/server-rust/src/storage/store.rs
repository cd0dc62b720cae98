//! The [`DocumentStore`] trait and its query type.

use async_trait::async_trait;
use real_core::{CollectionPath, DocumentPath, DocumentSnapshot};

use super::batch::{BatchOutcome, WriteBatch};

/// Hard cap on writes in a single batch enforced by the hosted store.
pub const DEFAULT_MAX_BATCH_WRITES: usize = 500;

/// Collection query ordered by document key ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Collection to read.
    pub collection: CollectionPath,
    /// Maximum number of documents returned.
    pub limit: usize,
    /// Only return documents whose key sorts strictly after this one.
    pub start_after: Option<String>,
}

impl Query {
    /// First `limit` documents of `collection` by key.
    #[must_use]
    pub fn ordered_by_key(collection: CollectionPath, limit: usize) -> Self {
        Self {
            collection,
            limit,
            start_after: None,
        }
    }

    /// Continues after the document keyed `key`.
    #[must_use]
    pub fn start_after(mut self, key: impl Into<String>) -> Self {
        self.start_after = Some(key.into());
        self
    }
}

/// Errors raised by the bundled store implementations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("batch of {len} writes exceeds the limit of {max}")]
    BatchTooLarge { len: usize, max: usize },
    #[error("store unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Hierarchical document store.
///
/// Implementations: in-memory ([`MemoryDocumentStore`](super::engines::MemoryDocumentStore)),
/// hosted document databases (out of tree).
///
/// Used as `Arc<dyn DocumentStore>`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Run an ordered, limited collection query.
    async fn query(&self, query: &Query) -> anyhow::Result<Vec<DocumentSnapshot>>;

    /// Read a single document, `None` if absent.
    async fn get(&self, path: &DocumentPath) -> anyhow::Result<Option<DocumentSnapshot>>;

    /// Apply every write in `batch` or none of them.
    async fn commit(&self, batch: WriteBatch) -> anyhow::Result<BatchOutcome>;

    /// Sub-collections currently holding documents directly under `doc`.
    async fn list_collections(&self, doc: &DocumentPath) -> anyhow::Result<Vec<CollectionPath>>;

    /// Largest batch [`commit`](DocumentStore::commit) accepts.
    fn max_batch_writes(&self) -> usize {
        DEFAULT_MAX_BATCH_WRITES
    }
}
