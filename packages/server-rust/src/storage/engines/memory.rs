//! In-memory [`DocumentStore`] implementation.
//!
//! Each collection is an ordered `BTreeMap` keyed by document key, so key
//! queries are range scans. All collections sit behind one `RwLock`, which
//! makes every batch commit atomic with respect to every query.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use real_core::{CollectionPath, DocumentPath, DocumentSnapshot, Fields};

use crate::storage::batch::{BatchOutcome, WriteBatch, WriteOp};
use crate::storage::store::{DocumentStore, Query, StoreError, DEFAULT_MAX_BATCH_WRITES};

type Collection = BTreeMap<String, Fields>;

// ---------------------------------------------------------------------------
// MemoryDocumentStore
// ---------------------------------------------------------------------------

/// In-memory document store for development and tests.
///
/// Enforces the same per-batch write cap as the hosted store and counts
/// commits, so tests can assert how many batches a job needed.
pub struct MemoryDocumentStore {
    collections: RwLock<BTreeMap<CollectionPath, Collection>>,
    max_batch_writes: usize,
    commits: AtomicU64,
}

impl MemoryDocumentStore {
    /// Creates an empty store with the hosted store's batch cap.
    #[must_use]
    pub fn new() -> Self {
        Self::with_batch_limit(DEFAULT_MAX_BATCH_WRITES)
    }

    /// Creates an empty store rejecting batches above `max_batch_writes`.
    #[must_use]
    pub fn with_batch_limit(max_batch_writes: usize) -> Self {
        Self {
            collections: RwLock::new(BTreeMap::new()),
            max_batch_writes,
            commits: AtomicU64::new(0),
        }
    }

    /// Writes a document directly, bypassing batching and the commit counter.
    pub fn insert(&self, path: &DocumentPath, fields: Fields) {
        self.collections
            .write()
            .entry(path.parent())
            .or_default()
            .insert(path.id().to_string(), fields);
    }

    /// Inserts `count` documents keyed `doc-00000`, `doc-00001`, ...
    pub fn seed(&self, collection: &CollectionPath, count: usize) {
        let mut guard = self.collections.write();
        let docs = guard.entry(collection.clone()).or_default();
        for i in 0..count {
            docs.insert(format!("doc-{i:05}"), Fields::new());
        }
    }

    /// Number of documents directly in `collection`.
    #[must_use]
    pub fn document_count(&self, collection: &CollectionPath) -> usize {
        self.collections.read().get(collection).map_or(0, BTreeMap::len)
    }

    /// Number of documents in the whole store.
    #[must_use]
    pub fn total_documents(&self) -> usize {
        self.collections.read().values().map(BTreeMap::len).sum()
    }

    /// Every non-empty collection, in path order.
    #[must_use]
    pub fn collection_paths(&self) -> Vec<CollectionPath> {
        self.collections.read().keys().cloned().collect()
    }

    /// Number of successful [`commit`](DocumentStore::commit) calls.
    #[must_use]
    pub fn commit_count(&self) -> u64 {
        self.commits.load(Ordering::SeqCst)
    }
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Batch application
// ---------------------------------------------------------------------------

/// Applies one staged write, tallying it into `outcome`. Emptied
/// collections are dropped.
fn apply(
    collections: &mut BTreeMap<CollectionPath, Collection>,
    op: WriteOp,
    outcome: &mut BatchOutcome,
) {
    match op {
        WriteOp::Set { path, fields } => {
            collections
                .entry(path.parent())
                .or_default()
                .insert(path.id().to_string(), fields);
            outcome.written += 1;
        }
        WriteOp::Merge { path, fields } => {
            collections
                .entry(path.parent())
                .or_default()
                .entry(path.id().to_string())
                .or_default()
                .extend(fields);
            outcome.written += 1;
        }
        WriteOp::Delete { path } => {
            let parent = path.parent();
            let Some(docs) = collections.get_mut(&parent) else {
                return;
            };
            if docs.remove(path.id()).is_some() {
                outcome.deleted += 1;
            }
            if docs.is_empty() {
                collections.remove(&parent);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// DocumentStore impl
// ---------------------------------------------------------------------------

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn query(&self, query: &Query) -> anyhow::Result<Vec<DocumentSnapshot>> {
        let guard = self.collections.read();
        let Some(docs) = guard.get(&query.collection) else {
            return Ok(Vec::new());
        };
        let lower = match &query.start_after {
            Some(key) => Bound::Excluded(key.clone()),
            None => Bound::Unbounded,
        };
        docs.range((lower, Bound::Unbounded))
            .take(query.limit)
            .map(|(key, fields)| -> anyhow::Result<DocumentSnapshot> {
                Ok(DocumentSnapshot::new(query.collection.doc(key)?, fields.clone()))
            })
            .collect()
    }

    async fn get(&self, path: &DocumentPath) -> anyhow::Result<Option<DocumentSnapshot>> {
        Ok(self
            .collections
            .read()
            .get(&path.parent())
            .and_then(|docs| docs.get(path.id()))
            .map(|fields| DocumentSnapshot::new(path.clone(), fields.clone())))
    }

    async fn commit(&self, batch: WriteBatch) -> anyhow::Result<BatchOutcome> {
        if batch.len() > self.max_batch_writes {
            return Err(StoreError::BatchTooLarge {
                len: batch.len(),
                max: self.max_batch_writes,
            }
            .into());
        }

        let mut outcome = BatchOutcome::default();
        let mut guard = self.collections.write();
        for op in batch.into_ops() {
            apply(&mut guard, op, &mut outcome);
        }
        drop(guard);

        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(outcome)
    }

    async fn list_collections(&self, doc: &DocumentPath) -> anyhow::Result<Vec<CollectionPath>> {
        Ok(self
            .collections
            .read()
            .keys()
            .filter(|path| path.parent().as_ref() == Some(doc))
            .cloned()
            .collect())
    }

    fn max_batch_writes(&self) -> usize {
        self.max_batch_writes
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use real_core::{fields, Value};

    use super::*;

    fn coll(path: &str) -> CollectionPath {
        CollectionPath::parse(path).unwrap()
    }

    fn doc(path: &str) -> DocumentPath {
        DocumentPath::parse(path).unwrap()
    }

    #[tokio::test]
    async fn query_orders_by_key_and_respects_limit() {
        let store = MemoryDocumentStore::new();
        for key in ["c", "a", "d", "b"] {
            store.insert(&doc(&format!("notes/{key}")), Fields::new());
        }

        let page = store
            .query(&Query::ordered_by_key(coll("notes"), 3))
            .await
            .unwrap();
        let keys: Vec<&str> = page.iter().map(DocumentSnapshot::id).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);

        let rest = store
            .query(&Query::ordered_by_key(coll("notes"), 3).start_after("c"))
            .await
            .unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].id(), "d");
    }

    #[tokio::test]
    async fn query_on_missing_collection_is_empty() {
        let store = MemoryDocumentStore::new();
        let page = store
            .query(&Query::ordered_by_key(coll("nothing/here/at-all"), 10))
            .await
            .unwrap();
        assert!(page.is_empty());
    }

    #[tokio::test]
    async fn commit_applies_set_merge_and_delete() {
        let store = MemoryDocumentStore::new();
        let a = doc("notes/a");
        let b = doc("notes/b");
        store.insert(&b, Fields::new());

        let mut batch = WriteBatch::new();
        batch
            .set(a.clone(), fields([("title", "first")]))
            .merge(a.clone(), fields([("body", "text")]))
            .delete(b.clone())
            .delete(doc("notes/absent"));
        let outcome = store.commit(batch).await.unwrap();

        assert_eq!(outcome, BatchOutcome { written: 2, deleted: 1 });
        let snap = store.get(&a).await.unwrap().unwrap();
        assert_eq!(snap.get("title"), Some(&Value::from("first")));
        assert_eq!(snap.get("body"), Some(&Value::from("text")));
        assert!(store.get(&b).await.unwrap().is_none());
        assert_eq!(store.commit_count(), 1);
    }

    #[tokio::test]
    async fn oversized_batch_is_rejected_without_applying() {
        let store = MemoryDocumentStore::with_batch_limit(2);
        let mut batch = WriteBatch::new();
        for key in ["a", "b", "c"] {
            batch.set(doc(&format!("notes/{key}")), Fields::new());
        }

        let err = store.commit(batch).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::BatchTooLarge { len: 3, max: 2 })
        ));
        assert_eq!(store.total_documents(), 0);
        assert_eq!(store.commit_count(), 0);
    }

    #[tokio::test]
    async fn emptied_collections_disappear_from_listing() {
        let store = MemoryDocumentStore::new();
        let message = doc("messageMessage/m1");
        store.insert(&doc("messageMessage/m1/structure/hook"), Fields::new());
        store.insert(&doc("messageMessage/m1/sections/s1"), Fields::new());
        store.insert(&doc("messageMessage/m1/sections/s1/notes/n1"), Fields::new());

        let mut listed = store.list_collections(&message).await.unwrap();
        listed.sort();
        assert_eq!(
            listed,
            vec![coll("messageMessage/m1/sections"), coll("messageMessage/m1/structure")]
        );

        let mut batch = WriteBatch::new();
        batch.delete(doc("messageMessage/m1/structure/hook"));
        store.commit(batch).await.unwrap();

        let listed = store.list_collections(&message).await.unwrap();
        assert_eq!(listed, vec![coll("messageMessage/m1/sections")]);
    }

    #[test]
    fn seed_and_counts() {
        let store = MemoryDocumentStore::new();
        let notes = coll("notes");
        store.seed(&notes, 12);
        assert_eq!(store.document_count(&notes), 12);
        assert_eq!(store.total_documents(), 12);
        assert_eq!(store.collection_paths(), vec![notes]);
    }
}
