//! Shared helpers for unit tests: path shorthands and a store with injectable faults.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use real_core::{CollectionPath, DocumentPath, DocumentSnapshot, Fields};

use crate::storage::engines::MemoryDocumentStore;
use crate::storage::{BatchOutcome, DocumentStore, Query, StoreError, WriteBatch};

pub(crate) fn coll(path: &str) -> CollectionPath {
    CollectionPath::parse(path).unwrap()
}

pub(crate) fn doc(path: &str) -> DocumentPath {
    DocumentPath::parse(path).unwrap()
}

/// Faults injected by [`FaultyStore`].
#[derive(Debug, Default)]
pub(crate) struct Faults {
    /// Fail the commit with this zero-based attempt index for the collection.
    pub fail_commit: Option<(CollectionPath, u64)>,
    /// Fail every query against the collection.
    pub fail_query: Option<CollectionPath>,
    /// Report commits as successful without applying them.
    pub drop_commits: bool,
    /// Apply each batch once behind the caller's back before committing it.
    pub vanish_before_commit: bool,
    /// Sleep before answering each query.
    pub query_delay: Option<Duration>,
    /// Hold each commit back from reads for this long after acknowledging it.
    pub read_lag: Option<Duration>,
    /// After each of the first `n` commits on the collection, another writer
    /// adds one document to it.
    pub insert_after_commit: Option<(CollectionPath, u64)>,
}

/// [`MemoryDocumentStore`] wrapper that misbehaves on request.
pub(crate) struct FaultyStore {
    pub inner: MemoryDocumentStore,
    faults: Faults,
    attempts: Mutex<HashMap<CollectionPath, u64>>,
    pending: Mutex<Vec<(tokio::time::Instant, WriteBatch)>>,
    late_inserts: Mutex<u64>,
}

impl FaultyStore {
    pub fn new(faults: Faults) -> Self {
        Self {
            inner: MemoryDocumentStore::new(),
            faults,
            attempts: Mutex::new(HashMap::new()),
            pending: Mutex::new(Vec::new()),
            late_inserts: Mutex::new(0),
        }
    }

    /// Applies lagged batches whose delay has passed.
    async fn settle(&self) -> anyhow::Result<()> {
        let now = tokio::time::Instant::now();
        let due: Vec<WriteBatch> = {
            let mut pending = self.pending.lock();
            let (due, waiting): (Vec<_>, Vec<_>) =
                pending.drain(..).partition(|(at, _)| *at <= now);
            *pending = waiting;
            due.into_iter().map(|(_, batch)| batch).collect()
        };
        for batch in due {
            self.inner.commit(batch).await?;
        }
        Ok(())
    }

    /// Stands in for a concurrent writer adding to `target`.
    fn insert_late(&self, target: &CollectionPath) {
        let Some((path, limit)) = &self.faults.insert_after_commit else {
            return;
        };
        let mut inserted = self.late_inserts.lock();
        if path == target && *inserted < *limit {
            let key = format!("a-late-{}", *inserted);
            self.inner.insert(&path.doc(&key).unwrap(), Fields::new());
            *inserted += 1;
        }
    }
}

#[async_trait]
impl DocumentStore for FaultyStore {
    async fn query(&self, query: &Query) -> anyhow::Result<Vec<DocumentSnapshot>> {
        if let Some(delay) = self.faults.query_delay {
            tokio::time::sleep(delay).await;
        }
        self.settle().await?;
        if self.faults.fail_query.as_ref() == Some(&query.collection) {
            return Err(StoreError::Unavailable {
                reason: format!("query on {} refused", query.collection),
            }
            .into());
        }
        self.inner.query(query).await
    }

    async fn get(&self, path: &DocumentPath) -> anyhow::Result<Option<DocumentSnapshot>> {
        self.inner.get(path).await
    }

    async fn commit(&self, batch: WriteBatch) -> anyhow::Result<BatchOutcome> {
        let target = batch.ops().first().map(|op| op.path().parent());
        if let Some(target) = target.clone() {
            let attempt = {
                let mut attempts = self.attempts.lock();
                let counter = attempts.entry(target.clone()).or_insert(0);
                let attempt = *counter;
                *counter += 1;
                attempt
            };
            if let Some((path, failing)) = &self.faults.fail_commit {
                if *path == target && *failing == attempt {
                    return Err(StoreError::Unavailable {
                        reason: format!("commit #{attempt} on {target} refused"),
                    }
                    .into());
                }
            }
        }
        if self.faults.drop_commits {
            return Ok(BatchOutcome::default());
        }
        if let Some(lag) = self.faults.read_lag {
            let deleted = batch.len();
            self.pending
                .lock()
                .push((tokio::time::Instant::now() + lag, batch));
            return Ok(BatchOutcome {
                deleted,
                ..BatchOutcome::default()
            });
        }
        if self.faults.vanish_before_commit {
            self.inner.commit(batch.clone()).await?;
        }
        let outcome = self.inner.commit(batch).await?;
        if let Some(target) = &target {
            self.insert_late(target);
        }
        Ok(outcome)
    }

    async fn list_collections(&self, doc: &DocumentPath) -> anyhow::Result<Vec<CollectionPath>> {
        self.inner.list_collections(doc).await
    }
}
