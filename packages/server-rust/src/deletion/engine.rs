//! Single-collection deletion engine.
//!
//! [`CollectionDeleter::delete_collection`] empties one collection's direct
//! documents. Sub-collections of the deleted documents are not touched; the
//! caller passes each of them as its own path.
//!
//! Pages are processed strictly in sequence: page N+1 is only queried once
//! page N's commit has resolved, because the query is defined relative to the
//! documents still present. Between pages the task yields back to the
//! scheduler, so the continuation depth stays constant however many pages a
//! collection has.

use std::sync::Arc;
use std::time::Duration;

use real_core::{CollectionPath, DocumentPath};

use crate::deletion::error::DeletionError;
use crate::storage::{DocumentStore, Query, WriteBatch};
use crate::telemetry::{ErrorReport, ErrorReporter, NullReporter};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Documents deleted per atomic batch unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Consecutive repeated pages tolerated before giving up on a lagging store.
pub const DEFAULT_STALE_PAGE_LIMIT: u32 = 3;

/// Pause before re-reading a page that came back unchanged after its commit.
pub const DEFAULT_STALE_RETRY_DELAY: Duration = Duration::from_millis(50);

/// Tuning for a [`CollectionDeleter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionOptions {
    /// Documents deleted per batch. Must fit the store's batch cap.
    pub page_size: usize,
    /// Wall-clock budget per collection. `None` runs to completion.
    pub deadline: Option<Duration>,
    /// How many times in a row a page may come back unchanged after its
    /// commit before the job fails with [`DeletionError::StaleReads`].
    pub stale_page_limit: u32,
    /// Wait before each re-read of a repeated page, giving a lagging store
    /// time to catch up.
    pub stale_retry_delay: Duration,
}

impl Default for DeletionOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            deadline: None,
            stale_page_limit: DEFAULT_STALE_PAGE_LIMIT,
            stale_retry_delay: DEFAULT_STALE_RETRY_DELAY,
        }
    }
}

// ---------------------------------------------------------------------------
// CollectionDeleter
// ---------------------------------------------------------------------------

/// Progress of one collection deletion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeletionStats {
    /// Batches committed.
    pub pages: u64,
    /// Documents actually removed by those batches.
    pub documents: u64,
}

impl std::ops::AddAssign for DeletionStats {
    fn add_assign(&mut self, rhs: Self) {
        self.pages += rhs.pages;
        self.documents += rhs.documents;
    }
}

/// Empties collections page by page.
///
/// Holds no per-job state; one deleter can run any number of jobs
/// concurrently, including two jobs on the same path.
#[derive(Clone)]
pub struct CollectionDeleter {
    store: Arc<dyn DocumentStore>,
    reporter: Arc<dyn ErrorReporter>,
    options: DeletionOptions,
    function: &'static str,
}

impl CollectionDeleter {
    /// Creates a deleter over `store`, reporting failures to `reporter`.
    ///
    /// # Errors
    ///
    /// Returns [`DeletionError::InvalidPageSize`] if the page size is zero or
    /// larger than the store's batch cap.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        reporter: Arc<dyn ErrorReporter>,
        options: DeletionOptions,
    ) -> Result<Self, DeletionError> {
        let max = store.max_batch_writes();
        if options.page_size == 0 || options.page_size > max {
            return Err(DeletionError::InvalidPageSize {
                page_size: options.page_size,
                max,
            });
        }
        Ok(Self {
            store,
            reporter,
            options,
            function: "deleteCollection",
        })
    }

    /// Tags failure reports with the name of the calling handler.
    #[must_use]
    pub fn for_function(mut self, function: &'static str) -> Self {
        self.function = function;
        self
    }

    #[must_use]
    pub fn options(&self) -> &DeletionOptions {
        &self.options
    }

    /// Deletes every document directly in `path`.
    ///
    /// Resolves once a query over `path` comes back empty. Deleting an empty
    /// or missing collection commits nothing.
    ///
    /// # Errors
    ///
    /// Returns the first query or commit failure, a deadline expiry, or
    /// [`DeletionError::StaleReads`]. Each failure is also sent to the
    /// reporter before it is returned.
    pub async fn delete_collection(
        &self,
        path: &CollectionPath,
    ) -> Result<DeletionStats, DeletionError> {
        let mut stats = DeletionStats::default();
        let drained = match self.options.deadline {
            Some(deadline) => tokio::time::timeout(deadline, self.drain(path, &mut stats))
                .await
                .ok(),
            None => Some(self.drain(path, &mut stats).await),
        };

        let result = match drained {
            Some(result) => result.map(|()| stats),
            None => Err(DeletionError::DeadlineExceeded {
                path: path.clone(),
                deadline_ms: self
                    .options
                    .deadline
                    .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
                pages: stats.pages,
            }),
        };

        match &result {
            Ok(stats) => {
                tracing::debug!(
                    path = %path,
                    pages = stats.pages,
                    documents = stats.documents,
                    "collection emptied"
                );
            }
            Err(err) => self.report(err),
        }
        result
    }

    fn report(&self, err: &DeletionError) {
        metrics::counter!("real_deletion_failures_total", "kind" => err.kind()).increment(1);
        let mut report = ErrorReport::new(self.function, err);
        if let Some(path) = err.path() {
            report = report.with_path(path);
        }
        if let Some(page) = err.page() {
            report = report.with_page(page);
        }
        self.reporter.capture_error(report);
    }

    /// The page loop. `stats` is updated after every commit so a deadline
    /// expiry can still tell how far the job got.
    async fn drain(
        &self,
        path: &CollectionPath,
        stats: &mut DeletionStats,
    ) -> Result<(), DeletionError> {
        let query = Query::ordered_by_key(path.clone(), self.options.page_size);
        let mut previous: Vec<DocumentPath> = Vec::new();
        let mut repeats = 0_u32;

        loop {
            let page = stats.pages;
            let docs = self
                .store
                .query(&query)
                .await
                .map_err(|source| DeletionError::Query {
                    path: path.clone(),
                    page,
                    source,
                })?;
            if docs.is_empty() {
                return Ok(());
            }

            let keys: Vec<DocumentPath> = docs.into_iter().map(|doc| doc.path).collect();
            if keys == previous {
                // The last commit succeeded but its deletes are not visible yet.
                repeats += 1;
                if repeats > self.options.stale_page_limit {
                    return Err(DeletionError::StaleReads {
                        path: path.clone(),
                        page,
                    });
                }
                tracing::warn!(path = %path, page, repeats, "page returned again after commit");
                tokio::time::sleep(self.options.stale_retry_delay).await;
                continue;
            }
            repeats = 0;

            let mut batch = WriteBatch::new();
            for key in &keys {
                batch.delete(key.clone());
            }
            let outcome = self
                .store
                .commit(batch)
                .await
                .map_err(|source| DeletionError::Commit {
                    path: path.clone(),
                    page,
                    source,
                })?;

            stats.pages += 1;
            stats.documents += outcome.deleted as u64;
            metrics::counter!("real_deletion_pages_total").increment(1);
            metrics::counter!("real_deletion_documents_total").increment(outcome.deleted as u64);
            if outcome.deleted == 0 {
                // Another deleter got there first; the next query moves on.
                tracing::debug!(path = %path, page, "page was already gone at commit");
            }

            previous = keys;
            tokio::task::yield_now().await;
        }
    }
}

// ---------------------------------------------------------------------------
// Free-function entry point
// ---------------------------------------------------------------------------

/// Deletes every document directly in `path`, `page_size` documents per
/// batch, without a deadline or an error sink.
///
/// # Errors
///
/// See [`CollectionDeleter::new`] and [`CollectionDeleter::delete_collection`].
pub async fn delete_collection(
    store: Arc<dyn DocumentStore>,
    path: &CollectionPath,
    page_size: usize,
) -> Result<DeletionStats, DeletionError> {
    let options = DeletionOptions {
        page_size,
        ..DeletionOptions::default()
    };
    CollectionDeleter::new(store, Arc::new(NullReporter), options)?
        .delete_collection(path)
        .await
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
