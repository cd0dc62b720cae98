//! Multi-path fan-out over [`CollectionDeleter`].

use std::collections::HashSet;

use futures_util::future::join_all;
use real_core::CollectionPath;

use crate::deletion::engine::{CollectionDeleter, DeletionStats};
use crate::deletion::error::DeletionError;

/// Result of deleting one collection path.
#[derive(Debug)]
pub struct PathOutcome {
    pub path: CollectionPath,
    pub result: Result<DeletionStats, DeletionError>,
}

/// Per-path results of [`CollectionDeleter::delete_paths`], in request order.
#[derive(Debug, Default)]
pub struct DeletionReport {
    outcomes: Vec<PathOutcome>,
}

impl DeletionReport {
    #[must_use]
    pub fn outcomes(&self) -> &[PathOutcome] {
        &self.outcomes
    }

    /// Whether every path was emptied.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    /// Paths that failed, with their errors.
    pub fn failures(&self) -> impl Iterator<Item = (&CollectionPath, &DeletionError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|err| (&o.path, err)))
    }

    /// Sum over the paths that succeeded.
    #[must_use]
    pub fn totals(&self) -> DeletionStats {
        let mut totals = DeletionStats::default();
        for stats in self.outcomes.iter().filter_map(|o| o.result.as_ref().ok()) {
            totals += *stats;
        }
        totals
    }

    /// Collapses the report: `Ok` with the totals only if every path succeeded.
    ///
    /// # Errors
    ///
    /// Returns [`SubtreeDeletionError`] carrying every failed path.
    pub fn into_result(self) -> Result<DeletionStats, SubtreeDeletionError> {
        let total = self.outcomes.len();
        let totals = self.totals();
        let failures: Vec<(CollectionPath, DeletionError)> = self
            .outcomes
            .into_iter()
            .filter_map(|o| o.result.err().map(|err| (o.path, err)))
            .collect();
        if failures.is_empty() {
            Ok(totals)
        } else {
            Err(SubtreeDeletionError { total, failures })
        }
    }
}

/// One or more paths of a subtree could not be emptied.
#[derive(Debug, thiserror::Error)]
#[error("{} of {total} collection deletions failed", .failures.len())]
pub struct SubtreeDeletionError {
    /// Number of distinct paths attempted.
    pub total: usize,
    pub failures: Vec<(CollectionPath, DeletionError)>,
}

impl CollectionDeleter {
    /// Empties every path in `paths` concurrently.
    ///
    /// Duplicate paths run once. A failing path never cancels its siblings;
    /// every path runs to completion or failure and gets its own outcome.
    pub async fn delete_paths(&self, paths: &[CollectionPath]) -> DeletionReport {
        let mut seen = HashSet::new();
        let unique: Vec<&CollectionPath> = paths.iter().filter(|p| seen.insert(*p)).collect();

        let results = join_all(unique.iter().map(|path| self.delete_collection(path))).await;

        let report = DeletionReport {
            outcomes: unique
                .into_iter()
                .zip(results)
                .map(|(path, result)| PathOutcome {
                    path: path.clone(),
                    result,
                })
                .collect(),
        };
        let failed = report.failures().count();
        if failed > 0 {
            tracing::warn!(
                paths = report.outcomes.len(),
                failed,
                "subtree deletion incomplete"
            );
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::deletion::engine::DeletionOptions;
    use crate::storage::engines::MemoryDocumentStore;
    use crate::telemetry::{MemoryReporter, NullReporter};
    use crate::test_support::{coll, FaultyStore, Faults};

    #[tokio::test]
    async fn failing_sibling_does_not_stop_the_others() {
        let a = coll("messageMessage/m1/structure");
        let b = coll("messageMessage/m1/sections");
        let c = coll("messageMessage/m1/modules");
        let store = Arc::new(FaultyStore::new(Faults {
            fail_commit: Some((b.clone(), 0)),
            ..Faults::default()
        }));
        store.inner.seed(&a, 12);
        store.inner.seed(&b, 12);
        store.inner.seed(&c, 31);
        let reporter = Arc::new(MemoryReporter::new());
        let deleter =
            CollectionDeleter::new(store.clone(), reporter.clone(), DeletionOptions::default())
                .unwrap();

        let report = deleter
            .delete_paths(&[a.clone(), b.clone(), c.clone()])
            .await;

        assert!(!report.is_complete());
        assert_eq!(store.inner.document_count(&a), 0);
        assert_eq!(store.inner.document_count(&b), 12);
        assert_eq!(store.inner.document_count(&c), 0);

        let failed: Vec<&CollectionPath> = report.failures().map(|(path, _)| path).collect();
        assert_eq!(failed, vec![&b]);
        assert_eq!(report.totals().documents, 43);

        let errors = reporter.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path.as_deref(), Some("messageMessage/m1/sections"));

        let err = report.into_result().unwrap_err();
        assert_eq!(err.total, 3);
        assert_eq!(err.failures.len(), 1);
        assert_eq!(err.to_string(), "1 of 3 collection deletions failed");
    }

    #[tokio::test]
    async fn duplicate_paths_run_once() {
        let store = Arc::new(MemoryDocumentStore::new());
        let devos = coll("curriculumEdit/s1/lessons/l1/devos");
        store.seed(&devos, 7);
        let deleter = CollectionDeleter::new(
            store.clone(),
            Arc::new(NullReporter),
            DeletionOptions::default(),
        )
        .unwrap();

        let report = deleter
            .delete_paths(&[devos.clone(), devos.clone(), devos.clone()])
            .await;

        assert_eq!(report.outcomes().len(), 1);
        assert_eq!(store.commit_count(), 1);
        assert_eq!(report.into_result().unwrap().documents, 7);
    }

    #[tokio::test]
    async fn empty_request_is_complete() {
        let deleter = CollectionDeleter::new(
            Arc::new(MemoryDocumentStore::new()),
            Arc::new(NullReporter),
            DeletionOptions::default(),
        )
        .unwrap();

        let report = deleter.delete_paths(&[]).await;

        assert!(report.is_complete());
        assert_eq!(report.into_result().unwrap(), DeletionStats::default());
    }
}
