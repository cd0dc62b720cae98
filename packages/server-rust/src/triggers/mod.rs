//! Document event triggers.
//!
//! Store events arrive as [`TriggerEvent`]s and are handled one at a time by
//! a [`TriggerRunnable`] on the background worker, so a slow subtree
//! deletion never blocks the caller that observed the event.

pub mod handlers;
pub mod history;
pub mod layout;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use real_core::{DocumentPath, DocumentSnapshot, Fields};

pub use handlers::{TriggerError, Triggers};
pub use history::{HistoryAction, HistoryContext, HistoryRecord};
pub use layout::{DocumentKind, OwnedCollection, SubtreeLayout};

use crate::service::worker::BackgroundRunnable;

/// A change observed in the store.
#[derive(Debug, Clone)]
pub enum TriggerEvent {
    /// A document was created with these contents.
    Created(DocumentSnapshot),
    /// A document was removed. Its sub-collections are still present.
    Deleted(DocumentPath),
    /// A document was created, updated or removed.
    Written {
        path: DocumentPath,
        before: Option<Fields>,
        after: Option<Fields>,
    },
}

/// Running totals kept by a [`TriggerRunnable`].
#[derive(Debug, Default)]
pub struct TriggerCounters {
    handled: AtomicU64,
    ignored: AtomicU64,
    failed: AtomicU64,
}

impl TriggerCounters {
    #[must_use]
    pub fn handled(&self) -> u64 {
        self.handled.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn ignored(&self) -> u64 {
        self.ignored.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

/// Feeds worker tasks to [`Triggers::dispatch`].
pub struct TriggerRunnable {
    triggers: Arc<Triggers>,
    counters: Arc<TriggerCounters>,
}

impl TriggerRunnable {
    #[must_use]
    pub fn new(triggers: Arc<Triggers>) -> Self {
        Self {
            triggers,
            counters: Arc::new(TriggerCounters::default()),
        }
    }

    /// Shared view of the counters, readable while the worker owns `self`.
    #[must_use]
    pub fn counters(&self) -> Arc<TriggerCounters> {
        self.counters.clone()
    }
}

#[async_trait]
impl BackgroundRunnable for TriggerRunnable {
    type Task = TriggerEvent;

    async fn run(&mut self, event: TriggerEvent) {
        let (counter, outcome) = match self.triggers.dispatch(event).await {
            Ok(true) => (&self.counters.handled, "handled"),
            Ok(false) => (&self.counters.ignored, "ignored"),
            // Already reported by the handler.
            Err(_) => (&self.counters.failed, "failed"),
        };
        counter.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("real_trigger_events_total", "outcome" => outcome).increment(1);
    }

    async fn on_tick(&mut self) {
        tracing::info!(
            handled = self.counters.handled(),
            ignored = self.counters.ignored(),
            failed = self.counters.failed(),
            "trigger worker heartbeat"
        );
    }

    async fn shutdown(&mut self) {
        tracing::info!(handled = self.counters.handled(), "trigger worker stopped");
    }
}
