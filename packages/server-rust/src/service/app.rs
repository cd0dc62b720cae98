//! Wires the store, reporter and trigger handlers to a background worker.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use real_core::ClockSource;

use super::config::{ConfigError, FunctionsConfig};
use super::worker::{BackgroundWorker, WorkerError};
use crate::logging::init_tracing;
use crate::storage::DocumentStore;
use crate::telemetry::{ErrorReporter, TracingReporter};
use crate::triggers::{TriggerCounters, TriggerEvent, TriggerRunnable, Triggers};

/// A running trigger host.
pub struct FunctionsApp {
    triggers: Arc<Triggers>,
    counters: Arc<TriggerCounters>,
    worker: BackgroundWorker<TriggerRunnable>,
}

impl FunctionsApp {
    /// Validates `config` against the store and starts the worker. Must be
    /// called inside a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the config does not fit the store.
    pub fn start(
        config: &FunctionsConfig,
        store: Arc<dyn DocumentStore>,
        reporter: Arc<dyn ErrorReporter>,
        clock: Arc<dyn ClockSource>,
    ) -> Result<Self, ConfigError> {
        config.validate(store.max_batch_writes())?;

        let triggers = Arc::new(Triggers::new(
            store,
            reporter,
            clock,
            config.deletion_options(),
        ));
        let runnable = TriggerRunnable::new(triggers.clone());
        let counters = runnable.counters();
        let worker = BackgroundWorker::start(
            runnable,
            Duration::from_millis(config.worker_tick_ms),
            config.worker_queue_capacity,
        );

        tracing::info!(
            environment = config.environment().as_str(),
            page_size = config.delete_page_size,
            "trigger host started"
        );
        Ok(Self {
            triggers,
            counters,
            worker,
        })
    }

    /// Handlers, for callers that need a result instead of queueing.
    #[must_use]
    pub fn triggers(&self) -> &Arc<Triggers> {
        &self.triggers
    }

    #[must_use]
    pub fn counters(&self) -> &TriggerCounters {
        &self.counters
    }

    /// Queues an event for the worker.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Stopped`] after [`stop`](Self::stop).
    pub async fn submit(&self, event: TriggerEvent) -> Result<(), WorkerError> {
        self.worker.submit(event).await
    }

    /// Queues an event without waiting for room.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::QueueFull`] when the queue is at capacity.
    pub fn try_submit(&self, event: TriggerEvent) -> Result<(), WorkerError> {
        self.worker.try_submit(event)
    }

    /// Handles every queued event, then stops the worker.
    pub async fn stop(&mut self) {
        self.worker.stop().await;
        tracing::info!(
            handled = self.counters.handled(),
            failed = self.counters.failed(),
            "trigger host stopped"
        );
    }
}

/// Runs a host until `shutdown` resolves: installs the configured log
/// format, starts the worker with [`default_reporter`], then drains it.
///
/// # Errors
///
/// Returns [`ConfigError`] if the config does not fit the store.
pub async fn serve(
    config: &FunctionsConfig,
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn ClockSource>,
    shutdown: impl Future<Output = ()>,
) -> Result<(), ConfigError> {
    init_tracing(config.log_format);
    let mut app = FunctionsApp::start(config, store, default_reporter(config), clock)?;
    shutdown.await;
    tracing::info!("shutdown requested");
    app.stop().await;
    Ok(())
}

/// Reporter used when the host is not given one: tracing events tagged with
/// the deployment environment.
#[must_use]
pub fn default_reporter(config: &FunctionsConfig) -> Arc<dyn ErrorReporter> {
    Arc::new(TracingReporter::new(config.environment().as_str()))
}

#[cfg(test)]
mod tests {
    use real_core::{fields, DocumentSnapshot, FixedClock, Value};

    use super::*;
    use crate::storage::engines::MemoryDocumentStore;
    use crate::telemetry::{CompositeReporter, MemoryReporter};
    use crate::test_support::{coll, doc};

    #[tokio::test]
    async fn message_round_trip_through_the_worker() {
        let store = Arc::new(MemoryDocumentStore::new());
        let memory = Arc::new(MemoryReporter::new());
        let config = FunctionsConfig::default();
        let reporter = CompositeReporter::new(vec![default_reporter(&config), memory.clone()]);
        let mut app = FunctionsApp::start(
            &config,
            store.clone(),
            Arc::new(reporter),
            Arc::new(FixedClock::new(5)),
        )
        .unwrap();

        let message = doc("messageMessage/m1");
        let part = doc("messageMessage/m1/structure/hook");
        app.submit(TriggerEvent::Created(DocumentSnapshot::new(
            message.clone(),
            fields([("title", "Easter"), ("createdBy", "u1")]),
        )))
        .await
        .unwrap();
        app.submit(TriggerEvent::Written {
            path: part.clone(),
            before: None,
            after: Some(fields([("title", Value::from("Open"))])),
        })
        .await
        .unwrap();
        app.submit(TriggerEvent::Deleted(message.clone()))
            .await
            .unwrap();
        app.stop().await;

        assert_eq!(app.counters().handled(), 3);
        assert_eq!(app.counters().failed(), 0);
        // Only the parent, which the store removed itself in production.
        assert_eq!(store.collection_paths(), vec![coll("messageMessage")]);
        assert_eq!(memory.breadcrumbs().len(), 3);
        assert!(app
            .try_submit(TriggerEvent::Deleted(message))
            .is_err());
    }

    #[tokio::test]
    async fn serve_runs_until_shutdown_with_parsed_config() {
        use clap::Parser;

        #[derive(Parser)]
        struct Host {
            #[command(flatten)]
            config: FunctionsConfig,
        }

        let config = Host::try_parse_from([
            "host",
            "--log-format",
            "json",
            "--delete-page-size",
            "20",
        ])
        .unwrap()
        .config;
        assert_eq!(config.log_format, crate::logging::LogFormat::Json);
        let store = Arc::new(MemoryDocumentStore::new());

        serve(&config, store.clone(), Arc::new(FixedClock::new(0)), async {})
            .await
            .unwrap();

        let rejected = FunctionsConfig {
            delete_page_size: 0,
            ..config
        };
        assert_eq!(
            serve(&rejected, store, Arc::new(FixedClock::new(0)), async {}).await,
            Err(ConfigError::PageSize { page_size: 0, max: 500 })
        );
    }

    #[tokio::test]
    async fn invalid_config_is_refused() {
        let store = Arc::new(MemoryDocumentStore::with_batch_limit(20));
        let config = FunctionsConfig {
            delete_page_size: 50,
            ..FunctionsConfig::default()
        };

        let result = FunctionsApp::start(
            &config,
            store,
            default_reporter(&config),
            Arc::new(FixedClock::new(0)),
        );

        assert!(matches!(
            result,
            Err(ConfigError::PageSize { page_size: 50, max: 20 })
        ));
    }
}
