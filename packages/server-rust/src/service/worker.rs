//! Background worker that drains trigger events off the request path.
//!
//! A `BackgroundWorker<R>` owns a bounded mpsc channel and a tokio task that
//! feeds each queued task to its `BackgroundRunnable`, with a periodic tick.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

/// Task handler executed by [`BackgroundWorker`].
///
/// The worker owns the runnable exclusively, so implementations keep their
/// state in plain fields. Anything a caller must read while the worker runs
/// goes behind an `Arc`, as [`TriggerRunnable`](crate::triggers::TriggerRunnable)
/// does with its counters.
#[async_trait]
pub trait BackgroundRunnable: Send + 'static {
    type Task: Send + 'static;

    /// Process a single task. Tasks run one at a time, in submission order.
    async fn run(&mut self, task: Self::Task);

    /// Called on each tick interval. Default is a no-op.
    async fn on_tick(&mut self) {}

    /// Called once after the last task when the worker stops.
    async fn shutdown(&mut self) {}
}

/// Reasons a task could not be queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WorkerError {
    #[error("worker not running")]
    Stopped,
    #[error("worker queue is full")]
    QueueFull,
}

/// Handle to a running worker task.
///
/// Submissions wait for room in the bounded queue; [`try_submit`](Self::try_submit)
/// refuses instead. [`stop`](Self::stop) lets queued tasks finish first.
pub struct BackgroundWorker<R: BackgroundRunnable> {
    tx: Option<mpsc::Sender<R::Task>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl<R: BackgroundRunnable> BackgroundWorker<R> {
    /// Spawns the worker loop. Must be called inside a tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` or `tick` is zero.
    pub fn start(mut runnable: R, tick: Duration, capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<R::Task>(capacity);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let mut ticks = tokio::time::interval(tick);
            // The first tick completes immediately.
            ticks.tick().await;

            loop {
                tokio::select! {
                    task = rx.recv() => match task {
                        Some(task) => runnable.run(task).await,
                        None => break,
                    },
                    _ = ticks.tick() => runnable.on_tick().await,
                    _ = &mut shutdown_rx => {
                        // Finish whatever was already accepted.
                        rx.close();
                        while let Some(task) = rx.recv().await {
                            runnable.run(task).await;
                        }
                        break;
                    }
                }
            }

            runnable.shutdown().await;
        });

        Self {
            tx: Some(tx),
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    /// Queues a task, waiting for room if the queue is full.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Stopped`] once the worker has been stopped.
    pub async fn submit(&self, task: R::Task) -> Result<(), WorkerError> {
        let tx = self.tx.as_ref().ok_or(WorkerError::Stopped)?;
        tx.send(task).await.map_err(|_| WorkerError::Stopped)
    }

    /// Queues a task without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::QueueFull`] if the queue has no room, or
    /// [`WorkerError::Stopped`] once the worker has been stopped.
    pub fn try_submit(&self, task: R::Task) -> Result<(), WorkerError> {
        let tx = self.tx.as_ref().ok_or(WorkerError::Stopped)?;
        tx.try_send(task).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => WorkerError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => WorkerError::Stopped,
        })
    }

    /// Stops the worker after it has run every task already queued.
    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                tracing::error!(error = %err, "background worker task failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;

    #[derive(Default, Clone)]
    struct Recorder {
        seen: Arc<Mutex<Vec<String>>>,
        ticks: Arc<AtomicU32>,
        shutdowns: Arc<AtomicU32>,
    }

    #[async_trait]
    impl BackgroundRunnable for Recorder {
        type Task = String;

        async fn run(&mut self, task: String) {
            self.seen.lock().push(task);
        }

        async fn on_tick(&mut self) {
            self.ticks.fetch_add(1, Ordering::SeqCst);
        }

        async fn shutdown(&mut self) {
            self.shutdowns.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn runs_tasks_in_order_and_drains_on_stop() {
        let recorder = Recorder::default();
        let mut worker =
            BackgroundWorker::start(recorder.clone(), Duration::from_secs(60), 16);

        for id in ["lesson-1", "lesson-2", "lesson-3"] {
            worker.submit(id.to_string()).await.unwrap();
        }
        worker.stop().await;

        assert_eq!(
            *recorder.seen.lock(),
            vec!["lesson-1", "lesson-2", "lesson-3"]
        );
        assert_eq!(recorder.shutdowns.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn tick_fires_periodically() {
        let recorder = Recorder::default();
        let mut worker =
            BackgroundWorker::start(recorder.clone(), Duration::from_millis(20), 16);

        tokio::time::sleep(Duration::from_millis(105)).await;
        worker.stop().await;

        assert!(recorder.ticks.load(Ordering::SeqCst) >= 4);
    }

    #[tokio::test]
    async fn submit_after_stop_is_refused() {
        let mut worker = BackgroundWorker::start(Recorder::default(), Duration::from_secs(60), 4);
        worker.stop().await;

        assert_eq!(
            worker.submit("late".to_string()).await,
            Err(WorkerError::Stopped)
        );
        assert_eq!(worker.try_submit("late".to_string()), Err(WorkerError::Stopped));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn try_submit_reports_a_full_queue() {
        let recorder = Recorder::default();
        let mut worker = BackgroundWorker::start(recorder.clone(), Duration::from_secs(60), 1);

        // The worker task has not been polled yet on this single thread.
        worker.try_submit("first".to_string()).unwrap();
        assert_eq!(
            worker.try_submit("second".to_string()),
            Err(WorkerError::QueueFull)
        );

        worker.stop().await;
        assert_eq!(*recorder.seen.lock(), vec!["first"]);
    }
}
