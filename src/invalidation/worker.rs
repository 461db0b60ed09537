//! # Background Invalidation Worker
//!
//! Exactly one long-lived task per manager drains the invalidation queue in
//! batches at a fixed poll interval. Shutdown is cooperative: the worker
//! finishes the batch item in flight, discards the rest of the queue, and
//! exits promptly. Nothing is rolled back - every dispatch is idempotent.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::error::{CacheCoreError, Result};

use super::manager::InvalidationManager;

/// Shared control state for the worker loop
#[derive(Debug)]
struct WorkerState {
    running: AtomicBool,
    shutdown_notify: Notify,
}

/// Long-lived queue drainer for one [`InvalidationManager`].
#[derive(Debug)]
pub struct InvalidationWorker {
    manager: Arc<InvalidationManager>,
    poll_interval: Duration,
    state: Arc<WorkerState>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl InvalidationWorker {
    pub fn new(manager: Arc<InvalidationManager>, poll_interval: Duration) -> Self {
        Self {
            manager,
            poll_interval,
            state: Arc::new(WorkerState {
                running: AtomicBool::new(false),
                shutdown_notify: Notify::new(),
            }),
            handle: Mutex::new(None),
        }
    }

    /// Spawn the processing loop. Must be called from within a tokio runtime.
    pub fn start(&self) -> Result<()> {
        if self.state.running.swap(true, Ordering::AcqRel) {
            return Err(CacheCoreError::invalid_state(
                "Invalidation worker is already running",
            ));
        }

        let manager = Arc::clone(&self.manager);
        let state = Arc::clone(&self.state);
        let poll_interval = self.poll_interval;

        let handle = tokio::spawn(async move {
            info!(
                poll_interval_seconds = poll_interval.as_secs(),
                batch_size = manager.batch_size(),
                "Invalidation worker started"
            );

            while state.running.load(Ordering::Acquire) {
                let outcome = manager
                    .process_pending_until(|| state.running.load(Ordering::Acquire))
                    .await;

                if outcome.processed > 0 || outcome.failed > 0 {
                    debug!(
                        processed = outcome.processed,
                        failed = outcome.failed,
                        keys_invalidated = outcome.keys_invalidated,
                        queue_depth = manager.queue_depth(),
                        "Invalidation batch drained"
                    );
                }

                tokio::select! {
                    _ = tokio::time::sleep(poll_interval) => {}
                    _ = state.shutdown_notify.notified() => {
                        debug!("Shutdown notification received");
                        break;
                    }
                }
            }

            state.running.store(false, Ordering::Release);
            info!(
                discarded = manager.queue_depth(),
                "Invalidation worker stopped"
            );
        });

        *self.handle.lock() = Some(handle);
        Ok(())
    }

    /// Stop the worker gracefully, waiting up to `timeout` for the loop to
    /// finish its in-flight work. Idempotent.
    pub async fn stop(&self, timeout: Duration) -> Result<()> {
        if !self.state.running.load(Ordering::Acquire) {
            return Ok(());
        }

        self.state.running.store(false, Ordering::Release);
        self.state.shutdown_notify.notify_waiters();

        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            match tokio::time::timeout(timeout, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(join_error)) => {
                    error!(error = %join_error, "Invalidation worker task ended abnormally");
                }
                Err(_) => {
                    return Err(CacheCoreError::timeout(
                        "invalidation_worker_stop",
                        timeout.as_secs(),
                    ));
                }
            }
        }

        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.state.running.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheCoreConfig;
    use crate::invalidation::event::{CacheEventType, InvalidationStrategy};
    use crate::metrics::InMemoryMetrics;
    use crate::store::{InMemoryStore, KeyValueStore};
    use std::collections::HashMap;

    fn worker_fixture() -> (InvalidationWorker, Arc<InvalidationManager>, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let metrics = Arc::new(InMemoryMetrics::new());
        let manager = Arc::new(InvalidationManager::new(
            store.clone(),
            metrics,
            &CacheCoreConfig::for_test(),
        ));
        let worker = InvalidationWorker::new(manager.clone(), Duration::from_millis(50));
        (worker, manager, store)
    }

    #[tokio::test]
    async fn test_worker_drains_queue() {
        let (worker, manager, store) = worker_fixture();
        store.set_with_ttl("fw:file:meta:a", "v", 60).await.unwrap();

        manager.add_invalidation_event(
            CacheEventType::FileDeleted,
            vec!["fw:file:meta:a".to_string()],
            InvalidationStrategy::Immediate,
            HashMap::new(),
        );

        worker.start().unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(!store.exists("fw:file:meta:a").await.unwrap());
        assert_eq!(manager.queue_depth(), 0);

        worker.stop(Duration::from_secs(1)).await.unwrap();
    }

    #[tokio::test]
    async fn test_double_start_is_rejected() {
        let (worker, _, _) = worker_fixture();

        worker.start().unwrap();
        assert!(matches!(
            worker.start(),
            Err(CacheCoreError::InvalidState { .. })
        ));

        worker.stop(Duration::from_secs(1)).await.unwrap();
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let (worker, _, _) = worker_fixture();

        worker.start().unwrap();
        assert!(worker.is_running());

        worker.stop(Duration::from_secs(1)).await.unwrap();
        assert!(!worker.is_running());

        // Second stop is a no-op
        worker.stop(Duration::from_secs(1)).await.unwrap();
    }

    #[tokio::test]
    async fn test_stop_without_start_is_noop() {
        let (worker, _, _) = worker_fixture();
        worker.stop(Duration::from_millis(100)).await.unwrap();
        assert!(!worker.is_running());
    }

    #[tokio::test]
    async fn test_events_enqueued_while_running_are_processed() {
        let (worker, manager, store) = worker_fixture();
        worker.start().unwrap();

        store.set_with_ttl("fw:late", "v", 60).await.unwrap();
        tokio::time::sleep(Duration::from_millis(80)).await;

        manager.add_invalidation_event(
            CacheEventType::FileUpdated,
            vec!["fw:late".to_string()],
            InvalidationStrategy::Immediate,
            HashMap::new(),
        );
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(!store.exists("fw:late").await.unwrap());
        worker.stop(Duration::from_secs(1)).await.unwrap();
    }
}
