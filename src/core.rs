//! # Cache Core Composition Root
//!
//! Explicitly constructs and wires every component of the cache core: key
//! builder, TTL manager, invalidation manager, background worker, and the
//! fire-and-forget submission channel. Nothing in this crate is reachable
//! through ambient global state - the embedding process owns one `CacheCore`
//! and passes the pieces to whoever needs them.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::bindings::{spawn_submission_consumer, submission_channel, InvalidationHandle};
use crate::config::CacheCoreConfig;
use crate::error::{CacheCoreError, Result};
use crate::invalidation::{InvalidationEvent, InvalidationManager, InvalidationWorker};
use crate::keys::KeyBuilder;
use crate::metrics::MetricsSink;
use crate::store::KeyValueStore;
use crate::ttl::TtlManager;

/// Process-wide cache core instance.
pub struct CacheCore {
    config: CacheCoreConfig,
    keys: KeyBuilder,
    ttl: TtlManager,
    invalidation: Arc<InvalidationManager>,
    worker: InvalidationWorker,
    submit_handle: InvalidationHandle,
    submit_receiver: Mutex<Option<mpsc::Receiver<InvalidationEvent>>>,
    submit_consumer: Mutex<Option<JoinHandle<()>>>,
}

impl CacheCore {
    /// Wire the cache core against a store and metrics sink.
    ///
    /// Construction is synchronous and spawns nothing; call
    /// [`CacheCore::start`] from within a tokio runtime to bring up the
    /// background worker and the submission consumer.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        metrics: Arc<dyn MetricsSink>,
        config: CacheCoreConfig,
    ) -> Result<Self> {
        config.validate()?;

        let keys = KeyBuilder::new(config.namespace.clone());
        let ttl = TtlManager::new(Arc::clone(&store), Arc::clone(&metrics));
        let invalidation = Arc::new(InvalidationManager::new(store, metrics, &config));
        let worker = InvalidationWorker::new(Arc::clone(&invalidation), config.poll_interval());
        let (submit_handle, submit_receiver) = submission_channel(config.submit_channel_capacity);

        Ok(Self {
            config,
            keys,
            ttl,
            invalidation,
            worker,
            submit_handle,
            submit_receiver: Mutex::new(Some(submit_receiver)),
            submit_consumer: Mutex::new(None),
        })
    }

    /// Start the background worker and the submission consumer.
    pub fn start(&self) -> Result<()> {
        let receiver = self
            .submit_receiver
            .lock()
            .take()
            .ok_or_else(|| CacheCoreError::invalid_state("Cache core is already started"))?;

        self.worker.start()?;
        let consumer = spawn_submission_consumer(Arc::clone(&self.invalidation), receiver);
        *self.submit_consumer.lock() = Some(consumer);

        self.config.log_configuration();
        info!(namespace = %self.config.namespace, "✅ Cache core started");
        Ok(())
    }

    /// Stop the worker gracefully and tear down the submission consumer.
    ///
    /// The worker finishes its in-flight batch item; the unprocessed queue
    /// remainder is discarded.
    pub async fn shutdown(&self, timeout: Duration) -> Result<()> {
        self.worker.stop(timeout).await?;

        if let Some(consumer) = self.submit_consumer.lock().take() {
            consumer.abort();
        }

        info!(
            discarded_events = self.invalidation.queue_depth(),
            dropped_to_overflow = self.invalidation.dropped_total(),
            "Cache core shut down"
        );
        Ok(())
    }

    pub fn config(&self) -> &CacheCoreConfig {
        &self.config
    }

    /// Key builder for read paths computing lookup keys
    pub fn keys(&self) -> &KeyBuilder {
        &self.keys
    }

    /// TTL manager for read paths writing back after a cache miss
    pub fn ttl(&self) -> &TtlManager {
        &self.ttl
    }

    /// Invalidation manager for mutation handlers and bindings
    pub fn invalidation(&self) -> &Arc<InvalidationManager> {
        &self.invalidation
    }

    /// Fire-and-forget handle for non-async call sites
    pub fn submit_handle(&self) -> InvalidationHandle {
        self.submit_handle.clone()
    }

    /// Whether the background worker is currently running
    pub fn worker_running(&self) -> bool {
        self.worker.is_running()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invalidation::{CacheEventType, InvalidationStrategy};
    use crate::metrics::InMemoryMetrics;
    use crate::store::{InMemoryStore, KeyValueStore};
    use crate::ttl::CacheCategory;
    use std::collections::HashMap;

    fn core_fixture() -> (CacheCore, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let metrics = Arc::new(InMemoryMetrics::new());
        let core = CacheCore::new(
            store.clone(),
            metrics,
            CacheCoreConfig {
                poll_interval_seconds: 1,
                ..CacheCoreConfig::for_test()
            },
        )
        .unwrap();
        (core, store)
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let store = Arc::new(InMemoryStore::new());
        let metrics = Arc::new(InMemoryMetrics::new());
        let config = CacheCoreConfig {
            namespace: String::new(),
            ..Default::default()
        };

        assert!(CacheCore::new(store, metrics, config).is_err());
    }

    #[tokio::test]
    async fn test_lifecycle() {
        let (core, _store) = core_fixture();
        assert!(!core.worker_running());

        core.start().unwrap();
        assert!(core.worker_running());

        // Double start is rejected
        assert!(core.start().is_err());

        core.shutdown(Duration::from_secs(1)).await.unwrap();
        assert!(!core.worker_running());
    }

    #[tokio::test]
    async fn test_end_to_end_set_then_invalidate() {
        let (core, store) = core_fixture();
        core.start().unwrap();

        let key = core.keys().build("file:meta", &["abc-123"]);
        assert_eq!(key, "fw:file:meta:abc-123");

        assert!(
            core.ttl()
                .set(&key, "metadata", CacheCategory::FileMetadata, None)
                .await
        );
        assert!(store.exists(&key).await.unwrap());

        core.invalidation().add_invalidation_event(
            CacheEventType::FileDeleted,
            vec![key.clone()],
            InvalidationStrategy::Immediate,
            HashMap::new(),
        );

        // Worker polls every second in this fixture
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!store.exists(&key).await.unwrap());

        core.shutdown(Duration::from_secs(1)).await.unwrap();
    }

    #[tokio::test]
    async fn test_fire_and_forget_handle_reaches_queue() {
        let (core, _store) = core_fixture();
        core.start().unwrap();

        let handle = core.submit_handle();
        let event = InvalidationEvent::new(
            CacheEventType::StatsRecomputed,
            vec!["fw:stats:global".to_string()],
            InvalidationStrategy::Lazy,
        );
        assert!(handle.submit(event));

        // Lazy events drain as no-ops without error
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(core.invalidation().queue_depth(), 0);

        core.shutdown(Duration::from_secs(1)).await.unwrap();
    }
}
