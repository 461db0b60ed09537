//! # Invalidation Manager
//!
//! Owns the bounded event queue and dispatches the four invalidation
//! strategies against the store. Batch draining is driven by the background
//! worker; immediate invalidation from an async call site dispatches inline
//! through the same path.
//!
//! Failure isolation: a store failure during dispatch is logged and counted
//! against that one event; it never aborts the batch, the worker loop, or the
//! caller's mutation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error};
use uuid::Uuid;

use crate::config::CacheCoreConfig;
use crate::error::Result;
use crate::metrics::{MetricsSink, OperationStatus};
use crate::store::KeyValueStore;

use super::event::{CacheEventType, InvalidationEvent, InvalidationStrategy};
use super::queue::InvalidationQueue;

/// Result of draining one batch from the queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Events dispatched successfully
    pub processed: u64,
    /// Events whose dispatch failed (terminal, no retry)
    pub failed: u64,
    /// Keys removed from the store across the batch
    pub keys_invalidated: u64,
}

/// Multi-strategy invalidation engine with a bounded in-memory queue.
#[derive(Debug)]
pub struct InvalidationManager {
    store: Arc<dyn KeyValueStore>,
    metrics: Arc<dyn MetricsSink>,
    queue: InvalidationQueue,
    batch_size: usize,
}

impl InvalidationManager {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        metrics: Arc<dyn MetricsSink>,
        config: &CacheCoreConfig,
    ) -> Self {
        Self {
            store,
            metrics,
            queue: InvalidationQueue::new(config.queue_max_size),
            batch_size: config.worker_batch_size,
        }
    }

    /// Construct an event and append it to the queue.
    ///
    /// Never blocks and never fails: a full queue evicts its oldest entry
    /// first. Returns the event id for log correlation.
    pub fn add_invalidation_event(
        &self,
        event_type: CacheEventType,
        keys: Vec<String>,
        strategy: InvalidationStrategy,
        metadata: HashMap<String, String>,
    ) -> Uuid {
        let event = InvalidationEvent::new(event_type, keys, strategy).with_metadata(metadata);
        let id = event.id;
        self.submit(event);
        id
    }

    /// Append a pre-built event to the queue.
    pub fn submit(&self, event: InvalidationEvent) {
        debug!(
            event_id = %event.id,
            event_type = event.event_type.name(),
            strategy = event.strategy.name(),
            key_count = event.keys.len(),
            "Invalidation event enqueued"
        );
        self.queue.push(event);
    }

    /// Dispatch one event inline, bypassing the queue.
    ///
    /// Used for immediate-strategy invalidation from async call sites, where
    /// read-after-write consistency matters. Returns the number of keys
    /// removed; store failures degrade to zero after logging.
    pub async fn invalidate_now(&self, event: &InvalidationEvent) -> u64 {
        let started = Instant::now();
        match self.dispatch(event).await {
            Ok(count) => {
                self.record_dispatch(event, OperationStatus::Success, count, started);
                count
            }
            Err(e) => {
                error!(
                    event_id = %event.id,
                    event_type = event.event_type.name(),
                    error = %e,
                    "Invalidation dispatch failed"
                );
                self.record_dispatch(event, OperationStatus::Failure, 0, started);
                0
            }
        }
    }

    /// Drain and process one batch from the queue.
    pub async fn process_pending(&self) -> BatchOutcome {
        self.process_pending_until(|| true).await
    }

    /// Drain one batch, checking `keep_going` between events so cooperative
    /// cancellation takes effect at item granularity. Events popped but not
    /// dispatched are discarded; acceptable, since loss degrades to stale
    /// reads until TTL expiry.
    pub async fn process_pending_until(&self, keep_going: impl Fn() -> bool) -> BatchOutcome {
        let batch = self.queue.pop_batch(self.batch_size);
        let mut outcome = BatchOutcome::default();

        for event in batch {
            if !keep_going() {
                break;
            }

            let started = Instant::now();
            match self.dispatch(&event).await {
                Ok(count) => {
                    self.record_dispatch(&event, OperationStatus::Success, count, started);
                    outcome.processed += 1;
                    outcome.keys_invalidated += count;
                }
                Err(e) => {
                    // One bad event cannot stall the queue
                    error!(
                        event_id = %event.id,
                        event_type = event.event_type.name(),
                        error = %e,
                        "Invalidation dispatch failed"
                    );
                    self.record_dispatch(&event, OperationStatus::Failure, 0, started);
                    outcome.failed += 1;
                }
            }
        }

        outcome
    }

    /// Exhaustive strategy dispatch. Returns the number of keys removed.
    async fn dispatch(&self, event: &InvalidationEvent) -> Result<u64> {
        match event.strategy {
            InvalidationStrategy::Immediate => {
                let mut deleted = 0u64;
                for key in &event.keys {
                    if self.store.delete(key).await? {
                        deleted += 1;
                    }
                }
                Ok(deleted)
            }
            InvalidationStrategy::PatternBased => {
                let mut deleted = 0u64;
                for pattern in &event.keys {
                    let matched = self.store.scan(pattern).await?;
                    // Zero matches is not an error
                    if !matched.is_empty() {
                        deleted += self.store.delete_many(&matched).await?;
                    }
                }
                Ok(deleted)
            }
            InvalidationStrategy::Selective => {
                let mut confirmed = Vec::new();
                for key in &event.keys {
                    if self.store.exists(key).await? {
                        confirmed.push(key.clone());
                    }
                }
                if confirmed.is_empty() {
                    Ok(0)
                } else {
                    self.store.delete_many(&confirmed).await
                }
            }
            // TTL set at write time does the work
            InvalidationStrategy::Lazy => Ok(0),
        }
    }

    fn record_dispatch(
        &self,
        event: &InvalidationEvent,
        status: OperationStatus,
        keys_invalidated: u64,
        started: Instant,
    ) {
        self.metrics.record_invalidation(
            event.event_type.name(),
            event.strategy.name(),
            keys_invalidated,
        );
        self.metrics.record_operation(
            "invalidate",
            event.event_type.name(),
            status,
            started.elapsed(),
        );
        debug!(
            event_id = %event.id,
            strategy = event.strategy.name(),
            keys_invalidated,
            status = status.as_str(),
            "Invalidation event processed"
        );
    }

    /// Events currently waiting in the queue
    pub fn queue_depth(&self) -> usize {
        self.queue.len()
    }

    /// Events dropped to queue overflow since startup
    pub fn dropped_total(&self) -> u64 {
        self.queue.dropped_total()
    }

    /// Configured batch size, for observability
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}
