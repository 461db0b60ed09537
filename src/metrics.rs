//! # Cache Metrics
//!
//! Metrics emission for cache operations and invalidation dispatch. The cache
//! core reports through the [`MetricsSink`] trait; the embedding process
//! decides where the numbers go. [`InMemoryMetrics`] is the bundled
//! implementation, aggregating cumulative counters for tests, local
//! development, and health endpoints.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Outcome tag attached to every recorded operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    Success,
    Failure,
}

impl OperationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationStatus::Success => "success",
            OperationStatus::Failure => "failure",
        }
    }
}

/// Sink for cache core metrics.
///
/// Implementations must be cheap and non-blocking; they are called on every
/// store operation and every invalidation dispatch.
pub trait MetricsSink: Send + Sync + fmt::Debug {
    /// Record an invalidation dispatch, tagged by cache type and strategy
    fn record_invalidation(&self, cache_type: &str, strategy: &str, keys_invalidated: u64);

    /// Record a cache operation with its outcome and duration
    fn record_operation(
        &self,
        operation: &str,
        cache_type: &str,
        status: OperationStatus,
        duration: Duration,
    );
}

/// Aggregated counters for one (operation, cache type, status) series
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperationStats {
    pub count: u64,
    pub total_duration_ms: u64,
}

/// Point-in-time view of everything the in-memory sink has accumulated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Invalidation dispatches per `cache_type|strategy`
    pub invalidations: HashMap<String, u64>,
    /// Keys invalidated per `cache_type|strategy`
    pub keys_invalidated: HashMap<String, u64>,
    /// Operation counters per `operation|cache_type|status`
    pub operations: HashMap<String, OperationStats>,
}

/// In-process metrics aggregation in cumulative counters.
#[derive(Debug, Default)]
pub struct InMemoryMetrics {
    invalidations: RwLock<HashMap<String, u64>>,
    keys_invalidated: RwLock<HashMap<String, u64>>,
    operations: RwLock<HashMap<String, OperationStats>>,
}

impl InMemoryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of invalidation dispatches recorded for a cache type + strategy
    pub fn invalidation_count(&self, cache_type: &str, strategy: &str) -> u64 {
        self.invalidations
            .read()
            .get(&series_key(&[cache_type, strategy]))
            .copied()
            .unwrap_or(0)
    }

    /// Total keys invalidated for a cache type + strategy
    pub fn keys_invalidated(&self, cache_type: &str, strategy: &str) -> u64 {
        self.keys_invalidated
            .read()
            .get(&series_key(&[cache_type, strategy]))
            .copied()
            .unwrap_or(0)
    }

    /// Number of operations recorded for an operation + cache type + status
    pub fn operation_count(
        &self,
        operation: &str,
        cache_type: &str,
        status: OperationStatus,
    ) -> u64 {
        self.operations
            .read()
            .get(&series_key(&[operation, cache_type, status.as_str()]))
            .map(|stats| stats.count)
            .unwrap_or(0)
    }

    /// Snapshot all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            invalidations: self.invalidations.read().clone(),
            keys_invalidated: self.keys_invalidated.read().clone(),
            operations: self.operations.read().clone(),
        }
    }
}

impl MetricsSink for InMemoryMetrics {
    fn record_invalidation(&self, cache_type: &str, strategy: &str, keys_invalidated: u64) {
        let key = series_key(&[cache_type, strategy]);
        *self.invalidations.write().entry(key.clone()).or_default() += 1;
        *self.keys_invalidated.write().entry(key).or_default() += keys_invalidated;
    }

    fn record_operation(
        &self,
        operation: &str,
        cache_type: &str,
        status: OperationStatus,
        duration: Duration,
    ) {
        let key = series_key(&[operation, cache_type, status.as_str()]);
        let mut operations = self.operations.write();
        let stats = operations.entry(key).or_default();
        stats.count += 1;
        stats.total_duration_ms += duration.as_millis() as u64;
    }
}

fn series_key(tags: &[&str]) -> String {
    tags.join("|")
}
