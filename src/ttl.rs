//! # TTL Policy and Management
//!
//! The TTL policy table maps each category of cached data to a fixed
//! time-to-live, immutable at runtime; callers may override per write without
//! mutating the table. [`TtlManager`] wraps the store for set-with-expiry,
//! TTL refresh, and remaining-lifetime reads.
//!
//! Store failures never escape into domain mutation logic: they are logged
//! and degraded to `false` here.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::metrics::{MetricsSink, OperationStatus};
use crate::store::{KeyTtl, KeyValueStore};

/// Category of cached data, determining its default TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheCategory {
    FileMetadata,
    FileContent,
    FileListing,
    UserSession,
    UserProfile,
    Statistics,
    RateLimitWindow,
    SearchResults,
    AccessControl,
}

impl CacheCategory {
    /// Fixed TTL for this category, in seconds.
    pub const fn ttl_seconds(&self) -> u64 {
        match self {
            CacheCategory::FileMetadata => 3600,
            CacheCategory::FileContent => 1800,
            CacheCategory::FileListing => 600,
            CacheCategory::UserSession => 86_400,
            CacheCategory::UserProfile => 7200,
            CacheCategory::Statistics => 300,
            CacheCategory::RateLimitWindow => 60,
            CacheCategory::SearchResults => 900,
            CacheCategory::AccessControl => 1200,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CacheCategory::FileMetadata => "file_metadata",
            CacheCategory::FileContent => "file_content",
            CacheCategory::FileListing => "file_listing",
            CacheCategory::UserSession => "user_session",
            CacheCategory::UserProfile => "user_profile",
            CacheCategory::Statistics => "statistics",
            CacheCategory::RateLimitWindow => "rate_limit_window",
            CacheCategory::SearchResults => "search_results",
            CacheCategory::AccessControl => "access_control",
        }
    }

    /// All categories, for policy-table introspection
    pub fn all() -> &'static [CacheCategory] {
        &[
            CacheCategory::FileMetadata,
            CacheCategory::FileContent,
            CacheCategory::FileListing,
            CacheCategory::UserSession,
            CacheCategory::UserProfile,
            CacheCategory::Statistics,
            CacheCategory::RateLimitWindow,
            CacheCategory::SearchResults,
            CacheCategory::AccessControl,
        ]
    }
}

/// Store wrapper applying the TTL policy table to every write.
#[derive(Debug, Clone)]
pub struct TtlManager {
    store: Arc<dyn KeyValueStore>,
    metrics: Arc<dyn MetricsSink>,
}

impl TtlManager {
    pub fn new(store: Arc<dyn KeyValueStore>, metrics: Arc<dyn MetricsSink>) -> Self {
        Self { store, metrics }
    }

    /// Write a value under the category's TTL (or an explicit override).
    ///
    /// Composite values are serialized to canonical JSON text. Returns `false`
    /// on serialization or store failure; the failure is logged here and never
    /// raised into the caller's mutation path.
    pub async fn set<V>(
        &self,
        key: &str,
        value: &V,
        category: CacheCategory,
        override_ttl: Option<u64>,
    ) -> bool
    where
        V: Serialize + ?Sized,
    {
        let started = Instant::now();
        let ttl = override_ttl.unwrap_or_else(|| category.ttl_seconds());

        let serialized = match serde_json::to_string(value) {
            Ok(serialized) => serialized,
            Err(error) => {
                warn!(
                    key = %key,
                    cache_type = category.name(),
                    error = %error,
                    "Failed to serialize cache value"
                );
                self.metrics.record_operation(
                    "set",
                    category.name(),
                    OperationStatus::Failure,
                    started.elapsed(),
                );
                return false;
            }
        };

        match self.store.set_with_ttl(key, &serialized, ttl).await {
            Ok(()) => {
                debug!(key = %key, cache_type = category.name(), ttl_seconds = ttl, "Cache set");
                self.metrics.record_operation(
                    "set",
                    category.name(),
                    OperationStatus::Success,
                    started.elapsed(),
                );
                true
            }
            Err(error) => {
                warn!(
                    key = %key,
                    cache_type = category.name(),
                    error = %error,
                    "Store unavailable during cache set"
                );
                self.metrics.record_operation(
                    "set",
                    category.name(),
                    OperationStatus::Failure,
                    started.elapsed(),
                );
                false
            }
        }
    }

    /// Reset a key's TTL to the category's full value.
    ///
    /// A missing key, or a key without expiry, is a no-op returning `false`.
    /// The reset is absolute, not additive: the key gets the category's whole
    /// TTL again regardless of how much lifetime it had left.
    pub async fn extend(&self, key: &str, category: CacheCategory) -> bool {
        let started = Instant::now();

        let outcome = match self.store.ttl(key).await {
            Ok(KeyTtl::Remaining(_)) => match self.store.get(key).await {
                Ok(Some(value)) => {
                    match self
                        .store
                        .set_with_ttl(key, &value, category.ttl_seconds())
                        .await
                    {
                        Ok(()) => {
                            debug!(
                                key = %key,
                                cache_type = category.name(),
                                ttl_seconds = category.ttl_seconds(),
                                "Cache TTL extended"
                            );
                            true
                        }
                        Err(error) => {
                            warn!(key = %key, error = %error, "Store unavailable during TTL extend");
                            false
                        }
                    }
                }
                // Expired between the ttl read and the value read
                Ok(None) => false,
                Err(error) => {
                    warn!(key = %key, error = %error, "Store unavailable during TTL extend");
                    false
                }
            },
            Ok(KeyTtl::Missing) | Ok(KeyTtl::NoExpiry) => false,
            Err(error) => {
                warn!(key = %key, error = %error, "Store unavailable during TTL read");
                false
            }
        };

        let status = if outcome {
            OperationStatus::Success
        } else {
            OperationStatus::Failure
        };
        self.metrics
            .record_operation("extend", category.name(), status, started.elapsed());

        outcome
    }

    /// Alias of [`TtlManager::extend`].
    pub async fn refresh(&self, key: &str, category: CacheCategory) -> bool {
        self.extend(key, category).await
    }

    /// Remaining lifetime of a key.
    ///
    /// Distinguishes a missing key from a key present without expiry. A store
    /// failure degrades to [`KeyTtl::Missing`] after logging.
    pub async fn remaining(&self, key: &str) -> KeyTtl {
        match self.store.ttl(key).await {
            Ok(ttl) => ttl,
            Err(error) => {
                warn!(key = %key, error = %error, "Store unavailable during TTL read");
                KeyTtl::Missing
            }
        }
    }
}
