//! # Invalidation Event Model
//!
//! Immutable value describing one invalidation request. An event is created
//! by a caller (directly or through a mutation binding), owned exclusively by
//! the manager's queue once submitted, claimed by the worker (or dispatched
//! synchronously for immediate invalidation from an async call site), and
//! discarded after dispatch. Success and failure are both terminal, with no
//! automatic retry.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Domain events that trigger cache invalidation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheEventType {
    FileUploaded,
    FileUpdated,
    FileDeleted,
    FileAccessed,
    FileShared,
    UserUpdated,
    SessionRevoked,
    StatsRecomputed,
    BulkCleanup,
}

impl CacheEventType {
    pub fn name(&self) -> &'static str {
        match self {
            CacheEventType::FileUploaded => "file.uploaded",
            CacheEventType::FileUpdated => "file.updated",
            CacheEventType::FileDeleted => "file.deleted",
            CacheEventType::FileAccessed => "file.accessed",
            CacheEventType::FileShared => "file.shared",
            CacheEventType::UserUpdated => "user.updated",
            CacheEventType::SessionRevoked => "session.revoked",
            CacheEventType::StatsRecomputed => "stats.recomputed",
            CacheEventType::BulkCleanup => "bulk.cleanup",
        }
    }
}

/// How an event's keys are removed from the store.
///
/// The set is sealed: strategy dispatch is an exhaustive match, so adding a
/// strategy is a compile-time-checked change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidationStrategy {
    /// Point-delete each literal key
    Immediate,
    /// Scan for each wildcard pattern, bulk-delete the matched set
    PatternBased,
    /// Existence-check each literal key, delete only confirmed-present keys
    Selective,
    /// No proactive delete; rely on the TTL set at write time
    Lazy,
}

impl InvalidationStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            InvalidationStrategy::Immediate => "immediate",
            InvalidationStrategy::PatternBased => "pattern_based",
            InvalidationStrategy::Selective => "selective",
            InvalidationStrategy::Lazy => "lazy",
        }
    }
}

/// One invalidation request, consumed exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvalidationEvent {
    pub id: Uuid,
    pub event_type: CacheEventType,
    /// Literal keys or wildcard patterns, depending on the strategy
    pub keys: Vec<String>,
    pub strategy: InvalidationStrategy,
    pub enqueued_at: DateTime<Utc>,
    /// Opaque caller-supplied context, carried through for logging
    pub metadata: HashMap<String, String>,
}

impl InvalidationEvent {
    pub fn new(
        event_type: CacheEventType,
        keys: Vec<String>,
        strategy: InvalidationStrategy,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type,
            keys,
            strategy,
            enqueued_at: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: HashMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_construction() {
        let event = InvalidationEvent::new(
            CacheEventType::FileDeleted,
            vec!["fw:file:meta:abc".to_string()],
            InvalidationStrategy::Immediate,
        );

        assert_eq!(event.event_type, CacheEventType::FileDeleted);
        assert_eq!(event.keys, vec!["fw:file:meta:abc"]);
        assert_eq!(event.strategy, InvalidationStrategy::Immediate);
        assert!(event.metadata.is_empty());
    }

    #[test]
    fn test_event_ids_are_unique() {
        let first = InvalidationEvent::new(
            CacheEventType::FileUpdated,
            vec![],
            InvalidationStrategy::Lazy,
        );
        let second = InvalidationEvent::new(
            CacheEventType::FileUpdated,
            vec![],
            InvalidationStrategy::Lazy,
        );
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_event_metadata_builder() {
        let mut metadata = HashMap::new();
        metadata.insert("request_id".to_string(), "req-9".to_string());

        let event = InvalidationEvent::new(
            CacheEventType::UserUpdated,
            vec!["fw:user:profile:u1".to_string()],
            InvalidationStrategy::Selective,
        )
        .with_metadata(metadata);

        assert_eq!(event.metadata.get("request_id").map(String::as_str), Some("req-9"));
    }

    #[test]
    fn test_names_are_stable() {
        assert_eq!(CacheEventType::FileDeleted.name(), "file.deleted");
        assert_eq!(InvalidationStrategy::PatternBased.name(), "pattern_based");
    }

    #[test]
    fn test_event_round_trips_through_serde() {
        let event = InvalidationEvent::new(
            CacheEventType::StatsRecomputed,
            vec!["fw:stats:global".to_string()],
            InvalidationStrategy::PatternBased,
        );

        let json = serde_json::to_string(&event).unwrap();
        let parsed: InvalidationEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, event.id);
        assert_eq!(parsed.strategy, event.strategy);
    }
}
