//! # In-Memory Store
//!
//! `DashMap`-backed [`KeyValueStore`] implementation with per-key expiry,
//! used by tests and local development. Expired entries are dropped lazily on
//! read and during scans; there is no background sweeper because expiry
//! correctness never depends on one.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use super::{KeyTtl, KeyValueStore, StoreResult};

#[derive(Debug, Clone)]
struct StoredEntry {
    value: String,
    /// `None` means the entry never expires
    expires_at: Option<Instant>,
}

impl StoredEntry {
    fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(at) => Instant::now() >= at,
            None => false,
        }
    }
}

/// In-process key-value store with native per-key expiry.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: DashMap<String, StoredEntry>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently held, including not-yet-purged expired ones
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert an entry without an expiry.
    ///
    /// The external store is shared with writers outside the cache core, and
    /// those writers may create keys that never expire; this models them.
    pub fn insert_persistent(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(
            key.into(),
            StoredEntry {
                value: value.into(),
                expires_at: None,
            },
        );
    }

    fn purge_if_expired(&self, key: &str) {
        self.entries.remove_if(key, |_, entry| entry.is_expired());
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        if let Some(entry) = self.entries.get(key) {
            if entry.is_expired() {
                drop(entry);
                self.purge_if_expired(key);
                return Ok(None);
            }
            return Ok(Some(entry.value.clone()));
        }
        Ok(None)
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl_seconds: u64) -> StoreResult<()> {
        self.entries.insert(
            key.to_string(),
            StoredEntry {
                value: value.to_string(),
                expires_at: Some(Instant::now() + Duration::from_secs(ttl_seconds)),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        match self.entries.remove(key) {
            Some((_, entry)) => Ok(!entry.is_expired()),
            None => Ok(false),
        }
    }

    async fn delete_many(&self, keys: &[String]) -> StoreResult<u64> {
        let mut removed = 0u64;
        for key in keys {
            if self.delete(key).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        if let Some(entry) = self.entries.get(key) {
            if entry.is_expired() {
                drop(entry);
                self.purge_if_expired(key);
                return Ok(false);
            }
            return Ok(true);
        }
        Ok(false)
    }

    async fn ttl(&self, key: &str) -> StoreResult<KeyTtl> {
        let Some(entry) = self.entries.get(key) else {
            return Ok(KeyTtl::Missing);
        };

        match entry.expires_at {
            None => Ok(KeyTtl::NoExpiry),
            Some(at) => {
                let now = Instant::now();
                if at <= now {
                    drop(entry);
                    self.purge_if_expired(key);
                    return Ok(KeyTtl::Missing);
                }
                let remaining = at - now;
                // Ceiling, so a freshly written ttl=N key reports N
                let mut seconds = remaining.as_secs();
                if remaining.subsec_nanos() > 0 {
                    seconds += 1;
                }
                Ok(KeyTtl::Remaining(seconds))
            }
        }
    }

    async fn scan(&self, pattern: &str) -> StoreResult<Vec<String>> {
        let mut matched = Vec::new();
        let mut expired = Vec::new();

        for entry in self.entries.iter() {
            if entry.value().is_expired() {
                expired.push(entry.key().clone());
                continue;
            }
            if glob_match(pattern, entry.key()) {
                matched.push(entry.key().clone());
            }
        }

        // Removal happens outside iteration to avoid holding shard locks
        for key in expired {
            self.purge_if_expired(&key);
        }

        matched.sort();
        Ok(matched)
    }
}

/// Match a `*` wildcard pattern against a candidate key.
fn glob_match(pattern: &str, candidate: &str) -> bool {
    if !pattern.contains('*') {
        return pattern == candidate;
    }

    let segments: Vec<&str> = pattern.split('*').collect();
    let mut remainder = candidate;

    for (index, segment) in segments.iter().enumerate() {
        if segment.is_empty() {
            continue;
        }
        if index == 0 {
            match remainder.strip_prefix(segment) {
                Some(rest) => remainder = rest,
                None => return false,
            }
        } else if index == segments.len() - 1 {
            return remainder.ends_with(segment);
        } else {
            match remainder.find(segment) {
                Some(pos) => remainder = &remainder[pos + segment.len()..],
                None => return false,
            }
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_get() {
        let store = InMemoryStore::new();
        store.set_with_ttl("fw:file:meta:abc", "{}", 60).await.unwrap();

        let value = store.get("fw:file:meta:abc").await.unwrap();
        assert_eq!(value, Some("{}".to_string()));
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let store = InMemoryStore::new();
        assert_eq!(store.get("absent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_entry_reads_as_missing() {
        let store = InMemoryStore::new();
        store.set_with_ttl("short", "v", 0).await.unwrap();

        assert_eq!(store.get("short").await.unwrap(), None);
        assert!(!store.exists("short").await.unwrap());
        assert_eq!(store.ttl("short").await.unwrap(), KeyTtl::Missing);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = InMemoryStore::new();
        store.set_with_ttl("k", "v", 60).await.unwrap();

        assert!(store.delete("k").await.unwrap());
        assert!(!store.delete("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_many_counts_live_entries() {
        let store = InMemoryStore::new();
        store.set_with_ttl("a", "1", 60).await.unwrap();
        store.set_with_ttl("b", "2", 60).await.unwrap();

        let keys = vec!["a".to_string(), "b".to_string(), "missing".to_string()];
        assert_eq!(store.delete_many(&keys).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_ttl_three_way_result() {
        let store = InMemoryStore::new();
        store.set_with_ttl("expiring", "v", 3600).await.unwrap();
        store.insert_persistent("forever", "v");

        assert_eq!(store.ttl("absent").await.unwrap(), KeyTtl::Missing);
        assert_eq!(store.ttl("forever").await.unwrap(), KeyTtl::NoExpiry);
        match store.ttl("expiring").await.unwrap() {
            KeyTtl::Remaining(seconds) => {
                assert!(seconds > 0 && seconds <= 3600);
            }
            other => panic!("expected Remaining, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_scan_matches_wildcard() {
        let store = InMemoryStore::new();
        store.set_with_ttl("fw:file:meta:a", "1", 60).await.unwrap();
        store.set_with_ttl("fw:file:meta:b", "2", 60).await.unwrap();
        store.set_with_ttl("fw:user:profile:a", "3", 60).await.unwrap();

        let matched = store.scan("fw:file:meta:*").await.unwrap();
        assert_eq!(matched, vec!["fw:file:meta:a", "fw:file:meta:b"]);
    }

    #[tokio::test]
    async fn test_scan_skips_expired_entries() {
        let store = InMemoryStore::new();
        store.set_with_ttl("fw:file:meta:live", "1", 60).await.unwrap();
        store.set_with_ttl("fw:file:meta:dead", "2", 0).await.unwrap();

        let matched = store.scan("fw:file:meta:*").await.unwrap();
        assert_eq!(matched, vec!["fw:file:meta:live"]);
    }

    #[test]
    fn test_glob_match_literal() {
        assert!(glob_match("fw:a:b", "fw:a:b"));
        assert!(!glob_match("fw:a:b", "fw:a:c"));
    }

    #[test]
    fn test_glob_match_trailing_wildcard() {
        assert!(glob_match("fw:file:meta:*", "fw:file:meta:abc"));
        assert!(!glob_match("fw:file:meta:*", "fw:user:profile:abc"));
    }

    #[test]
    fn test_glob_match_interior_wildcard() {
        assert!(glob_match("fw:file:*:abc", "fw:file:stats:abc"));
        assert!(!glob_match("fw:file:*:abc", "fw:file:stats:def"));
    }
}
