//! # Key-Value Store Abstraction
//!
//! The cache core consumes an external key-value store with native per-key
//! expiry through the [`KeyValueStore`] trait. Production processes plug in a
//! real client (Redis or compatible); tests and local development use the
//! bundled [`InMemoryStore`].
//!
//! Every operation suspends the calling task pending I/O, and every
//! implementation must be safe under pure interleaving from arbitrarily many
//! concurrent callers: deletes are idempotent, overwrites at-most-once
//! effective.

pub mod memory;

pub use memory::InMemoryStore;

use async_trait::async_trait;

use crate::error::CacheCoreError;

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, CacheCoreError>;

/// Remaining lifetime of a key as reported by the store.
///
/// "Key missing" and "key present without expiry" are distinct outcomes and
/// are never collapsed into one sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTtl {
    /// The key does not exist
    Missing,
    /// The key exists but carries no expiry
    NoExpiry,
    /// Seconds until the key expires
    Remaining(u64),
}

/// Abstract key-value store with native per-key expiry.
#[async_trait]
pub trait KeyValueStore: Send + Sync + std::fmt::Debug {
    /// Read a value; `None` when the key is missing or expired
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Write a value with an expiry in seconds
    async fn set_with_ttl(&self, key: &str, value: &str, ttl_seconds: u64) -> StoreResult<()>;

    /// Delete a key; returns whether a live entry was removed
    async fn delete(&self, key: &str) -> StoreResult<bool>;

    /// Delete a set of keys; returns the number of live entries removed
    async fn delete_many(&self, keys: &[String]) -> StoreResult<u64>;

    /// Whether a live entry exists for the key
    async fn exists(&self, key: &str) -> StoreResult<bool>;

    /// Remaining lifetime of the key
    async fn ttl(&self, key: &str) -> StoreResult<KeyTtl>;

    /// Keys currently live that match the given `*` wildcard pattern
    async fn scan(&self, pattern: &str) -> StoreResult<Vec<String>>;
}
