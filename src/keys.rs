//! # Cache Key Construction
//!
//! Deterministic, namespaced key construction for every cache consumer. Keys
//! are a pure function of (prefix, ordered parts): the same inputs always
//! produce the same key, so lookup paths and invalidation paths never need to
//! coordinate beyond agreeing on the prefix.
//!
//! Keys that would exceed the store's size bound collapse to
//! `{namespace}:{prefix}:hash:{16-hex-sha256}`, keeping the key bounded while
//! preserving near-certain uniqueness.

use sha2::{Digest, Sha256};

use crate::constants::{HASHED_KEY_HEX_LEN, HASHED_KEY_MARKER, MAX_KEY_BYTES};

/// Builds namespaced cache keys and scan patterns.
///
/// One builder is constructed by the composition root and handed to every
/// component that needs to compute a key; the namespace is fixed for the
/// lifetime of the process.
#[derive(Debug, Clone)]
pub struct KeyBuilder {
    namespace: String,
}

impl KeyBuilder {
    /// Create a builder for the given namespace
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    /// The namespace this builder prepends to every key
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Build a cache key from a prefix and ordered parts.
    ///
    /// Pure and total: no I/O, always succeeds. Oversized keys are collapsed
    /// to their hashed form.
    pub fn build(&self, prefix: &str, parts: &[&str]) -> String {
        let mut key = String::with_capacity(
            self.namespace.len() + prefix.len() + parts.iter().map(|p| p.len() + 1).sum::<usize>() + 1,
        );
        key.push_str(&self.namespace);
        key.push(':');
        key.push_str(prefix);
        for part in parts {
            key.push(':');
            key.push_str(part);
        }
        self.bounded(prefix, key)
    }

    /// Build a scan pattern: the same joined form with a trailing `:*`
    /// wildcard for scan-matching.
    pub fn pattern(&self, prefix: &str, parts: &[&str]) -> String {
        let mut pattern = String::with_capacity(self.namespace.len() + prefix.len() + 4);
        pattern.push_str(&self.namespace);
        pattern.push(':');
        pattern.push_str(prefix);
        for part in parts {
            pattern.push(':');
            pattern.push_str(part);
        }
        pattern.push_str(":*");
        pattern
    }

    /// Collapse keys above the store's byte bound to
    /// `{namespace}:{prefix}:hash:{16-hex-sha256-of-full-key}`.
    fn bounded(&self, prefix: &str, key: String) -> String {
        if key.len() <= MAX_KEY_BYTES {
            return key;
        }

        let digest = Sha256::digest(key.as_bytes());
        let mut hex = String::with_capacity(HASHED_KEY_HEX_LEN);
        for byte in digest.iter().take(HASHED_KEY_HEX_LEN / 2) {
            hex.push_str(&format!("{byte:02x}"));
        }

        format!("{}:{}:{}:{}", self.namespace, prefix, HASHED_KEY_MARKER, hex)
    }
}
