//! # System Constants
//!
//! Core constants that define the operational boundaries of the Fileworks
//! cache core: key construction limits, queue bounds, and worker cadence.
//!
//! Runtime-tunable values live in [`crate::config::CacheCoreConfig`]; the
//! constants here are the defaults that configuration falls back to.

/// Default cache namespace prepended to every key.
pub const DEFAULT_NAMESPACE: &str = "fw";

/// Maximum encoded key length accepted by the backing store, in bytes.
///
/// Keys above this bound are collapsed to a hashed form by the key builder.
pub const MAX_KEY_BYTES: usize = 500;

/// Number of hex characters of the SHA-256 digest kept in a hashed key.
pub const HASHED_KEY_HEX_LEN: usize = 16;

/// Marker segment identifying a hashed key.
pub const HASHED_KEY_MARKER: &str = "hash";

/// Default bound on the in-memory invalidation queue.
pub const DEFAULT_QUEUE_MAX_SIZE: usize = 1000;

/// Default number of events drained per worker tick.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Default worker poll interval in seconds.
pub const DEFAULT_POLL_INTERVAL_SECONDS: u64 = 5;

/// Default capacity of the fire-and-forget submission channel.
pub const DEFAULT_SUBMIT_CHANNEL_CAPACITY: usize = 256;
