#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Fileworks Cache Core
//!
//! Caching and invalidation core for the Fileworks file-management backend.
//! Keeps an external key-value cache (with native per-key expiry) loosely
//! consistent with the authoritative relational store, without forcing
//! synchronous double-writes on every mutation.
//!
//! ## Architecture
//!
//! - Deterministic, namespaced **key construction** with a hashed fallback for
//!   oversized keys
//! - A fixed **TTL policy table** per category of cached data, applied by the
//!   [`ttl::TtlManager`] on every write-back
//! - A **multi-strategy invalidation engine**: bounded drop-oldest queue,
//!   one background worker per process, and exhaustive dispatch over a sealed
//!   strategy set
//! - **Mutation bindings** that tie domain mutations to invalidation through
//!   statically declared key templates - no runtime introspection, no global
//!   state
//!
//! Cache-layer failures never surface to users: the worst case is a stale
//! read until TTL expiry or an extra cache-miss recomputation.
//!
//! ## Module Organization
//!
//! - [`keys`] - Cache key construction
//! - [`ttl`] - TTL policy table and store wrapper
//! - [`invalidation`] - Event model, bounded queue, manager, background worker
//! - [`bindings`] - Mutation-to-invalidation binding layer
//! - [`store`] - Key-value store abstraction and in-memory implementation
//! - [`metrics`] - Metrics sink trait and in-process aggregation
//! - [`config`] - Environment-aware configuration
//! - [`error`] - Structured error handling
//! - [`core`] - Composition root wiring everything together
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use fileworks_cache::{CacheCore, CacheCoreConfig, InMemoryMetrics, InMemoryStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(InMemoryStore::new());
//! let metrics = Arc::new(InMemoryMetrics::new());
//! let core = CacheCore::new(store, metrics, CacheCoreConfig::from_environment())?;
//!
//! core.start()?;
//! let key = core.keys().build("file:meta", &["abc-123"]);
//! // ... serve traffic ...
//! core.shutdown(Duration::from_secs(5)).await?;
//! # Ok(())
//! # }
//! ```

pub mod bindings;
pub mod config;
pub mod constants;
pub mod core;
pub mod error;
pub mod invalidation;
pub mod keys;
pub mod logging;
pub mod metrics;
pub mod store;
pub mod ttl;

pub use bindings::{InvalidationHandle, KeyTemplate, MutationArgs, MutationBinding};
pub use config::CacheCoreConfig;
pub use core::CacheCore;
pub use error::{CacheCoreError, Result};
pub use invalidation::{
    BatchOutcome, CacheEventType, InvalidationEvent, InvalidationManager, InvalidationStrategy,
    InvalidationWorker,
};
pub use keys::KeyBuilder;
pub use logging::init_structured_logging;
pub use metrics::{InMemoryMetrics, MetricsSink, MetricsSnapshot, OperationStatus};
pub use store::{InMemoryStore, KeyTtl, KeyValueStore};
pub use ttl::{CacheCategory, TtlManager};
