//! # Invalidation Engine
//!
//! Multi-strategy cache invalidation with a bounded in-memory queue and a
//! single background worker per process.
//!
//! ## Event Lifecycle
//!
//! Pending (enqueued) -> Processing (claimed by the worker, or dispatched
//! synchronously for immediate invalidation from an async call site) -> Done.
//! Success and failure are both terminal; there is no automatic retry. The
//! queue is volatile: events are lost on crash or restart, which degrades to
//! "serve stale data until TTL expiry", never a correctness violation.
//!
//! ## Ordering
//!
//! FIFO order is preserved within the queue. No ordering is guaranteed across
//! events enqueued concurrently from different call sites; deletes are
//! idempotent and commutative per key, so interleavings are safe.

pub mod event;
pub mod manager;
pub mod queue;
pub mod worker;

pub use event::{CacheEventType, InvalidationEvent, InvalidationStrategy};
pub use manager::{BatchOutcome, InvalidationManager};
pub use queue::InvalidationQueue;
pub use worker::InvalidationWorker;
