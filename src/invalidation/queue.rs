//! # Bounded Invalidation Queue
//!
//! FIFO queue owned exclusively by one invalidation manager. The bound is
//! enforced with a drop-oldest policy: producers never block and never fail,
//! at the cost of shedding the stalest invalidation work under overflow,
//! which degrades to "serve stale data until TTL", never a correctness
//! violation. Overflow is observable through a counter and a warn log.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::warn;

use super::event::InvalidationEvent;

#[derive(Debug)]
pub struct InvalidationQueue {
    events: Mutex<VecDeque<InvalidationEvent>>,
    max_size: usize,
    dropped_total: AtomicU64,
}

impl InvalidationQueue {
    pub fn new(max_size: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(max_size.min(1024))),
            max_size,
            dropped_total: AtomicU64::new(0),
        }
    }

    /// Append an event, evicting the oldest entry first when full.
    ///
    /// Returns `true` when an older event was dropped to make room.
    pub fn push(&self, event: InvalidationEvent) -> bool {
        let mut events = self.events.lock();
        let mut overflowed = false;

        if events.len() >= self.max_size {
            if let Some(dropped) = events.pop_front() {
                overflowed = true;
                self.dropped_total.fetch_add(1, Ordering::Relaxed);
                warn!(
                    dropped_event_id = %dropped.id,
                    dropped_event_type = dropped.event_type.name(),
                    queue_max_size = self.max_size,
                    "Invalidation queue overflow - dropped oldest event"
                );
            }
        }

        events.push_back(event);
        overflowed
    }

    /// Pop up to `max` events in FIFO order.
    pub fn pop_batch(&self, max: usize) -> Vec<InvalidationEvent> {
        let mut events = self.events.lock();
        let count = max.min(events.len());
        events.drain(..count).collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Total events dropped to overflow since construction
    pub fn dropped_total(&self) -> u64 {
        self.dropped_total.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invalidation::event::{CacheEventType, InvalidationStrategy};

    fn event(tag: usize) -> InvalidationEvent {
        InvalidationEvent::new(
            CacheEventType::FileUpdated,
            vec![format!("fw:file:meta:{tag}")],
            InvalidationStrategy::Immediate,
        )
    }

    #[test]
    fn test_fifo_order_preserved() {
        let queue = InvalidationQueue::new(10);
        for tag in 0..3 {
            queue.push(event(tag));
        }

        let batch = queue.pop_batch(10);
        let keys: Vec<&str> = batch.iter().map(|e| e.keys[0].as_str()).collect();
        assert_eq!(keys, vec!["fw:file:meta:0", "fw:file:meta:1", "fw:file:meta:2"]);
    }

    #[test]
    fn test_overflow_drops_oldest() {
        let queue = InvalidationQueue::new(1000);
        for tag in 0..1001 {
            queue.push(event(tag));
        }

        assert_eq!(queue.len(), 1000);
        assert_eq!(queue.dropped_total(), 1);

        let batch = queue.pop_batch(1000);
        // Event 0 was evicted; 1000 survived
        assert_eq!(batch.first().unwrap().keys[0], "fw:file:meta:1");
        assert_eq!(batch.last().unwrap().keys[0], "fw:file:meta:1000");
    }

    #[test]
    fn test_overflow_by_k_drops_k_oldest() {
        let queue = InvalidationQueue::new(5);
        for tag in 0..8 {
            queue.push(event(tag));
        }

        assert_eq!(queue.len(), 5);
        assert_eq!(queue.dropped_total(), 3);

        let keys: Vec<String> = queue
            .pop_batch(5)
            .into_iter()
            .map(|e| e.keys[0].clone())
            .collect();
        assert_eq!(
            keys,
            vec![
                "fw:file:meta:3",
                "fw:file:meta:4",
                "fw:file:meta:5",
                "fw:file:meta:6",
                "fw:file:meta:7"
            ]
        );
    }

    #[test]
    fn test_pop_batch_respects_limit() {
        let queue = InvalidationQueue::new(10);
        for tag in 0..7 {
            queue.push(event(tag));
        }

        assert_eq!(queue.pop_batch(3).len(), 3);
        assert_eq!(queue.len(), 4);
        assert_eq!(queue.pop_batch(10).len(), 4);
        assert!(queue.is_empty());
    }
}
