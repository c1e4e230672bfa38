//! Bounded drop-oldest queue between a live bar producer and the consumer.
//!
//! The producer never waits: when the queue is full the oldest retained
//! message is evicted to make room. The consumer waits until a message is
//! available. Acting on a stale minute bar is worse than skipping one, so
//! recency wins over completeness.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;
use tracing::trace;

/// Single-producer / single-consumer latest-data-wins queue.
#[derive(Debug)]
pub struct LatestQueue<T> {
    buffer: Mutex<VecDeque<T>>,
    capacity: usize,
    ready: Notify,
    evicted: AtomicU64,
}

impl<T> LatestQueue<T> {
    pub const DEFAULT_CAPACITY: usize = 1;

    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 1, "LatestQueue capacity must be >= 1");
        Self {
            buffer: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            ready: Notify::new(),
            evicted: AtomicU64::new(0),
        }
    }

    /// Insert `msg`, evicting the oldest message if the queue is full.
    ///
    /// Never blocks and never fails. Returns the evicted message, if any.
    pub fn enqueue(&self, msg: T) -> Option<T> {
        let dropped = {
            let mut buffer = self.lock();
            let dropped = if buffer.len() >= self.capacity {
                buffer.pop_front()
            } else {
                None
            };
            buffer.push_back(msg);
            dropped
        };
        if dropped.is_some() {
            let total = self.evicted.fetch_add(1, Ordering::Relaxed) + 1;
            trace!(evicted_total = total, "queue full, dropped oldest message");
        }
        self.ready.notify_one();
        dropped
    }

    /// Wait for the next message, oldest retained first.
    pub async fn dequeue(&self) -> T {
        loop {
            if let Some(msg) = self.try_dequeue() {
                return msg;
            }
            self.ready.notified().await;
        }
    }

    /// Take the next message without waiting.
    pub fn try_dequeue(&self) -> Option<T> {
        self.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Messages dropped by eviction since the queue was created.
    pub fn evicted(&self) -> u64 {
        self.evicted.load(Ordering::Relaxed)
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Default for LatestQueue<T> {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
