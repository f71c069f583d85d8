//! Unbounded request queue.

use crossbeam_queue::SegQueue;

use crate::request::Request;

/// Multi-producer FIFO of [`Request`]s.
///
/// Producers never block. [`dequeue_batch`](Self::dequeue_batch) is meant for
/// the single synchronizer; FIFO order holds per producer.
pub struct RequestQueue<K, V> {
    inner: SegQueue<Request<K, V>>,
}

impl<K, V> RequestQueue<K, V> {
    /// Creates an empty queue.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: SegQueue::new(),
        }
    }

    /// Appends a request.
    pub fn enqueue(&self, request: Request<K, V>) {
        self.inner.push(request);
    }

    /// Removes up to `max` requests in FIFO order without waiting.
    #[must_use]
    pub fn dequeue_batch(&self, max: usize) -> Vec<Request<K, V>> {
        let mut batch = Vec::with_capacity(max.min(self.inner.len()));
        while batch.len() < max {
            match self.inner.pop() {
                Some(request) => batch.push(request),
                None => break,
            }
        }
        batch
    }

    /// Drops every queued request, returning how many were discarded.
    pub fn discard(&self) -> usize {
        let mut dropped = 0;
        while self.inner.pop().is_some() {
            dropped += 1;
        }
        dropped
    }

    /// Number of queued requests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }
}

impl<K, V> Default for RequestQueue<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
