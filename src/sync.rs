//! Synchronization passes.
//!
//! A pass drains a bounded batch from the [`RequestQueue`], applies each
//! request to the authoritative map and, if anything changed, publishes a
//! fresh [`Snapshot`].
//!
//! # Invariants
//!
//! - At most one pass runs at a time. Overlapping ticks are skipped, never
//!   queued or blocked.
//! - A request is popped before it is applied, so it is applied at most once.
//! - A failing request does not abort the batch or leave the guard held.
//! - A panic while publishing does not kill the tick source; the next pass
//!   publishes again.

use std::collections::HashMap;
use std::hash::Hash;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{self, AtomicBool, AtomicUsize, Ordering};

use arc_swap::ArcSwap;
use parking_lot::Mutex;

use crate::queue::RequestQueue;
use crate::request::Request;
use crate::snapshot::Snapshot;

/// Result of one [`Synchronizer::run_pass`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// Another pass held the guard, or the map was disposed.
    Skipped,
    /// The pass ran but had nothing to apply or publish.
    Idle,
    /// The pass applied `drained` requests.
    Applied {
        /// Requests removed from the queue.
        drained: usize,
        /// Whether a new snapshot was published.
        changed: bool,
    },
    /// The pass panicked outside request application; the guard was
    /// released and the next pass retries publication.
    Failed,
}

/// Owns the authoritative map and everything a pass needs.
pub struct Synchronizer<K, V> {
    queue: RequestQueue<K, V>,
    /// Only locked while `running` is held, so never contended.
    source: Mutex<HashMap<K, V>>,
    snapshot: ArcSwap<Snapshot<K, V>>,
    batch_size: AtomicUsize,
    running: AtomicBool,
    stopped: AtomicBool,
    /// Source changed since the last successful publication.
    stale: AtomicBool,
}

/// Holds the reentrancy flag; clears it on drop.
struct PassGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> PassGuard<'a> {
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

// ---------------------------------------------------------------------------
// Construction & accessors (no trait bounds)
// ---------------------------------------------------------------------------

impl<K, V> Synchronizer<K, V> {
    /// Current published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Snapshot<K, V>> {
        self.snapshot.load_full()
    }

    /// Queue that writers push into.
    #[must_use]
    pub const fn queue(&self) -> &RequestQueue<K, V> {
        &self.queue
    }

    /// Maximum number of requests drained per pass.
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size.load(Ordering::Relaxed)
    }

    /// Changes the per-pass cap; takes effect from the next pass.
    pub fn set_batch_size(&self, batch_size: usize) {
        self.batch_size.store(batch_size, Ordering::Relaxed);
    }

    /// Returns `true` once [`stop`](Self::stop) has been called.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Refuses all further passes and discards queued requests.
    ///
    /// Returns `None` if already stopped, otherwise the discarded count.
    pub fn stop(&self) -> Option<usize> {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return None;
        }
        // Pairs with the fence in `enqueue`: a push that missed the flag is
        // seen by this discard, or its producer sees the flag.
        atomic::fence(Ordering::SeqCst);
        Some(self.queue.discard())
    }

    /// Pushes a request unless stopped. Returns `false` if refused.
    ///
    /// A request pushed concurrently with [`stop`](Self::stop) is discarded
    /// here rather than left queued.
    pub fn enqueue(&self, request: Request<K, V>) -> bool {
        if self.is_stopped() {
            return false;
        }
        self.queue.enqueue(request);
        atomic::fence(Ordering::SeqCst);
        if self.is_stopped() {
            self.queue.discard();
            return false;
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Passes (K: Hash + Eq + Clone, V: Clone)
// ---------------------------------------------------------------------------

impl<K: Hash + Eq + Clone, V: Clone> Synchronizer<K, V> {
    /// Creates a synchronizer whose source and first snapshot hold `seed`.
    #[must_use]
    pub fn new(seed: HashMap<K, V>, batch_size: usize) -> Self {
        let snapshot = Snapshot::new(seed.clone());
        Self {
            queue: RequestQueue::new(),
            source: Mutex::new(seed),
            snapshot: ArcSwap::from_pointee(snapshot),
            batch_size: AtomicUsize::new(batch_size),
            running: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            stale: AtomicBool::new(false),
        }
    }

    /// Runs one pass unless another is in progress.
    pub fn run_pass(&self) -> PassOutcome {
        if self.is_stopped() {
            return PassOutcome::Skipped;
        }
        let Some(_guard) = PassGuard::try_acquire(&self.running) else {
            tracing::trace!("eventual_map.sync.skipped");
            return PassOutcome::Skipped;
        };

        panic::catch_unwind(AssertUnwindSafe(|| self.apply_and_publish())).unwrap_or_else(|_| {
            tracing::warn!("eventual_map.sync.pass_panicked");
            PassOutcome::Failed
        })
    }

    /// Body of a pass; the caller holds the guard.
    fn apply_and_publish(&self) -> PassOutcome {
        let batch = self.queue.dequeue_batch(self.batch_size());
        let drained = batch.len();

        let mut source = self.source.lock();
        for request in batch {
            let kind = request.kind();
            match panic::catch_unwind(AssertUnwindSafe(|| apply(&mut source, request))) {
                Ok(true) => self.stale.store(true, Ordering::Relaxed),
                Ok(false) => {}
                Err(_) => tracing::warn!(kind, "eventual_map.sync.request_panicked"),
            }
        }

        let changed = self.stale.load(Ordering::Relaxed);
        if changed {
            self.snapshot.store(Arc::new(Snapshot::new(source.clone())));
            self.stale.store(false, Ordering::Relaxed);
        }
        if drained == 0 && !changed {
            return PassOutcome::Idle;
        }
        tracing::debug!(drained, changed, len = source.len(), "eventual_map.sync.pass");
        PassOutcome::Applied { drained, changed }
    }
}

/// Applies one request to the authoritative map. Returns `true` if it changed.
pub fn apply<K: Hash + Eq, V>(source: &mut HashMap<K, V>, request: Request<K, V>) -> bool {
    match request {
        Request::Add {
            key,
            value,
            resolver,
        } => {
            let value = match (source.get(&key), resolver) {
                (Some(existing), Some(resolve)) => resolve(&key, existing, value),
                _ => value,
            };
            source.insert(key, value);
            true
        }
        Request::Remove { key } => source.remove(&key).is_some(),
        Request::Clear => {
            let had_entries = !source.is_empty();
            source.clear();
            had_entries
        }
    }
}
