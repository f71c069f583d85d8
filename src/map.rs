//! Eventually-consistent map facade.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::iter::Iter;
use crate::request::Request;
use crate::scheduler::{IntervalScheduler, Scheduler, Tick};
use crate::snapshot::Snapshot;
use crate::sync::Synchronizer;

/// Key/value map with non-blocking writes and lock-free reads.
///
/// Writes enqueue a request and return at once; a background pass applies
/// queued requests on each scheduler tick and publishes a new snapshot.
/// Reads only look at the current snapshot, so a write becomes visible after
/// the next pass that drains it, not when the call returns.
///
/// `K::default()` is reserved as a sentinel and rejected as a key.
pub struct EventualMap<K, V> {
    sync: Arc<Synchronizer<K, V>>,
    scheduler: Mutex<Box<dyn Scheduler>>,
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

impl<K, V> EventualMap<K, V>
where
    K: Hash + Eq + Clone + Default + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Creates an empty map with the default [`Config`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Spawn`] if the tick thread cannot be started.
    pub fn new() -> Result<Self> {
        Self::with_config(Config::default())
    }

    /// Creates an empty map ticking at `config.interval`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Spawn`] if the tick thread cannot be started.
    pub fn with_config(config: Config) -> Result<Self> {
        Self::from_entries(std::iter::empty(), config)
    }

    /// Creates a map seeded with `entries`, visible to readers immediately.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKey`] if a seed key is the sentinel, or
    /// [`Error::Spawn`] if the tick thread cannot be started.
    pub fn from_entries<I>(entries: I, config: Config) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        Self::with_scheduler(entries, config, IntervalScheduler::new(config.interval))
    }

    /// Creates a seeded map driven by a caller-supplied scheduler.
    ///
    /// `config.interval` is ignored; the scheduler decides when passes run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKey`] if a seed key is the sentinel, or
    /// [`Error::Spawn`] if the scheduler fails to start.
    pub fn with_scheduler<I, S>(entries: I, config: Config, mut scheduler: S) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        S: Scheduler + 'static,
    {
        let mut seed = HashMap::new();
        for (key, value) in entries {
            check_key(&key)?;
            seed.insert(key, value);
        }

        let sync = Arc::new(Synchronizer::new(seed, config.batch_size));
        let tick: Tick = {
            let sync = Arc::clone(&sync);
            Arc::new(move || {
                sync.run_pass();
            })
        };
        scheduler.start(tick)?;

        let scheduler: Box<dyn Scheduler> = Box::new(scheduler);
        Ok(Self {
            sync,
            scheduler: Mutex::new(scheduler),
        })
    }
}

// ---------------------------------------------------------------------------
// Accessors & lifecycle (no trait bounds)
// ---------------------------------------------------------------------------

impl<K, V> EventualMap<K, V> {
    /// Returns the current snapshot.
    ///
    /// Holding the returned `Arc` gives a consistent view across several
    /// reads, unaffected by later passes.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Snapshot<K, V>> {
        self.sync.snapshot()
    }

    /// Returns the number of entries in the current snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sync.snapshot().len()
    }

    /// Returns `true` if the current snapshot is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sync.snapshot().is_empty()
    }

    /// Returns the number of requests waiting to be applied.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.sync.queue().len()
    }

    /// Returns the maximum number of requests applied per pass.
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.sync.batch_size()
    }

    /// Sets the maximum number of requests applied per pass.
    pub fn set_batch_size(&self, batch_size: usize) {
        self.sync.set_batch_size(batch_size);
    }

    /// Returns `true` once the map has been disposed.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.sync.is_stopped()
    }

    /// Stops the scheduler and discards all queued requests.
    ///
    /// Idempotent. The current snapshot stays readable; writes fail with
    /// [`Error::Disposed`] afterwards.
    pub fn dispose(&self) {
        let Some(discarded) = self.sync.stop() else {
            return;
        };
        self.scheduler.lock().stop();
        tracing::debug!(discarded, "eventual_map.dispose");
    }
}

// ---------------------------------------------------------------------------
// Read operations (K: Hash + Eq, V: Clone)
// ---------------------------------------------------------------------------

impl<K: Hash + Eq + Clone, V: Clone> EventualMap<K, V> {
    /// Returns `true` if the current snapshot contains `key`.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.sync.snapshot().contains_key(key)
    }

    /// Returns `true` if the current snapshot maps `key` to `value`.
    #[must_use]
    pub fn contains_entry(&self, key: &K, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.sync.snapshot().get(key) == Some(value)
    }

    /// Returns a copy of the value for `key`, if present.
    #[must_use]
    pub fn try_get(&self, key: &K) -> Option<V> {
        self.sync.snapshot().get(key).cloned()
    }

    /// Returns a copy of the value for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] if the current snapshot lacks `key`.
    pub fn get(&self, key: &K) -> Result<V> {
        self.try_get(key).ok_or(Error::KeyNotFound)
    }

    /// Returns the keys of the current snapshot.
    #[must_use]
    pub fn keys(&self) -> Vec<K> {
        self.sync.snapshot().keys().cloned().collect()
    }

    /// Returns the values of the current snapshot.
    #[must_use]
    pub fn values(&self) -> Vec<V> {
        self.sync.snapshot().values().cloned().collect()
    }

    /// Copies the entries of the current snapshot out.
    #[must_use]
    pub fn to_vec(&self) -> Vec<(K, V)> {
        self.sync
            .snapshot()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Returns an iterator over owned `(K, V)` pairs.
    ///
    /// See [`Iter`] for how concurrent passes affect iteration.
    #[must_use]
    pub fn iter(&self) -> Iter<K, V> {
        Iter::new(Arc::clone(&self.sync))
    }
}

// ---------------------------------------------------------------------------
// Write operations (K: Hash + Eq + Clone + Default)
// ---------------------------------------------------------------------------

impl<K: Hash + Eq + Clone + Default, V> EventualMap<K, V> {
    /// Queues an insert of `key`, overwriting any existing value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKey`] for the sentinel key and
    /// [`Error::Disposed`] after disposal.
    pub fn add(&self, key: K, value: V) -> Result<()> {
        self.try_add(key, value)
    }

    /// Indexed-assignment form of [`add`](Self::add).
    ///
    /// # Errors
    ///
    /// Same as [`add`](Self::add).
    pub fn set(&self, key: K, value: V) -> Result<()> {
        self.add(key, value)
    }

    /// Queues an insert of `key`; an existing value is overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKey`] for the sentinel key and
    /// [`Error::Disposed`] after disposal.
    pub fn try_add(&self, key: K, value: V) -> Result<()> {
        check_key(&key)?;
        self.enqueue(Request::Add {
            key,
            value,
            resolver: None,
        })
    }

    /// Queues an insert of `key`; if the key exists when the request is
    /// applied, `resolver(key, existing, incoming)` computes the stored value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKey`] for the sentinel key and
    /// [`Error::Disposed`] after disposal.
    pub fn try_add_with<F>(&self, key: K, value: V, resolver: F) -> Result<()>
    where
        F: FnOnce(&K, &V, V) -> V + Send + 'static,
    {
        check_key(&key)?;
        self.enqueue(Request::Add {
            key,
            value,
            resolver: Some(Box::new(resolver)),
        })
    }

    /// Queues a removal of `key`.
    ///
    /// Returns whether the request was accepted, not whether the key was
    /// present: `false` only for the sentinel key or after disposal.
    pub fn remove(&self, key: &K) -> bool {
        check_key(key).is_ok() && self.enqueue(Request::Remove { key: key.clone() }).is_ok()
    }

    /// Queues removal of every entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Disposed`] after disposal.
    pub fn clear(&self) -> Result<()> {
        self.enqueue(Request::Clear)
    }

    fn enqueue(&self, request: Request<K, V>) -> Result<()> {
        let kind = request.kind();
        if !self.sync.enqueue(request) {
            return Err(Error::Disposed);
        }
        tracing::trace!(kind, "eventual_map.enqueue");
        Ok(())
    }
}

fn check_key<K: Default + PartialEq>(key: &K) -> Result<()> {
    if *key == K::default() {
        Err(Error::InvalidKey)
    } else {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Trait impls
// ---------------------------------------------------------------------------

impl<K, V> Drop for EventualMap<K, V> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<K, V> fmt::Debug for EventualMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventualMap")
            .field("len", &self.len())
            .field("pending", &self.pending())
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}

impl<K: Hash + Eq + Clone, V: Clone> IntoIterator for &EventualMap<K, V> {
    type Item = (K, V);
    type IntoIter = Iter<K, V>;

    fn into_iter(self) -> Iter<K, V> {
        self.iter()
    }
}
