//! Immutable published state.

use std::collections::HashMap;
use std::collections::hash_map;
use std::fmt;
use std::hash::Hash;

/// Read-only point-in-time copy of the authoritative map.
///
/// Snapshots are never mutated after publication; the synchronizer replaces
/// them wholesale.
pub struct Snapshot<K, V> {
    entries: HashMap<K, V>,
}

// ---------------------------------------------------------------------------
// Construction & accessors (no trait bounds)
// ---------------------------------------------------------------------------

impl<K, V> Snapshot<K, V> {
    /// Wraps a fully built map.
    #[must_use]
    pub const fn new(entries: HashMap<K, V>) -> Self {
        Self { entries }
    }

    /// Returns the number of key-value pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the snapshot contains no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns an iterator over `(&K, &V)` pairs in arbitrary order.
    #[must_use]
    pub fn iter(&self) -> hash_map::Iter<'_, K, V> {
        self.entries.iter()
    }

    /// Returns an iterator over the keys.
    #[must_use]
    pub fn keys(&self) -> hash_map::Keys<'_, K, V> {
        self.entries.keys()
    }

    /// Returns an iterator over the values.
    #[must_use]
    pub fn values(&self) -> hash_map::Values<'_, K, V> {
        self.entries.values()
    }
}

// ---------------------------------------------------------------------------
// Read operations (K: Hash + Eq)
// ---------------------------------------------------------------------------

impl<K: Hash + Eq, V> Snapshot<K, V> {
    /// Returns a reference to the value associated with `key`.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    /// Returns `true` if the snapshot contains the given key.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }
}

// ---------------------------------------------------------------------------
// Trait impls
// ---------------------------------------------------------------------------

impl<K, V> Default for Snapshot<K, V> {
    fn default() -> Self {
        Self::new(HashMap::new())
    }
}

impl<K, V> fmt::Debug for Snapshot<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("len", &self.entries.len())
            .finish_non_exhaustive()
    }
}

impl<'a, K, V> IntoIterator for &'a Snapshot<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = hash_map::Iter<'a, K, V>;

    fn into_iter(self) -> hash_map::Iter<'a, K, V> {
        self.iter()
    }
}
