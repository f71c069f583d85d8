//! Iterator over an [`EventualMap`](crate::EventualMap).

use std::hash::Hash;
use std::sync::Arc;
use std::vec;

use crate::sync::Synchronizer;

/// Iterator yielding owned `(K, V)` pairs.
///
/// The key set is captured from the snapshot current at creation. Each step
/// looks the next key up in the snapshot current at that step, so values
/// reflect later passes. Keys removed by a later pass are skipped.
pub struct Iter<K, V> {
    keys: vec::IntoIter<K>,
    sync: Arc<Synchronizer<K, V>>,
}

impl<K: Clone, V> Iter<K, V> {
    pub(crate) fn new(sync: Arc<Synchronizer<K, V>>) -> Self {
        let keys: Vec<K> = sync.snapshot().keys().cloned().collect();
        Self {
            keys: keys.into_iter(),
            sync,
        }
    }
}

impl<K: Hash + Eq, V: Clone> Iterator for Iter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        for key in self.keys.by_ref() {
            let value = self.sync.snapshot().get(&key).cloned();
            if let Some(value) = value {
                return Some((key, value));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.keys.len()))
    }
}
