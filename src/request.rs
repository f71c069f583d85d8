//! Pending mutations.

use std::fmt;

/// Conflict resolver for an add on a key that is already present.
///
/// Called with the key, the stored value and the incoming value; the
/// returned value is stored under the key.
pub type Resolver<K, V> = Box<dyn FnOnce(&K, &V, V) -> V + Send>;

/// One queued change, applied later by the synchronizer.
pub enum Request<K, V> {
    /// Insert `key`, or update it if present.
    Add {
        /// Target key.
        key: K,
        /// Incoming value.
        value: V,
        /// Merges stored and incoming values; `None` overwrites.
        resolver: Option<Resolver<K, V>>,
    },
    /// Delete `key` if present.
    Remove {
        /// Target key.
        key: K,
    },
    /// Delete every key.
    Clear,
}

impl<K, V> Request<K, V> {
    /// Short name of the request kind, used in log fields.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::Remove { .. } => "remove",
            Self::Clear => "clear",
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Request<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add {
                key,
                value,
                resolver,
            } => f
                .debug_struct("Add")
                .field("key", key)
                .field("value", value)
                .field("resolver", &resolver.as_ref().map(|_| "<closure>"))
                .finish(),
            Self::Remove { key } => f.debug_struct("Remove").field("key", key).finish(),
            Self::Clear => f.write_str("Clear"),
        }
    }
}
