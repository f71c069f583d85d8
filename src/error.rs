//! Error type for map operations.

use std::io;

/// Errors reported synchronously by [`EventualMap`](crate::EventualMap).
///
/// Failures inside a synchronization pass never surface here: they are
/// isolated to the request that caused them and logged.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A write used the sentinel key (`K::default()`). Nothing was enqueued.
    #[error("key must not be the default value")]
    InvalidKey,

    /// The key is absent from the current snapshot.
    #[error("key not found")]
    KeyNotFound,

    /// The map has been disposed; the write was discarded.
    #[error("map has been disposed")]
    Disposed,

    /// The scheduler could not start its tick thread.
    #[error("failed to start synchronizer: {0}")]
    Spawn(#[from] io::Error),
}

/// Shorthand for results carrying [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;
