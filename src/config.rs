//! Construction-time configuration.

use std::time::Duration;

/// Default interval between synchronization passes.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(10);

/// Default maximum number of requests applied per pass.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Settings for an [`EventualMap`](crate::EventualMap).
///
/// `interval` is fixed once the map is built; `batch_size` only seeds the
/// runtime value, which [`set_batch_size`](crate::EventualMap::set_batch_size)
/// can change later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Time between two scheduler ticks.
    pub interval: Duration,
    /// Maximum number of requests drained by one pass. Zero pauses application.
    pub batch_size: usize,
}

impl Config {
    /// Creates a configuration with the default interval and batch size.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Sets the tick interval.
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the initial batch size.
    #[must_use]
    pub const fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
