//! Eventually-consistent key/value map.
//!
//! Writers never block and readers never lock. Every write becomes a queued
//! request; a periodic synchronization pass applies a bounded batch of them
//! to an authoritative map and publishes an immutable snapshot, which is the
//! only thing readers ever see.
//!
//! # Key properties
//!
//! - **Non-blocking writes**: `add`, `try_add`, `remove`, `clear` only enqueue
//! - **Lock-free reads**: lookups load the current [`Snapshot`] atomically
//! - **Bounded staleness**: writes show up after the next pass that drains them
//! - **Backpressure by skip**: a tick that overlaps a running pass is dropped
//! - **Zero `unsafe`**: enforced by `#![forbid(unsafe_code)]`
//!
//! # Example
//!
//! ```
//! use eventual_map::{Config, EventualMap, ManualScheduler};
//!
//! let scheduler = ManualScheduler::new();
//! let ticker = scheduler.ticker();
//! let map = EventualMap::with_scheduler([], Config::default(), scheduler)?;
//!
//! map.add(1, "a")?;
//! assert!(!map.contains_key(&1));
//!
//! ticker.fire();
//! assert_eq!(map.get(&1)?, "a");
//! # Ok::<(), eventual_map::Error>(())
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod iter;
pub mod scheduler;
pub mod snapshot;

mod map;
mod queue;
mod request;
mod sync;

#[cfg(test)]
mod tests;

pub use config::Config;
pub use error::{Error, Result};
pub use map::EventualMap;
pub use scheduler::{IntervalScheduler, ManualScheduler, ManualTicker, Scheduler};
pub use snapshot::Snapshot;
