//! Periodic tick sources.
//!
//! The map registers one tick handler with a [`Scheduler`] at construction
//! and stops it on disposal. [`IntervalScheduler`] drives real maps;
//! [`ManualScheduler`] lets tests decide exactly when a pass runs.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Sender, select};
use parking_lot::Mutex;

/// Tick handler registered by the map.
pub type Tick = Arc<dyn Fn() + Send + Sync>;

/// Source of periodic tick notifications.
pub trait Scheduler: Send {
    /// Registers `tick` and starts invoking it.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying tick source cannot be started.
    fn start(&mut self, tick: Tick) -> io::Result<()>;

    /// Stops invoking the handler. Must be idempotent.
    fn stop(&mut self);
}

// ---------------------------------------------------------------------------
// Interval scheduler
// ---------------------------------------------------------------------------

/// Runs the handler on a dedicated thread every `interval`.
///
/// Ticks that come due while the handler is still running are dropped, not
/// queued: the next call happens one full interval after a slow one returns.
pub struct IntervalScheduler {
    interval: Duration,
    shutdown: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl IntervalScheduler {
    /// Creates a stopped scheduler.
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            shutdown: None,
            handle: None,
        }
    }

    /// Returns the tick interval.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }
}

impl Scheduler for IntervalScheduler {
    fn start(&mut self, tick: Tick) -> io::Result<()> {
        self.stop();

        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(0);
        let ticker = crossbeam_channel::tick(self.interval);
        let handle = thread::Builder::new()
            .name("eventual-map-sync".into())
            .spawn(move || {
                loop {
                    select! {
                        recv(ticker) -> _ => {
                            tick();
                            // Drop the tick that fell due during the call.
                            while ticker.try_recv().is_ok() {}
                        }
                        // Disconnects when the sender is dropped.
                        recv(shutdown_rx) -> _ => break,
                    }
                }
            })?;

        tracing::trace!(interval = ?self.interval, "eventual_map.scheduler.start");
        self.shutdown = Some(shutdown_tx);
        self.handle = Some(handle);
        Ok(())
    }

    fn stop(&mut self) {
        drop(self.shutdown.take());
        if let Some(handle) = self.handle.take() {
            // Never join from the tick thread itself.
            if handle.thread().id() != thread::current().id() && handle.join().is_err() {
                tracing::warn!("eventual_map.scheduler.tick_thread_panicked");
            }
            tracing::trace!("eventual_map.scheduler.stop");
        }
    }
}

impl Drop for IntervalScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

// ---------------------------------------------------------------------------
// Manual scheduler
// ---------------------------------------------------------------------------

/// Scheduler that ticks only when its [`ManualTicker`] fires.
#[derive(Default)]
pub struct ManualScheduler {
    slot: Arc<Mutex<Option<Tick>>>,
}

impl ManualScheduler {
    /// Creates a scheduler with no registered handler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a handle that fires ticks on demand.
    #[must_use]
    pub fn ticker(&self) -> ManualTicker {
        ManualTicker {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl Scheduler for ManualScheduler {
    fn start(&mut self, tick: Tick) -> io::Result<()> {
        *self.slot.lock() = Some(tick);
        Ok(())
    }

    fn stop(&mut self) {
        self.slot.lock().take();
    }
}

/// Cloneable trigger for a [`ManualScheduler`].
#[derive(Clone)]
pub struct ManualTicker {
    slot: Arc<Mutex<Option<Tick>>>,
}

impl ManualTicker {
    /// Runs one tick on the calling thread.
    ///
    /// Returns `false` if no handler is registered (not started, or stopped).
    pub fn fire(&self) -> bool {
        // Clone out so concurrent fires are not serialized by the slot lock.
        let tick = self.slot.lock().clone();
        tick.is_some_and(|tick| {
            tick();
            true
        })
    }
}
