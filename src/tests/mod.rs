use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::{Config, EventualMap, ManualScheduler, ManualTicker};

mod lifecycle;
mod stress;

/// Map driven by a manual scheduler, plus the ticker that drives it.
fn manual<K, V>() -> (EventualMap<K, V>, ManualTicker)
where
    K: std::hash::Hash + Eq + Clone + Default + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    manual_with(Config::default())
}

fn manual_with<K, V>(config: Config) -> (EventualMap<K, V>, ManualTicker)
where
    K: std::hash::Hash + Eq + Clone + Default + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    let scheduler = ManualScheduler::new();
    let ticker = scheduler.ticker();
    let map = EventualMap::with_scheduler(std::iter::empty(), config, scheduler).unwrap();
    (map, ticker)
}

/// Value whose `Clone` panics once after [`arm`](Fragile::arm).
#[derive(Debug)]
struct Fragile {
    value: u32,
    armed: Arc<AtomicBool>,
}

impl Fragile {
    fn new(value: u32, armed: &Arc<AtomicBool>) -> Self {
        Self {
            value,
            armed: Arc::clone(armed),
        }
    }
}

impl Clone for Fragile {
    fn clone(&self) -> Self {
        assert!(!self.armed.swap(false, Ordering::SeqCst), "clone failed");
        Self {
            value: self.value,
            armed: Arc::clone(&self.armed),
        }
    }
}
