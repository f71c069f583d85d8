//! Disposal: idempotent, stops ticks, drops queued requests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use super::{Fragile, manual};
use crate::{Config, Error, EventualMap};

#[test]
fn dispose_is_idempotent() {
    let (map, _ticker) = manual::<u32, u32>();
    assert!(!map.is_disposed());
    map.dispose();
    map.dispose();
    assert!(map.is_disposed());
}

#[test]
fn dispose_discards_queued_requests() {
    let (map, ticker) = manual();
    map.add(1, 1).unwrap();
    ticker.fire();
    map.add(2, 2).unwrap();
    map.add(3, 3).unwrap();

    map.dispose();
    assert_eq!(map.pending(), 0);
    // Scheduler stopped: the handler is gone.
    assert!(!ticker.fire());
    assert_eq!(map.len(), 1);
    assert!(!map.contains_key(&2));
}

#[test]
fn reads_survive_disposal() {
    let (map, ticker) = manual();
    map.add(1, "a").unwrap();
    ticker.fire();
    map.dispose();
    assert_eq!(map.get(&1).unwrap(), "a");
    assert_eq!(map.keys(), vec![1]);
}

#[test]
fn writes_after_disposal_are_refused() {
    let (map, _ticker) = manual::<u32, u32>();
    map.dispose();
    assert!(matches!(map.add(1, 1), Err(Error::Disposed)));
    assert!(matches!(map.try_add_with(1, 1, |_, _, v| v), Err(Error::Disposed)));
    assert!(matches!(map.clear(), Err(Error::Disposed)));
    assert!(!map.remove(&1));
    assert_eq!(map.pending(), 0);
}

#[test]
fn drop_stops_ticker() {
    let (map, ticker) = manual::<u32, u32>();
    map.add(1, 1).unwrap();
    drop(map);
    assert!(!ticker.fire());
}

#[test]
fn drop_joins_interval_thread() {
    let config = Config::default().with_interval(Duration::from_millis(1));
    let map = EventualMap::with_config(config).unwrap();
    map.add(1_u32, 1_u32).unwrap();
    std::thread::sleep(Duration::from_millis(20));
    // Must return: the tick thread exits on shutdown.
    drop(map);
}

#[test]
fn interval_dispose_stops_applying() {
    let config = Config::default().with_interval(Duration::from_millis(5));
    let map = EventualMap::with_config(config).unwrap();
    map.dispose();
    assert!(matches!(map.add(1_u32, 1_u32), Err(Error::Disposed)));
    std::thread::sleep(Duration::from_millis(30));
    assert!(map.is_empty());
}

#[test]
fn interval_map_survives_panicking_publication() {
    let armed = Arc::new(AtomicBool::new(false));
    let config = Config::default().with_interval(Duration::from_millis(5));
    let map = EventualMap::with_config(config).unwrap();

    map.add(1_u32, Fragile::new(1, &armed)).unwrap();
    let deadline = Instant::now() + Duration::from_secs(5);
    while !map.contains_key(&1) && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(1));
    }
    assert!(map.contains_key(&1));

    armed.store(true, Ordering::SeqCst);
    map.add(2, Fragile::new(2, &armed)).unwrap();
    map.add(3, Fragile::new(3, &armed)).unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while !(map.contains_key(&2) && map.contains_key(&3)) && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(1));
    }
    assert!(map.contains_key(&2));
    assert!(map.contains_key(&3));
    assert_eq!(map.pending(), 0);
    assert!(!map.is_disposed());
}

#[test]
fn writes_racing_dispose_leave_nothing_queued() {
    for _ in 0..50 {
        let (map, _ticker) = manual::<u32, u32>();
        thread::scope(|s| {
            for t in 0..4_u32 {
                let map = &map;
                s.spawn(move || {
                    for i in 1..=200 {
                        if map.add(t * 1000 + i, i).is_err() {
                            break;
                        }
                    }
                });
            }
            map.dispose();
        });
        assert_eq!(map.pending(), 0);
    }
}
