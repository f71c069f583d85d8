//! Concurrent writers, readers and tick firing.

use std::thread;

use super::{manual, manual_with};
use crate::Config;

#[test]
fn concurrent_writers_all_applied() {
    let (map, ticker) = manual_with(Config::default().with_batch_size(64));
    thread::scope(|s| {
        for t in 0..4_u32 {
            let map = &map;
            s.spawn(move || {
                for i in 1..=250 {
                    map.add(t * 1000 + i, t).unwrap();
                }
            });
        }
    });
    assert_eq!(map.pending(), 1000);

    while map.pending() > 0 {
        ticker.fire();
    }
    assert_eq!(map.len(), 1000);
    for t in 0..4_u32 {
        assert_eq!(map.try_get(&(t * 1000 + 1)), Some(t));
    }
}

#[test]
fn concurrent_fires_apply_each_request_once() {
    let (map, ticker) = manual_with(Config::default().with_batch_size(7));
    for key in 1..=500_u32 {
        map.try_add_with(key, 1_u32, |_, existing, incoming| existing + incoming)
            .unwrap();
    }
    // Every key is new, so a second application would show up as 2.
    for key in 1..=500_u32 {
        map.try_add_with(key, 1, |_, existing, incoming| existing + incoming)
            .unwrap();
    }

    thread::scope(|s| {
        for _ in 0..4 {
            let ticker = ticker.clone();
            let map = &map;
            s.spawn(move || {
                while map.pending() > 0 {
                    ticker.fire();
                }
            });
        }
    });

    assert_eq!(map.len(), 500);
    assert!(map.values().into_iter().all(|v| v == 2));
}

#[test]
fn readers_see_consistent_snapshots() {
    let (map, ticker) = manual();
    thread::scope(|s| {
        let map = &map;
        s.spawn(move || {
            for round in 1..=200_u32 {
                map.clear().unwrap();
                for key in 1..=10_u32 {
                    map.add(key, round).unwrap();
                }
                ticker.fire();
            }
        });
        for _ in 0..2 {
            s.spawn(move || {
                for _ in 0..2000 {
                    let snapshot = map.snapshot();
                    let mut values = snapshot.values();
                    if let Some(first) = values.next() {
                        // One pass applies a whole round: clear plus ten adds.
                        assert_eq!(snapshot.len(), 10);
                        assert!(values.all(|v| v == first));
                    }
                }
            });
        }
    });
    assert_eq!(map.try_get(&1), Some(200));
}
