use std::{sync::Arc, thread, time::Duration};

use agri_advisory::store::{ExpiringStore, ManualClock};

fn store(ttl_secs: u64, capacity: usize) -> (Arc<ManualClock>, ExpiringStore<String, u32>) {
    let clock = Arc::new(ManualClock::new());
    let store = ExpiringStore::new(Duration::from_secs(ttl_secs), capacity, clock.clone());
    (clock, store)
}

#[test]
fn given_entry_within_ttl_when_get_then_value_is_returned() {
    let (clock, store) = store(60, 10);
    store.set("k".to_string(), 7);

    clock.advance(Duration::from_secs(59));

    assert_eq!(store.get(&"k".to_string()), Some(7));
}

#[test]
fn given_entry_at_exact_ttl_when_get_then_entry_is_gone_and_removed() {
    let (clock, store) = store(60, 10);
    store.set("k".to_string(), 7);

    clock.advance(Duration::from_secs(60));

    assert_eq!(store.get(&"k".to_string()), None);
    assert_eq!(store.len(), 0);
}

#[test]
fn given_missing_key_when_get_then_none() {
    let (_clock, store) = store(60, 10);
    assert_eq!(store.get(&"absent".to_string()), None);
}

#[test]
fn given_key_set_again_when_ttl_of_first_set_passes_then_value_is_still_live() {
    let (clock, store) = store(60, 10);
    store.set("k".to_string(), 1);
    clock.advance(Duration::from_secs(40));
    store.set("k".to_string(), 2);

    clock.advance(Duration::from_secs(40));

    assert_eq!(store.get(&"k".to_string()), Some(2));
}

#[test]
fn given_many_sets_when_capacity_is_exceeded_then_size_never_passes_capacity() {
    let (clock, store) = store(600, 3);
    for index in 0..10 {
        store.set(format!("k{index}"), index);
        clock.advance(Duration::from_millis(10));
        assert!(store.len() <= 3, "len {} after set {}", store.len(), index);
    }
}

#[test]
fn given_full_store_when_new_key_is_set_then_soonest_expiring_entry_is_evicted() {
    let (clock, store) = store(100, 2);
    store.set("a".to_string(), 1);
    clock.advance(Duration::from_secs(1));
    store.set("b".to_string(), 2);
    clock.advance(Duration::from_secs(1));
    // Refreshing "a" makes "b" the soonest to expire.
    store.set("a".to_string(), 10);
    clock.advance(Duration::from_secs(1));

    store.set("c".to_string(), 3);

    assert_eq!(store.get(&"a".to_string()), Some(10));
    assert_eq!(store.get(&"b".to_string()), None);
    assert_eq!(store.get(&"c".to_string()), Some(3));
}

#[test]
fn given_expired_entries_when_snapshot_then_only_live_entries_are_listed() {
    let (clock, store) = store(10, 10);
    store.set("old".to_string(), 1);
    clock.advance(Duration::from_secs(5));
    store.set("new".to_string(), 2);
    clock.advance(Duration::from_secs(6));

    let snapshot = store.snapshot();

    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot.get("new"), Some(&2));
}

#[test]
fn given_live_entry_when_update_then_value_changes_and_ttl_restarts() {
    let (clock, store) = store(60, 10);
    store.set("k".to_string(), 1);
    clock.advance(Duration::from_secs(50));

    let updated = store.update(&"k".to_string(), |value| *value += 1);
    clock.advance(Duration::from_secs(50));

    assert_eq!(updated, Some(2));
    assert_eq!(store.get(&"k".to_string()), Some(2));
}

#[test]
fn given_expired_entry_when_update_then_nothing_is_written() {
    let (clock, store) = store(60, 10);
    store.set("k".to_string(), 1);
    clock.advance(Duration::from_secs(61));

    assert_eq!(store.update(&"k".to_string(), |value| *value = 99), None);
    assert_eq!(store.get(&"k".to_string()), None);
}

#[test]
fn given_concurrent_writers_when_reading_then_each_key_holds_a_written_value() {
    let clock = Arc::new(ManualClock::new());
    let store = Arc::new(ExpiringStore::new(Duration::from_secs(60), 1_000, clock));

    let handles: Vec<_> = (0..8u32)
        .map(|worker| {
            let store = store.clone();
            thread::spawn(move || {
                for round in 0..100u32 {
                    let key = format!("key-{}", round % 10);
                    store.set(key.clone(), worker * 1_000 + round);
                    let seen = store.get(&key).expect("just-written key must be live");
                    assert_eq!(seen % 1_000 % 10, round % 10);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("worker should not panic");
    }

    assert_eq!(store.len(), 10);
}
