use std::{
    collections::HashMap,
    hash::Hash,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use crate::store::clock::Clock;

/// Longest lifetime an entry can get; larger TTLs are clamped to it.
pub const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Bounded in-memory map whose entries disappear `ttl` after their last `set`.
///
/// Expiry is lazy on `get` and eager on `set`/`snapshot`. When a `set` pushes
/// the map over `capacity`, the soonest-expiring entries are evicted first.
/// Every operation runs under one lock, so a single key is linearizable.
/// The TTL is capped at [`MAX_TTL`].
pub struct ExpiringStore<K, V> {
    ttl: Duration,
    capacity: usize,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
}

impl<K, V> ExpiringStore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration, capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl: ttl.min(MAX_TTL),
            capacity: capacity.max(1),
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn set(&self, key: K, value: V) {
        let now = self.clock.now();
        let mut entries = self.lock();
        entries.insert(
            key.clone(),
            CacheEntry {
                value,
                expires_at: self.expiry_from(now),
            },
        );
        self.prune_locked(&mut entries, now, Some(&key));
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Applies `mutate` to a live entry and restarts its TTL, all under the
    /// store lock. Returns the updated value, or `None` when the key is absent
    /// or expired.
    pub fn update<F>(&self, key: &K, mutate: F) -> Option<V>
    where
        F: FnOnce(&mut V),
    {
        let now = self.clock.now();
        let mut entries = self.lock();
        let live = entries.get(key).map(|entry| entry.is_live(now))?;
        if !live {
            entries.remove(key);
            return None;
        }

        let entry = entries.get_mut(key)?;
        let mut value = entry.value.clone();
        mutate(&mut value);
        entry.value = value.clone();
        entry.expires_at = self.expiry_from(now);
        Some(value)
    }

    pub fn snapshot(&self) -> HashMap<K, V> {
        let now = self.clock.now();
        let mut entries = self.lock();
        self.prune_locked(&mut entries, now, None);
        entries
            .iter()
            .map(|(key, entry)| (key.clone(), entry.value.clone()))
            .collect()
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn expiry_from(&self, now: Instant) -> Instant {
        now.checked_add(self.ttl)
            .or_else(|| now.checked_add(Duration::from_secs(u32::MAX.into())))
            .unwrap_or(now)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, CacheEntry<V>>> {
        // Writes are whole-entry replacements, so a poisoned map is still consistent.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn prune_locked(
        &self,
        entries: &mut HashMap<K, CacheEntry<V>>,
        now: Instant,
        keep: Option<&K>,
    ) {
        entries.retain(|_, entry| entry.is_live(now));

        if entries.len() <= self.capacity {
            return;
        }

        let overflow = entries.len() - self.capacity;
        let mut by_expiry: Vec<(Instant, K)> = entries
            .iter()
            .filter(|(key, _)| keep != Some(*key))
            .map(|(key, entry)| (entry.expires_at, key.clone()))
            .collect();
        by_expiry.sort_by(|left, right| left.0.cmp(&right.0));

        for (_, key) in by_expiry.into_iter().take(overflow) {
            entries.remove(&key);
        }
    }
}
