//! Sliding-expiry concurrent cache.

use std::hash::Hash;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Default time an entry survives after its last access.
pub const DEFAULT_TTL: Duration = Duration::from_secs(15 * 60);

#[derive(Debug)]
struct Entry<V> {
    value: V,
    last_access: Instant,
}

/// A concurrent map whose entries expire a fixed duration after their last
/// access.
///
/// `get` never returns an expired entry. Expired entries are otherwise
/// dropped opportunistically: an insert sweeps the whole map at most once
/// per expiry period. Eviction bounds memory; it is not a correctness
/// mechanism, so sweep cadence is deliberately coarse.
#[derive(Debug)]
pub struct TimedCache<K: Eq + Hash, V> {
    entries: DashMap<K, Entry<V>>,
    ttl: Duration,
    last_sweep: Mutex<Instant>,
}

impl<K: Eq + Hash + Clone, V: Clone> TimedCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            last_sweep: Mutex::new(Instant::now()),
        }
    }

    /// Look up a value, refreshing its expiry on hit.
    pub fn get(&self, key: &K) -> Option<V> {
        {
            let mut entry = self.entries.get_mut(key)?;
            if entry.last_access.elapsed() < self.ttl {
                entry.last_access = Instant::now();
                return Some(entry.value.clone());
            }
        }
        // Expired; drop it now rather than waiting for a sweep.
        self.entries.remove(key);
        None
    }

    pub fn insert(&self, key: K, value: V) {
        self.maybe_sweep();
        self.entries.insert(
            key,
            Entry {
                value,
                last_access: Instant::now(),
            },
        );
    }

    pub fn invalidate(&self, key: &K) {
        self.entries.remove(key);
    }

    pub fn invalidate_all(&self) {
        self.entries.clear();
    }

    /// Snapshot of the live keys.
    pub fn keys(&self) -> Vec<K> {
        self.entries
            .iter()
            .filter(|entry| entry.last_access.elapsed() < self.ttl)
            .map(|entry| entry.key().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn maybe_sweep(&self) {
        let due = {
            let Ok(mut last_sweep) = self.last_sweep.lock() else {
                return;
            };
            if last_sweep.elapsed() < self.ttl {
                false
            } else {
                *last_sweep = Instant::now();
                true
            }
        };
        if due {
            self.entries
                .retain(|_, entry| entry.last_access.elapsed() < self.ttl);
        }
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Default for TimedCache<K, V> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
