use std::collections::{BTreeMap, HashMap};

use alice_sh_common::StateValue;
use parking_lot::Mutex;

pub const DEFAULT_CAPACITY: usize = 10_000;

/// Keyed store of last committed values, shared by every device in the process.
///
/// Best-effort continuity only; the remote platform and the registries are the source of
/// truth.
pub trait StateCache: Send + Sync {
    fn get(&self, key: &str) -> Option<StateValue>;
    fn set(&self, key: &str, value: StateValue);
    fn delete(&self, key: &str);
    fn clear(&self);
}

/// In-memory least-recently-used cache.
pub struct MemoryCache {
    inner: Mutex<Lru>,
}

struct Lru {
    capacity: usize,
    tick: u64,
    entries: HashMap<String, (StateValue, u64)>,
    // tick -> key, oldest first
    recency: BTreeMap<u64, String>,
}

impl Lru {
    fn touch(&mut self, key: &str) -> Option<&StateValue> {
        self.tick += 1;
        let tick = self.tick;

        let (value, last_used) = self.entries.get_mut(key)?;
        self.recency.remove(&*last_used);
        self.recency.insert(tick, key.to_owned());
        *last_used = tick;

        Some(&*value)
    }

    fn evict_oldest(&mut self) {
        if let Some((_, key)) = self.recency.pop_first() {
            tracing::trace!(%key, "Evicting least recently used cache entry");
            self.entries.remove(&key);
        }
    }
}

impl MemoryCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Lru {
                capacity: capacity.max(1),
                tick: 0,
                entries: HashMap::new(),
                recency: BTreeMap::new(),
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl StateCache for MemoryCache {
    fn get(&self, key: &str) -> Option<StateValue> {
        self.inner.lock().touch(key).cloned()
    }

    fn set(&self, key: &str, value: StateValue) {
        let mut lru = self.inner.lock();

        if lru.touch(key).is_some() {
            if let Some((slot, _)) = lru.entries.get_mut(key) {
                *slot = value;
            }
            return;
        }

        while lru.entries.len() >= lru.capacity {
            lru.evict_oldest();
        }

        lru.tick += 1;
        let tick = lru.tick;
        lru.entries.insert(key.to_owned(), (value, tick));
        lru.recency.insert(tick, key.to_owned());
    }

    fn delete(&self, key: &str) {
        let mut lru = self.inner.lock();
        if let Some((_, tick)) = lru.entries.remove(key) {
            lru.recency.remove(&tick);
        }
    }

    fn clear(&self) {
        let mut lru = self.inner.lock();
        lru.entries.clear();
        lru.recency.clear();
    }
}
