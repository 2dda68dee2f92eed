use indexmap::IndexMap;
use std::hash::Hash;

/// A fixed capacity map which evicts the least recently used entry on insert
///
/// Entries are kept in recency order: the front of the map is the oldest.
#[derive(Debug)]
pub struct LruCache<K, V> {
    entries: IndexMap<K, V>,
    capacity: usize,
    hits: u64,
    misses: u64,
}

/// Lookup counters of an [`LruCache`](struct.LruCache.html)
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl<K: Hash + Eq, V> LruCache<K, V> {
    /// Capacities below 1 are treated as 1
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: IndexMap::with_capacity(capacity),
            capacity,
            hits: 0,
            misses: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up `key`, marking it as the most recently used entry
    pub fn get(&mut self, key: &K) -> Option<&V> {
        match self.entries.shift_remove_entry(key) {
            Some((key, value)) => {
                self.hits += 1;
                let (idx, _) = self.entries.insert_full(key, value);
                self.entries.get_index(idx).map(|(_, value)| value)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Insert `value`, evicting the least recently used entry if the cache is full
    pub fn insert(&mut self, key: K, value: V) {
        self.entries.shift_remove(&key);
        if self.entries.len() >= self.capacity {
            self.entries.shift_remove_index(0);
        }
        self.entries.insert(key, value);
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_least_recently_used() {
        let mut cache = LruCache::new(2);
        cache.insert(1, "one");
        cache.insert(2, "two");
        assert_eq!(cache.get(&1), Some(&"one"));

        // 2 is now the oldest
        cache.insert(3, "three");
        assert!(cache.contains(&1));
        assert!(!cache.contains(&2));
        assert!(cache.contains(&3));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn reinsert_replaces() {
        let mut cache = LruCache::new(2);
        cache.insert(1, 10);
        cache.insert(1, 11);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&1), Some(&11));
    }

    #[test]
    fn minimum_capacity() {
        let mut cache = LruCache::new(0);
        assert_eq!(cache.capacity(), 1);
        cache.insert(1, ());
        cache.insert(2, ());
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&2));
    }

    #[test]
    fn counts_lookups() {
        let mut cache = LruCache::new(4);
        cache.insert(1, ());
        cache.get(&1);
        cache.get(&1);
        cache.get(&2);
        assert_eq!(cache.stats(), CacheStats { hits: 2, misses: 1 });
    }
}
