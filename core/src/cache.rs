// Short-TTL key-value cache
//
// Advisory by contract: a lookup can only hit or miss, never fail. Entries
// age out on read; a capacity bound keeps the map from growing without limit.

use dashmap::DashMap;
use std::time::{Duration, Instant};

#[derive(Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

pub struct TtlCache<V: Clone> {
    entries: DashMap<String, CacheEntry<V>>,
    capacity: usize,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Look up a key, evicting it if its TTL has elapsed
    pub fn get(&self, key: &str) -> Option<V> {
        let expired = match self.entries.get(key) {
            Some(entry) => {
                if entry.expires_at > Instant::now() {
                    return Some(entry.value.clone());
                }
                true
            }
            None => false,
        };
        if expired {
            self.entries.remove(key);
        }
        None
    }

    pub fn put(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.make_room();
        }
        self.entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // Purge expired entries; if the map is still full, drop the entry closest
    // to expiry so fresh data always finds a slot
    fn make_room(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.expires_at > now);
        if self.entries.len() < self.capacity {
            return;
        }
        let soonest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.expires_at)
            .map(|entry| entry.key().clone());
        if let Some(key) = soonest {
            self.entries.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_within_ttl() {
        let cache: TtlCache<String> = TtlCache::new(8);
        cache.put("k", "v".to_string(), Duration::from_secs(60));
        assert_eq!(cache.get("k"), Some("v".to_string()));
    }

    #[test]
    fn miss_after_expiry() {
        let cache: TtlCache<u32> = TtlCache::new(8);
        cache.put("k", 1, Duration::from_millis(10));
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty(), "expired entry should be evicted on read");
    }

    #[test]
    fn capacity_is_bounded() {
        let cache: TtlCache<u32> = TtlCache::new(4);
        for i in 0..32 {
            cache.put(format!("k{i}"), i, Duration::from_secs(60));
        }
        assert!(cache.len() <= 4);
        // The most recent insert always survives
        assert_eq!(cache.get("k31"), Some(31));
    }

    #[test]
    fn overwrite_refreshes_value() {
        let cache: TtlCache<u32> = TtlCache::new(4);
        cache.put("k", 1, Duration::from_secs(60));
        cache.put("k", 2, Duration::from_secs(60));
        assert_eq!(cache.get("k"), Some(2));
        assert_eq!(cache.len(), 1);
    }
}
