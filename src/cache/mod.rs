//! Bounded insertion-ordered dedup cache.
//!
//! Tracks the newest `capacity` distinct key/value pairs seen in the feed.
//! A plain map would recognize duplicates too, but it grows without bound
//! over the life of the process; this cache bounds memory by evicting the
//! oldest-inserted key once full.
//!
//! # Eviction
//!
//! Eviction is strict FIFO on insertion order. Reads never refresh a key's
//! position, and re-inserting a resident key is a no-op. This is what makes
//! `put` usable as the "is this truly new" decision: a `true` return means
//! the key was not among the most recent `capacity` distinct keys.
//!
//! # Sizing
//!
//! The feed returns an overlapping sliding window of recent items on every
//! poll, and items are occasionally removed upstream, which makes older
//! items re-enter the window. Size the cache larger than one page (the
//! configured multiplier defaults to 2x) so a re-appearing item still hits
//! a resident key instead of being reported as new.

use crate::{Error, Result};
use std::collections::{HashMap, VecDeque};
use std::fmt::Display;
use std::hash::Hash;

/// Fixed-capacity map from key to value with FIFO eviction.
#[derive(Debug)]
pub struct BoundedDedupCache<K, V> {
    map: HashMap<K, V>,
    /// Keys in insertion order; front is the eviction candidate.
    order: VecDeque<K>,
    capacity: usize,
}

impl<K, V> BoundedDedupCache<K, V>
where
    K: Eq + Hash + Clone + Display,
{
    /// Creates a cache holding at most `capacity` entries.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be > 0");
        Self {
            map: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Inserts a key/value pair if the key is not already resident.
    ///
    /// Returns `true` when the key was inserted (it is genuinely new within
    /// the dedup window), evicting the oldest-inserted key first when the
    /// cache is full. Returns `false` without mutating anything when the key
    /// is already resident: the stored value is kept and the key's eviction
    /// position is not refreshed.
    pub fn put(&mut self, key: K, value: V) -> bool {
        if self.map.contains_key(&key) {
            return false;
        }
        if self.order.len() == self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.map.remove(&oldest);
            }
        }
        self.order.push_back(key.clone());
        self.map.insert(key, value);
        true
    }

    /// Looks up the value for a resident key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] if the key is not resident. Callers
    /// only look up keys they just received a `true` from [`put`](Self::put)
    /// on, so this error signals a bookkeeping defect, not a normal miss.
    pub fn get(&self, key: &K) -> Result<&V> {
        self.map
            .get(key)
            .ok_or_else(|| Error::KeyNotFound(key.to_string()))
    }

    /// Returns whether a key is resident.
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Number of resident entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns true if no entries are resident.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// The fixed capacity this cache was created with.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_cache() -> BoundedDedupCache<String, u32> {
        let mut cache = BoundedDedupCache::new(3);
        assert!(cache.put("a".to_string(), 1));
        assert!(cache.put("b".to_string(), 2));
        assert!(cache.put("c".to_string(), 3));
        cache
    }

    #[test]
    fn test_put_and_get() {
        let cache = filled_cache();
        assert_eq!(cache.len(), 3);
        assert_eq!(*cache.get(&"a".to_string()).unwrap(), 1);
        assert_eq!(*cache.get(&"b".to_string()).unwrap(), 2);
        assert_eq!(*cache.get(&"c".to_string()).unwrap(), 3);
    }

    #[test]
    fn test_capacity_never_exceeded() {
        let mut cache = BoundedDedupCache::new(3);
        for i in 0..20 {
            cache.put(format!("key{i}"), i);
            assert!(cache.len() <= 3);
        }
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_fifo_eviction_oldest_first() {
        let mut cache = filled_cache();
        assert!(cache.put("d".to_string(), 4));

        // "a" was inserted first, so it is the one evicted.
        assert!(matches!(
            cache.get(&"a".to_string()),
            Err(Error::KeyNotFound(_))
        ));
        assert_eq!(*cache.get(&"b".to_string()).unwrap(), 2);
        assert_eq!(*cache.get(&"c".to_string()).unwrap(), 3);
        assert_eq!(*cache.get(&"d".to_string()).unwrap(), 4);
    }

    #[test]
    fn test_get_does_not_refresh_eviction_order() {
        let mut cache = filled_cache();

        // Read "a" repeatedly; FIFO order must be unaffected.
        for _ in 0..5 {
            let _ = cache.get(&"a".to_string()).unwrap();
        }
        assert!(cache.put("d".to_string(), 4));
        assert!(cache.get(&"a".to_string()).is_err());
    }

    #[test]
    fn test_repeat_put_is_noop() {
        let mut cache = BoundedDedupCache::new(3);
        assert!(cache.put("a".to_string(), 1));
        assert!(!cache.put("a".to_string(), 99));

        // Value is not overwritten.
        assert_eq!(*cache.get(&"a".to_string()).unwrap(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_repeat_put_does_not_refresh_position() {
        let mut cache = filled_cache();

        // Re-putting "a" must not move it to the back of the queue.
        assert!(!cache.put("a".to_string(), 1));
        assert!(cache.put("d".to_string(), 4));
        assert!(cache.get(&"a".to_string()).is_err());
        assert!(cache.get(&"b".to_string()).is_ok());
    }

    #[test]
    fn test_full_turnover() {
        let mut cache = filled_cache();
        for (k, v) in [("d", 4), ("e", 5), ("f", 6)] {
            assert!(cache.put(k.to_string(), v));
        }
        for k in ["a", "b", "c"] {
            assert!(cache.get(&k.to_string()).is_err());
        }
        for (k, v) in [("d", 4), ("e", 5), ("f", 6)] {
            assert_eq!(*cache.get(&k.to_string()).unwrap(), v);
        }
    }

    #[test]
    fn test_reinsert_full_cache_changes_nothing() {
        let mut cache = filled_cache();
        for (k, v) in [("a", 1), ("b", 2), ("c", 3)] {
            assert!(!cache.put(k.to_string(), v));
        }
        assert_eq!(cache.len(), 3);
        for (k, v) in [("a", 1), ("b", 2), ("c", 3)] {
            assert_eq!(*cache.get(&k.to_string()).unwrap(), v);
        }
    }

    #[test]
    fn test_evicted_key_can_be_readmitted() {
        let mut cache = filled_cache();
        assert!(cache.put("d".to_string(), 4));
        // "a" was evicted; putting it again counts as new.
        assert!(cache.put("a".to_string(), 10));
        assert_eq!(*cache.get(&"a".to_string()).unwrap(), 10);
    }

    #[test]
    fn test_contains() {
        let cache = filled_cache();
        assert!(cache.contains(&"a".to_string()));
        assert!(!cache.contains(&"z".to_string()));
    }

    #[test]
    fn test_key_not_found_names_key() {
        let cache: BoundedDedupCache<String, u32> = BoundedDedupCache::new(1);
        let err = cache.get(&"missing".to_string()).unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    #[should_panic(expected = "capacity must be > 0")]
    fn test_zero_capacity_panics() {
        let _cache: BoundedDedupCache<String, u32> = BoundedDedupCache::new(0);
    }
}
