//! Fixed-capacity, insertion-ordered map.
//!
//! # Overview
//!
//! [`BoundedCache`] keeps at most `capacity` entries. When a [`put`](BoundedCache::put)
//! arrives while the cache is full, the oldest inserted entry is evicted before
//! the new pair is stored. Eviction follows insertion order only: lookups and
//! overwrites never move an entry.
//!
//! # Example
//!
//! ```
//! use wallstash::cache::BoundedCache;
//!
//! let mut cache = BoundedCache::new(2);
//! cache.put("a", 1);
//! cache.put("b", 2);
//! cache.put("c", 3);
//!
//! assert!(!cache.contains_key(&"a"));
//! assert_eq!(cache.get(&"b"), Some(&2));
//! assert_eq!(cache.get(&"c"), Some(&3));
//! ```

use std::borrow::Borrow;
use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

use super::CacheError;

/// Map with a fixed maximum size and oldest-first eviction.
///
/// # Thread Safety
///
/// `BoundedCache` is NOT thread-safe. Wrap it in a `Mutex` (as
/// [`PhotoCache`](super::PhotoCache) does) when sharing across threads.
#[derive(Debug, Clone)]
pub struct BoundedCache<K, V> {
    /// Stored values
    entries: HashMap<K, V>,
    /// Keys in insertion order, oldest at the front
    order: VecDeque<K>,
    /// Maximum number of entries
    capacity: usize,
}

impl<K, V> BoundedCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Create a cache holding at most `capacity` entries.
    ///
    /// A capacity of zero is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Insert a pair, evicting the oldest entry first when the cache is full.
    ///
    /// The capacity check happens before the key is looked up, so re-putting a
    /// key that is already present into a full cache still evicts the oldest
    /// entry. If the evicted entry is the key itself, it is re-inserted as the
    /// newest entry and `None` is returned.
    ///
    /// # Returns
    ///
    /// The value previously stored under `key`, if it survived eviction.
    pub fn put(&mut self, key: K, value: V) -> Option<V> {
        if self.entries.len() >= self.capacity {
            self.evict_oldest();
        }

        let previous = self.entries.insert(key.clone(), value);
        if previous.is_none() {
            self.order.push_back(key);
        }
        previous
    }

    /// Insert every pair of `batch`, or nothing at all.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::OversizedBatch`] without touching the cache when
    /// the batch holds more pairs than the capacity.
    pub fn put_all<I>(&mut self, batch: I) -> Result<(), CacheError>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let batch: Vec<(K, V)> = batch.into_iter().collect();
        if batch.len() > self.capacity {
            log::error!(
                "Refusing batch insert of {} entries into cache of capacity {}",
                batch.len(),
                self.capacity
            );
            return Err(CacheError::OversizedBatch {
                batch: batch.len(),
                capacity: self.capacity,
            });
        }

        for (key, value) in batch {
            self.put(key, value);
        }
        Ok(())
    }

    /// Look up a value without affecting eviction order.
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key)
    }

    /// Check whether `key` is cached.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains_key(key)
    }

    /// Remove a single entry.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let removed = self.entries.remove(key)?;
        self.order.retain(|k| <K as Borrow<Q>>::borrow(k) != key);
        Some(removed)
    }

    /// Drop every entry. Capacity is unchanged.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Keys from oldest to newest.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.order.iter()
    }

    fn evict_oldest(&mut self) {
        if let Some(oldest) = self.order.pop_front() {
            self.entries.remove(&oldest);
            log::trace!("Evicted oldest cache entry");
        }
    }
}
