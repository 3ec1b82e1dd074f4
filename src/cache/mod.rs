//! In-memory caching of full-resolution photos.
//!
//! # Architecture
//!
//! The caching layer is split into two parts:
//!
//! * [`bounded`]: [`BoundedCache`], a fixed-capacity map that evicts the
//!   oldest inserted entry on overflow. Pure data structure, no locking.
//! * [`PhotoCache`]: the shared, lock-protected cache of [`CachedPhoto`]
//!   values used by the download coordinator and by photo loads.
//!
//! # Eviction
//!
//! Entries are evicted strictly in insertion order. Reading an entry or
//! overwriting it does not extend its lifetime. The cache is never persisted.

pub mod bounded;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use bounded::BoundedCache;

use crate::model::CachedPhoto;

/// Capacity of the full-photo cache unless configured otherwise.
pub const DEFAULT_CACHE_CAPACITY: usize = 10;

/// Errors that can occur when writing to a cache.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// A batch insert held more pairs than the cache can ever contain.
    #[error("Batch of {batch} entries exceeds cache capacity of {capacity}")]
    OversizedBatch {
        /// Number of pairs in the rejected batch
        batch: usize,
        /// Capacity of the cache
        capacity: usize,
    },
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Thread-safe cache of fetched photos, keyed by photo id.
///
/// Every method takes the lock once, so each call is one critical section.
/// Values are cloned out; [`CachedPhoto`] shares its pixels through an `Arc`.
#[derive(Debug)]
pub struct PhotoCache {
    inner: Mutex<BoundedCache<String, CachedPhoto>>,
}

impl PhotoCache {
    /// Create a cache holding at most `capacity` photos.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(BoundedCache::new(capacity)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BoundedCache<String, CachedPhoto>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch a cached photo.
    #[must_use]
    pub fn get(&self, photo_id: &str) -> Option<CachedPhoto> {
        let photo = self.lock().get(photo_id).cloned();
        if photo.is_some() {
            log::trace!("Photo cache hit: {}", photo_id);
        } else {
            log::trace!("Photo cache miss: {}", photo_id);
        }
        photo
    }

    /// Check whether a photo is cached.
    #[must_use]
    pub fn contains(&self, photo_id: &str) -> bool {
        self.lock().contains_key(photo_id)
    }

    /// Cache a photo under its own id, returning any photo it replaced.
    pub fn insert(&self, photo: CachedPhoto) -> Option<CachedPhoto> {
        let key = photo.id().to_string();
        log::debug!("Caching photo {}", key);
        self.lock().put(key, photo)
    }

    /// Cache several photos at once.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::OversizedBatch`] if more photos are given than
    /// the cache can hold; nothing is inserted in that case.
    pub fn insert_all(&self, photos: Vec<CachedPhoto>) -> CacheResult<()> {
        let batch = photos
            .into_iter()
            .map(|photo| (photo.id().to_string(), photo));
        self.lock().put_all(batch)
    }

    /// Number of cached photos.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Maximum number of cached photos.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.lock().capacity()
    }

    /// Cached ids from oldest to newest.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }
}

impl Default for PhotoCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}
