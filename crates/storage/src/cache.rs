//! Generic LRU cache table fronting database lookups.

use std::{hash::Hash, num::NonZeroUsize};

use lru::LruCache;
use parking_lot::Mutex;
use stela_db::{DbError, DbResult};

use crate::exec::DbRecv;

/// Wrapper around an LRU cache.  Writers purge the affected keys; readers
/// fall through to the database and fill the cache on a miss.
pub struct CacheTable<K, V> {
    cache: Mutex<LruCache<K, V>>,
}

impl<K: Eq + Hash + Clone, V: Clone> CacheTable<K, V> {
    /// Creates a new cache with the given capacity.
    pub fn new(size: NonZeroUsize) -> Self {
        Self {
            cache: Mutex::new(LruCache::new(size)),
        }
    }

    /// Removes an entry, typically because it was just rewritten.
    pub fn purge_blocking(&self, key: &K) {
        self.cache.lock().pop(key);
    }

    /// Removes an entry, typically because it was just rewritten.
    pub async fn purge_async(&self, key: &K) {
        self.cache.lock().pop(key);
    }

    /// Removes every entry whose key matches the predicate.
    pub fn purge_if_blocking(&self, mut pred: impl FnMut(&K) -> bool) {
        let mut cache = self.cache.lock();
        let keys = cache
            .iter()
            .filter(|(k, _)| pred(k))
            .map(|(k, _)| k.clone())
            .collect::<Vec<_>>();
        for key in keys {
            cache.pop(&key);
        }
    }

    /// Removes every entry whose key matches the predicate.
    pub async fn purge_if_async(&self, pred: impl FnMut(&K) -> bool) {
        self.purge_if_blocking(pred);
    }

    /// Drops everything.
    pub fn blocking_clear(&self) {
        self.cache.lock().clear();
    }

    /// Returns the cached value or fetches it in place.
    pub fn get_or_fetch_blocking(
        &self,
        key: &K,
        fetch: impl FnOnce() -> DbResult<V>,
    ) -> DbResult<V> {
        if let Some(value) = self.cache.lock().get(key) {
            return Ok(value.clone());
        }

        let value = fetch()?;
        self.cache.lock().put(key.clone(), value.clone());
        Ok(value)
    }

    /// Returns the cached value or awaits the fetch handle for it.
    pub async fn get_or_fetch(&self, key: &K, fetch: impl FnOnce() -> DbRecv<V>) -> DbResult<V> {
        if let Some(value) = self.cache.lock().get(key) {
            return Ok(value.clone());
        }

        let value = match fetch().await {
            Ok(res) => res?,
            Err(_) => return Err(DbError::CacheLoadFail),
        };
        self.cache.lock().put(key.clone(), value.clone());
        Ok(value)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.cache.lock().len()
    }
}
