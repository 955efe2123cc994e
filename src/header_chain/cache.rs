/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Bounded, thread-safe least-recently-used cache.

use std::{hash::Hash, num::NonZeroUsize};

use lru::LruCache;
use parking_lot::Mutex;

/// A fixed-capacity LRU map that can be shared between threads.
///
/// Values are cloned out on `get`, so `V` should be cheap to clone (e.g., an `Arc`, or a small `Copy`
/// type).
pub(crate) struct Cache<K: Hash + Eq, V: Clone> {
    inner: Mutex<LruCache<K, V>>,
}

impl<K: Hash + Eq, V: Clone> Cache<K, V> {
    /// Create a cache that holds at most `capacity` entries. A capacity of zero is rounded up to one.
    pub(crate) fn new(capacity: usize) -> Cache<K, V> {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Cache {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub(crate) fn get(&self, key: &K) -> Option<V> {
        self.inner.lock().get(key).cloned()
    }

    pub(crate) fn contains(&self, key: &K) -> bool {
        self.inner.lock().contains(key)
    }

    pub(crate) fn put(&self, key: K, value: V) {
        self.inner.lock().put(key, value);
    }

    pub(crate) fn remove(&self, key: &K) {
        self.inner.lock().pop(key);
    }

    pub(crate) fn clear(&self) {
        self.inner.lock().clear();
    }
}
