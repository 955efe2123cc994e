/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! A simple, volatile, in-memory implementation of [`KVStore`].
//!
//! The map lives behind an `Arc` that writers copy on write. Taking a snapshot only clones the `Arc`,
//! so a snapshot keeps seeing the map exactly as it was, no matter what is written afterwards.

use std::{
    collections::{BTreeMap, HashSet},
    ops::Bound,
    sync::Arc,
};

use parking_lot::RwLock;

use super::pluggables::{KVEntries, KVGet, KVIter, KVStore, KVStoreError, WriteBatch};

type Map = BTreeMap<Vec<u8>, Vec<u8>>;

/// An in-memory implementation of [`KVStore`].
#[derive(Clone, Default)]
pub struct MemDB(Arc<RwLock<Arc<Map>>>);

impl MemDB {
    /// Create a new, empty `MemDB`.
    pub fn new() -> MemDB {
        MemDB::default()
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }
}

impl KVStore for MemDB {
    type WriteBatch = MemWriteBatch;
    type Snapshot<'a> = MemDBSnapshot;

    fn write(&self, wb: Self::WriteBatch) -> Result<(), KVStoreError> {
        let mut guard = self.0.write();
        let map = Arc::make_mut(&mut *guard);
        for key in wb.deletions {
            map.remove(&key);
        }
        for (key, value) in wb.insertions {
            map.insert(key, value);
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), KVStoreError> {
        *self.0.write() = Arc::new(Map::new());
        Ok(())
    }

    fn snapshot<'b>(&'b self) -> MemDBSnapshot {
        MemDBSnapshot(Arc::clone(&*self.0.read()))
    }
}

impl KVGet for MemDB {
    fn try_get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        Ok(self.0.read().get(key).cloned())
    }
}

impl KVIter for MemDB {
    fn try_iter_from<'a>(&'a self, start: &[u8]) -> KVEntries<'a> {
        Box::new(RangeIter::new(Arc::clone(&*self.0.read()), start).map(Ok::<_, KVStoreError>))
    }
}

/// A simple implementation of [`WriteBatch`].
///
/// Setting a key cancels an earlier deletion of the same key in the batch, and vice versa.
#[derive(Default)]
pub struct MemWriteBatch {
    insertions: BTreeMap<Vec<u8>, Vec<u8>>,
    deletions: HashSet<Vec<u8>>,
}

impl WriteBatch for MemWriteBatch {
    fn new() -> Self {
        MemWriteBatch::default()
    }

    fn set(&mut self, key: &[u8], value: &[u8]) {
        let _ = self.deletions.remove(key);
        self.insertions.insert(key.to_vec(), value.to_vec());
    }

    fn delete(&mut self, key: &[u8]) {
        let _ = self.insertions.remove(key);
        self.deletions.insert(key.to_vec());
    }
}

/// A point-in-time view of a [`MemDB`], used as `KVStore::Snapshot` for `MemDB`.
pub struct MemDBSnapshot(Arc<Map>);

impl KVGet for MemDBSnapshot {
    fn try_get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        Ok(self.0.get(key).cloned())
    }
}

impl KVIter for MemDBSnapshot {
    fn try_iter_from<'a>(&'a self, start: &[u8]) -> KVEntries<'a> {
        Box::new(
            self.0
                .range::<[u8], _>((Bound::Included(start), Bound::Unbounded))
                .map(|(key, value)| Ok::<_, KVStoreError>((key.clone(), value.clone()))),
        )
    }
}

/// Lazy iterator that owns the map version it walks over, so that it does not keep the store
/// locked between steps.
struct RangeIter {
    map: Arc<Map>,
    next: Bound<Vec<u8>>,
}

impl RangeIter {
    fn new(map: Arc<Map>, start: &[u8]) -> RangeIter {
        RangeIter {
            map,
            next: Bound::Included(start.to_vec()),
        }
    }
}

impl Iterator for RangeIter {
    type Item = (Vec<u8>, Vec<u8>);

    fn next(&mut self) -> Option<Self::Item> {
        let (key, value) = self
            .map
            .range::<Vec<u8>, _>((self.next.as_ref(), Bound::Unbounded))
            .next()
            .map(|(key, value)| (key.clone(), value.clone()))?;
        self.next = Bound::Excluded(key.clone());
        Some((key, value))
    }
}
