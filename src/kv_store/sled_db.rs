/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! A persistent implementation of [`KVStore`] backed by a [sled](https://docs.rs/sled) embedded
//! database.
//!
//! sled does not offer point-in-time snapshots. Its iterators do, however, tolerate keys being
//! inserted and deleted concurrently: every key that exists for the whole duration of an iteration
//! is returned exactly once, and deleted keys are never returned twice. That is the guarantee the
//! discovery database's expiry sweep relies on.

use std::path::Path;

use super::pluggables::{KVEntries, KVGet, KVIter, KVStore, KVStoreError, WriteBatch};

/// An on-disk implementation of [`KVStore`].
#[derive(Clone)]
pub struct SledDB(sled::Db);

impl SledDB {
    /// Open (or create) a database at `path`.
    ///
    /// The database is opened without sled's periodic background flusher. That thread holds a
    /// handle of its own, so the directory lock would outlive the last `SledDB` for up to one flush
    /// period, and reopening the same path right after dropping it would fail. Writes become
    /// durable on [`flush`](KVStore::flush), and when the last handle is dropped.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<SledDB, KVStoreError> {
        let db = sled::Config::new()
            .path(path.as_ref())
            .flush_every_ms(None)
            .open()?;
        Ok(SledDB(db))
    }

    /// Open a database that lives only in memory and is deleted when the last handle is dropped.
    pub fn temporary() -> Result<SledDB, KVStoreError> {
        Ok(SledDB(sled::Config::new().temporary(true).open()?))
    }
}

impl KVStore for SledDB {
    type WriteBatch = SledWriteBatch;
    type Snapshot<'a> = &'a SledDB;

    fn write(&self, wb: Self::WriteBatch) -> Result<(), KVStoreError> {
        Ok(self.0.apply_batch(wb.0)?)
    }

    fn clear(&self) -> Result<(), KVStoreError> {
        Ok(self.0.clear()?)
    }

    fn snapshot<'b>(&'b self) -> &'b SledDB {
        self
    }

    fn flush(&self) -> Result<(), KVStoreError> {
        self.0.flush()?;
        Ok(())
    }
}

impl KVGet for SledDB {
    fn try_get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        Ok(self.0.get(key)?.map(|ivec| ivec.to_vec()))
    }
}

impl KVIter for SledDB {
    fn try_iter_from<'a>(&'a self, start: &[u8]) -> KVEntries<'a> {
        Box::new(self.0.range(start.to_vec()..).map(into_pair))
    }

    fn try_iter_prefix<'a>(&'a self, prefix: &[u8]) -> KVEntries<'a> {
        Box::new(self.0.scan_prefix(prefix).map(into_pair))
    }
}

impl KVGet for &SledDB {
    fn try_get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        (**self).try_get(key)
    }
}

impl KVIter for &SledDB {
    fn try_iter_from<'a>(&'a self, start: &[u8]) -> KVEntries<'a> {
        (**self).try_iter_from(start)
    }

    fn try_iter_prefix<'a>(&'a self, prefix: &[u8]) -> KVEntries<'a> {
        (**self).try_iter_prefix(prefix)
    }
}

fn into_pair(
    entry: sled::Result<(sled::IVec, sled::IVec)>,
) -> Result<(Vec<u8>, Vec<u8>), KVStoreError> {
    let (key, value) = entry?;
    Ok((key.to_vec(), value.to_vec()))
}

/// Implementation of [`WriteBatch`] over [`sled::Batch`].
#[derive(Default)]
pub struct SledWriteBatch(sled::Batch);

impl WriteBatch for SledWriteBatch {
    fn new() -> Self {
        SledWriteBatch(sled::Batch::default())
    }

    fn set(&mut self, key: &[u8], value: &[u8]) {
        self.0.insert(key, value);
    }

    fn delete(&mut self, key: &[u8]) {
        self.0.remove(key);
    }
}
