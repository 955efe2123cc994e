/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Traits for pluggable persistence.

/// An ordered key-value store with atomic, batched writes.
///
/// Keys are compared as byte strings. Implementations must be safe to share between threads: the
/// header chain reads from the store while another thread writes, and the discovery database's
/// expiry thread iterates over the store while foreground callers update it.
pub trait KVStore: KVGet + KVIter + Clone + Send + Sync + 'static {
    type WriteBatch: WriteBatch;
    type Snapshot<'a>: 'a + KVGet + KVIter;

    /// Atomically apply every operation in `wb`. Either all of them become visible or none do.
    fn write(&self, wb: Self::WriteBatch) -> Result<(), KVStoreError>;

    /// Delete every key in the store.
    fn clear(&self) -> Result<(), KVStoreError>;

    /// Get a read-only view of the store. Deleting keys from the store while iterating over a
    /// snapshot must not corrupt the iteration.
    fn snapshot<'b>(&'b self) -> Self::Snapshot<'b>;

    /// Make every write that has been applied so far durable.
    fn flush(&self) -> Result<(), KVStoreError> {
        Ok(())
    }

    /// Write a single key-value pair.
    fn set(&self, key: &[u8], value: &[u8]) -> Result<(), KVStoreError> {
        let mut wb = Self::WriteBatch::new();
        wb.set(key, value);
        self.write(wb)
    }

    /// Delete a single key.
    fn delete(&self, key: &[u8]) -> Result<(), KVStoreError> {
        let mut wb = Self::WriteBatch::new();
        wb.delete(key);
        self.write(wb)
    }
}

/// Point reads.
///
/// Implementors provide [`try_get`](KVGet::try_get), which tells a missing key apart from a read
/// that failed. [`get`](KVGet::get) is for callers that only care whether a value could be read.
pub trait KVGet {
    fn try_get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError>;

    /// Like [`try_get`](KVGet::try_get), but a failed read is logged and then reads as missing.
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        match self.try_get(key) {
            Ok(value) => value,
            Err(err) => {
                log::warn!("Failed to read key {:?}: {}", key, err);
                None
            }
        }
    }
}

/// A boxed iterator over key-value pairs in which every step may fail.
pub type KVEntries<'a> = Box<dyn Iterator<Item = Result<(Vec<u8>, Vec<u8>), KVStoreError>> + 'a>;

/// Forward iteration over an ordered key-value store.
pub trait KVIter {
    /// Iterate over every key-value pair whose key is equal to or greater than `start`, in
    /// ascending key order.
    fn try_iter_from<'a>(&'a self, start: &[u8]) -> KVEntries<'a>;

    /// Iterate over every key-value pair whose key starts with `prefix`, in ascending key order.
    /// Failed steps are passed through, not treated as the end of the prefix.
    fn try_iter_prefix<'a>(&'a self, prefix: &[u8]) -> KVEntries<'a> {
        let prefix = prefix.to_vec();
        let iter = self.try_iter_from(&prefix);
        Box::new(iter.take_while(move |entry| match entry {
            Ok((key, _)) => key.starts_with(&prefix),
            Err(_) => true,
        }))
    }

    /// Like [`try_iter_from`](KVIter::try_iter_from), skipping (and logging) failed steps.
    fn iter_from<'a>(&'a self, start: &[u8]) -> Box<dyn Iterator<Item = (Vec<u8>, Vec<u8>)> + 'a> {
        Box::new(self.try_iter_from(start).filter_map(skip_failed))
    }

    /// Like [`try_iter_prefix`](KVIter::try_iter_prefix), skipping (and logging) failed steps.
    fn iter_prefix<'a>(
        &'a self,
        prefix: &[u8],
    ) -> Box<dyn Iterator<Item = (Vec<u8>, Vec<u8>)> + 'a> {
        Box::new(self.try_iter_prefix(prefix).filter_map(skip_failed))
    }
}

fn skip_failed(
    entry: Result<(Vec<u8>, Vec<u8>), KVStoreError>,
) -> Option<(Vec<u8>, Vec<u8>)> {
    match entry {
        Ok(pair) => Some(pair),
        Err(err) => {
            log::warn!("Skipping an entry that failed to read: {}", err);
            None
        }
    }
}

pub trait WriteBatch {
    fn new() -> Self;
    fn set(&mut self, key: &[u8], value: &[u8]);
    fn delete(&mut self, key: &[u8]);
}

/// Error when the underlying key-value store fails to read or to write.
#[derive(Debug, thiserror::Error)]
pub enum KVStoreError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
