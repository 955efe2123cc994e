//! A key-value store whose reads can be made to fail on demand.

use std::{
    io,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use headerchain_rs::kv_store::{
    mem_db::MemWriteBatch, KVEntries, KVGet, KVIter, KVStore, KVStoreError, MemDB,
};

/// Wraps a [`MemDB`]. While reads are failing, every read and every iteration returns an I/O
/// error. Writes always go through.
#[derive(Clone, Default)]
pub(crate) struct FaultyDB {
    inner: MemDB,
    failing: Arc<AtomicBool>,
}

impl FaultyDB {
    pub(crate) fn new() -> FaultyDB {
        FaultyDB::default()
    }

    pub(crate) fn inner(&self) -> &MemDB {
        &self.inner
    }

    pub(crate) fn fail_reads(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), KVStoreError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(KVStoreError::Io(io::Error::new(
                io::ErrorKind::Other,
                "disk read failed",
            )))
        } else {
            Ok(())
        }
    }
}

impl KVStore for FaultyDB {
    type WriteBatch = MemWriteBatch;
    type Snapshot<'a> = &'a FaultyDB;

    fn write(&self, wb: Self::WriteBatch) -> Result<(), KVStoreError> {
        self.inner.write(wb)
    }

    fn clear(&self) -> Result<(), KVStoreError> {
        self.inner.clear()
    }

    fn snapshot<'b>(&'b self) -> &'b FaultyDB {
        self
    }
}

impl KVGet for FaultyDB {
    fn try_get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        self.check()?;
        self.inner.try_get(key)
    }
}

impl KVIter for FaultyDB {
    fn try_iter_from<'a>(&'a self, start: &[u8]) -> KVEntries<'a> {
        match self.check() {
            Ok(()) => self.inner.try_iter_from(start),
            Err(err) => Box::new(std::iter::once(Err(err))),
        }
    }
}

impl KVGet for &FaultyDB {
    fn try_get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        (**self).try_get(key)
    }
}

impl KVIter for &FaultyDB {
    fn try_iter_from<'a>(&'a self, start: &[u8]) -> KVEntries<'a> {
        (**self).try_iter_from(start)
    }
}
