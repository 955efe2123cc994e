//! Tests of the bundled key-value stores.

mod common;

use headerchain_rs::kv_store::{KVGet, KVIter, KVStore, MemDB, SledDB, WriteBatch};
use log::LevelFilter;

use crate::common::logging::setup_logger;

fn keys_of(iter: Box<dyn Iterator<Item = (Vec<u8>, Vec<u8>)> + '_>) -> Vec<Vec<u8>> {
    iter.map(|(key, _)| key).collect()
}

// Behavior both stores share.
fn check_store<K: KVStore>(kv_store: &K) {
    // 1. A batch applies all of its operations together.
    log::debug!("Writing a batch.");
    let mut wb = K::WriteBatch::new();
    wb.set(b"a:1", b"one");
    wb.set(b"a:2", b"two");
    wb.set(b"b:1", b"three");
    wb.set(b"a:0", b"zero");
    kv_store.write(wb).unwrap();
    assert_eq!(kv_store.get(b"a:2"), Some(b"two".to_vec()));

    // 1.1. Deletions and insertions in one batch.
    let mut wb = K::WriteBatch::new();
    wb.delete(b"a:0");
    wb.set(b"a:3", b"four");
    kv_store.write(wb).unwrap();
    assert_eq!(kv_store.get(b"a:0"), None);
    assert_eq!(kv_store.get(b"a:3"), Some(b"four".to_vec()));

    // 2. Iteration is in key order, and prefix iteration stays within the prefix.
    log::debug!("Iterating.");
    assert_eq!(
        keys_of(kv_store.iter_prefix(b"a:")),
        vec![b"a:1".to_vec(), b"a:2".to_vec(), b"a:3".to_vec()]
    );
    assert_eq!(
        keys_of(kv_store.iter_from(b"a:3")),
        vec![b"a:3".to_vec(), b"b:1".to_vec()]
    );
    assert!(kv_store.iter_prefix(b"c:").next().is_none());

    // 2.1. A working store tells a missing key apart from a failed read.
    assert_eq!(kv_store.try_get(b"a:1").unwrap(), Some(b"one".to_vec()));
    assert_eq!(kv_store.try_get(b"a:9").unwrap(), None);
    let entries: Vec<_> = kv_store
        .try_iter_prefix(b"a:")
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(entries.len(), 3);

    // 3. Single-key helpers.
    kv_store.set(b"c:1", b"five").unwrap();
    kv_store.delete(b"a:1").unwrap();
    assert_eq!(kv_store.get(b"c:1"), Some(b"five".to_vec()));
    assert_eq!(kv_store.get(b"a:1"), None);

    // 4. Deleting while iterating over a snapshot does not cut the iteration short.
    log::debug!("Deleting while iterating over a snapshot.");
    let snapshot = kv_store.snapshot();
    let mut visited = 0;
    for (key, _) in snapshot.iter_prefix(b"a:") {
        kv_store.delete(&key).unwrap();
        visited += 1;
    }
    assert_eq!(visited, 2);
    assert!(kv_store.iter_prefix(b"a:").next().is_none());

    // 5. Clearing removes everything.
    kv_store.clear().unwrap();
    assert!(kv_store.iter_from(b"").next().is_none());
    kv_store.flush().unwrap();
}

#[test]
fn mem_db_test() {
    setup_logger(LevelFilter::Trace);

    let kv_store = MemDB::new();
    assert!(kv_store.is_empty());
    check_store(&kv_store);

    // A snapshot keeps seeing the store as it was when it was taken.
    kv_store.set(b"key", b"old").unwrap();
    let snapshot = kv_store.snapshot();
    kv_store.set(b"key", b"new").unwrap();
    kv_store.set(b"other", b"value").unwrap();
    assert_eq!(snapshot.get(b"key"), Some(b"old".to_vec()));
    assert_eq!(snapshot.get(b"other"), None);
    assert_eq!(kv_store.get(b"key"), Some(b"new".to_vec()));
    assert_eq!(kv_store.len(), 2);

    // Clones share the same map.
    let clone = kv_store.clone();
    clone.delete(b"other").unwrap();
    assert_eq!(kv_store.get(b"other"), None);
}

#[test]
fn sled_db_test() {
    setup_logger(LevelFilter::Trace);

    check_store(&SledDB::temporary().unwrap());

    // Writes survive a reopen once flushed, and the path can be reopened as soon as the last
    // handle is dropped.
    let dir = tempfile::tempdir().unwrap();
    for round in 0..10u8 {
        let kv_store = SledDB::open(dir.path()).unwrap();
        for earlier in 0..round {
            assert_eq!(kv_store.get(&[earlier]), Some(vec![earlier]));
        }
        kv_store.set(&[round], &[round]).unwrap();
        kv_store.flush().unwrap();
    }
}
