//! Tests of header lookups, the head pointer, and rewinding with `set_head`.

mod common;

use std::{collections::HashMap, sync::Arc, time::Instant};

use headerchain_rs::{
    header_chain::{
        setup_genesis, variables, DeleteCallback, HeaderChain, HeaderChainError,
        HeaderChainWriteBatch, HeaderStoreGet,
    },
    kv_store::{KVStore, MemDB},
    types::{
        data_types::{BlockHeight, CryptoHash},
        header::Header,
    },
};
use log::LevelFilter;
use sha2::{Digest, Sha256};

use crate::common::{
    engine::TestEngine,
    faulty_db::FaultyDB,
    headers::{canonical_store, child, extend, genesis, open},
    logging::setup_logger,
};

type MemWriteBatch = <MemDB as KVStore>::WriteBatch;

// Delete a header straight from the store, leaving a hole in the chain.
fn delete_header_from_store(kv_store: &MemDB, header: &Header) {
    let mut wb = HeaderChainWriteBatch::<MemWriteBatch>::new();
    wb.delete_header(&header.hash(), header.number);
    kv_store.write(wb.into_inner()).unwrap();
}

#[test]
fn open_without_genesis_test() {
    setup_logger(LevelFilter::Trace);

    let result = HeaderChain::new(MemDB::new(), TestEngine::accept_all(), || false);
    assert!(matches!(result, Err(HeaderChainError::NoGenesis)));
}

#[test]
fn header_lookup_test() {
    setup_logger(LevelFilter::Trace);

    // 1. Initialize a store with genesis plus 10 canonical headers.
    log::debug!("Initializing a store with 10 canonical headers.");
    let (kv_store, headers) = canonical_store(10);
    let header_chain = open(&kv_store);

    // 2. Every header can be found through the cache, and again through the store once the caches
    //    are purged.
    log::debug!("Looking up every header, warm and cold.");
    for header in &headers {
        let hash = header.hash();
        assert_eq!(header_chain.header(&hash, header.number).as_deref(), Some(header));
        assert_eq!(header_chain.header_by_hash(&hash).as_deref(), Some(header));
        assert_eq!(header_chain.block_number(&hash), Some(header.number));
        assert!(header_chain.has_header(&hash, header.number));
    }
    header_chain.purge_caches();
    for header in &headers {
        let hash = header.hash();
        assert_eq!(header_chain.header(&hash, header.number).as_deref(), Some(header));
        assert_eq!(header_chain.header_by_number(header.number).as_deref(), Some(header));
    }

    // 3. A lookup with the right hash but the wrong number finds nothing.
    let fifth = &headers[5];
    assert!(header_chain.header(&fifth.hash(), BlockHeight::new(6)).is_none());

    // 4. Unknown hashes are missing, not errors.
    let unknown = CryptoHash::new([0xAB; 32]);
    assert!(header_chain.header_by_hash(&unknown).is_none());
    assert!(header_chain.block_number(&unknown).is_none());
    assert!(header_chain.td_by_hash(&unknown).is_none());
    assert!(header_chain.header_by_number(BlockHeight::new(11)).is_none());

    // 5. Total difficulties accumulate from genesis.
    let mut expected_td = 0;
    for header in &headers {
        expected_td += header.difficulty;
        assert_eq!(
            header_chain.td(&header.hash(), header.number).map(|td| td.int()),
            Some(expected_td)
        );
    }
}

#[test]
fn header_by_number_is_canonical_only_test() {
    setup_logger(LevelFilter::Trace);

    let (kv_store, headers) = canonical_store(10);
    let header_chain = open(&kv_store);

    // 1. Write a light sibling of header 3. It is stored, but does not become canonical.
    log::debug!("Writing a side header at height 3.");
    let side = child(&headers[2], 1, 0xEE);
    header_chain.write_header(&side).unwrap();

    // 2. The side header is reachable by hash, but the canonical index still points at the
    //    canonical header.
    assert_eq!(header_chain.header(&side.hash(), side.number).as_deref(), Some(&side));
    assert_eq!(header_chain.header_by_hash(&side.hash()).as_deref(), Some(&side));
    assert_eq!(
        header_chain.header_by_number(BlockHeight::new(3)).as_deref(),
        Some(&headers[3])
    );
    assert_eq!(header_chain.current_header().as_ref(), &headers[10]);
}

#[test]
fn ancestor_test() {
    setup_logger(LevelFilter::Trace);

    let (kv_store, headers) = canonical_store(10);
    let header_chain = open(&kv_store);
    let side = child(&headers[4], 1, 0xEE);
    header_chain.write_header(&side).unwrap();

    // 1. Canonical headers.
    let tenth = &headers[10];
    assert_eq!(
        header_chain.ancestor(&tenth.hash(), tenth.number, 0),
        Some((tenth.hash(), tenth.number))
    );
    assert_eq!(
        header_chain.ancestor(&tenth.hash(), tenth.number, 3),
        Some((headers[7].hash(), BlockHeight::new(7)))
    );
    assert_eq!(
        header_chain.ancestor(&tenth.hash(), tenth.number, 10),
        Some((headers[0].hash(), BlockHeight::new(0)))
    );
    assert_eq!(header_chain.ancestor(&tenth.hash(), tenth.number, 11), None);

    // 2. A side header reaches its ancestors through its parents.
    assert_eq!(
        header_chain.ancestor(&side.hash(), side.number, 2),
        Some((headers[3].hash(), BlockHeight::new(3)))
    );
}

#[test]
fn block_hashes_from_hash_test() {
    setup_logger(LevelFilter::Trace);

    let (kv_store, headers) = canonical_store(10);
    let header_chain = open(&kv_store);
    let tenth = headers[10].hash();

    // 1. Parents first, up to `max`.
    log::debug!("Collecting ancestor hashes.");
    assert_eq!(
        header_chain.block_hashes_from_hash(&tenth, 3),
        vec![headers[9].hash(), headers[8].hash(), headers[7].hash()]
    );

    // 2. The walk stops after genesis.
    let all = header_chain.block_hashes_from_hash(&tenth, 100);
    assert_eq!(all.len(), 10);
    assert_eq!(all.last(), Some(&headers[0].hash()));

    // 3. Genesis has no ancestors, and unknown hashes have none either.
    assert!(header_chain.block_hashes_from_hash(&headers[0].hash(), 10).is_empty());
    assert!(header_chain
        .block_hashes_from_hash(&CryptoHash::new([0xAB; 32]), 10)
        .is_empty());
    assert!(header_chain.block_hashes_from_hash(&tenth, 0).is_empty());

    // 4. The walk stops early at a missing ancestor.
    log::debug!("Deleting header 5 and collecting again.");
    delete_header_from_store(&kv_store, &headers[5]);
    header_chain.purge_caches();
    assert_eq!(
        header_chain.block_hashes_from_hash(&tenth, 100),
        vec![
            headers[9].hash(),
            headers[8].hash(),
            headers[7].hash(),
            headers[6].hash()
        ]
    );
}

#[test]
fn set_head_test() {
    setup_logger(LevelFilter::Trace);

    // 1. Initialize a chain with 10 canonical headers.
    log::debug!("Initializing a store with 10 canonical headers.");
    let (kv_store, headers) = canonical_store(10);
    let header_chain = open(&kv_store);
    assert_eq!(header_chain.current_header().as_ref(), &headers[10]);

    // 2. Rewind to 5, recording every deleted header.
    log::debug!("Rewinding to height 5.");
    let mut deleted: HashMap<BlockHeight, Vec<CryptoHash>> = HashMap::new();
    let record: &mut DeleteCallback<'_, MemWriteBatch> =
        &mut |_: &mut HeaderChainWriteBatch<MemWriteBatch>, hash: CryptoHash, number: BlockHeight| {
            deleted.entry(number).or_default().push(hash);
        };
    header_chain
        .set_head(BlockHeight::new(5), Some(record))
        .unwrap();

    // 3. The callback fired exactly once for each height above 5.
    log::debug!("Checking the deleted headers.");
    assert_eq!(deleted.len(), 5);
    for number in 6..=10 {
        assert_eq!(
            deleted.get(&BlockHeight::new(number)),
            Some(&vec![headers[number as usize].hash()])
        );
    }

    // 4. Nothing above 5 is found any more, by number or by hash.
    for header in &headers[6..] {
        assert!(header_chain.header_by_number(header.number).is_none());
        assert!(header_chain.header(&header.hash(), header.number).is_none());
        assert!(header_chain.block_number(&header.hash()).is_none());
        assert!(header_chain.td(&header.hash(), header.number).is_none());
    }
    for header in &headers[..=5] {
        assert_eq!(header_chain.header_by_number(header.number).as_deref(), Some(header));
    }

    // 5. The head is header 5, in memory and in the store.
    assert_eq!(header_chain.current_header().as_ref(), &headers[5]);
    assert_eq!(header_chain.current_header_hash(), headers[5].hash());
    assert_eq!(kv_store.read_head_header_hash(), Some(headers[5].hash()));

    // 6. A chain reopened over the same store starts at header 5.
    log::debug!("Reopening the header chain.");
    let reopened = open(&kv_store);
    assert_eq!(reopened.current_header().as_ref(), &headers[5]);
}

#[test]
fn set_head_is_idempotent_test() {
    setup_logger(LevelFilter::Trace);

    let (kv_store, headers) = canonical_store(10);
    let header_chain = open(&kv_store);

    let canonical_index = |header_chain: &HeaderChain<MemDB, TestEngine>| {
        (0..=10)
            .map(|number| header_chain.header_by_number(BlockHeight::new(number)))
            .collect::<Vec<Option<Arc<Header>>>>()
    };

    // 1. Rewind to 5 twice; the second call changes nothing.
    header_chain.set_head(BlockHeight::new(5), None).unwrap();
    let head = header_chain.current_header();
    let index = canonical_index(&header_chain);

    header_chain.set_head(BlockHeight::new(5), None).unwrap();
    assert_eq!(header_chain.current_header(), head);
    assert_eq!(canonical_index(&header_chain), index);

    // 2. A target above the head changes nothing either.
    let mut calls = 0;
    let count: &mut DeleteCallback<'_, MemWriteBatch> =
        &mut |_: &mut HeaderChainWriteBatch<MemWriteBatch>, _: CryptoHash, _: BlockHeight| {
            calls += 1;
        };
    header_chain.set_head(BlockHeight::new(8), Some(count)).unwrap();
    assert_eq!(calls, 0);
    assert_eq!(header_chain.current_header().as_ref(), &headers[5]);
    assert_eq!(canonical_index(&header_chain), index);
}

#[test]
fn set_head_falls_back_to_genesis_test() {
    setup_logger(LevelFilter::Trace);

    // 1. Punch a hole into the chain at height 3.
    log::debug!("Deleting header 3 from the store.");
    let (kv_store, headers) = canonical_store(10);
    delete_header_from_store(&kv_store, &headers[3]);
    let header_chain = open(&kv_store);

    // 2. Rewinding to 1 walks down to the hole, then gives up and falls back to genesis.
    log::debug!("Rewinding to height 1.");
    let mut deleted = Vec::new();
    let record: &mut DeleteCallback<'_, MemWriteBatch> =
        &mut |_: &mut HeaderChainWriteBatch<MemWriteBatch>, _: CryptoHash, number: BlockHeight| {
            deleted.push(number.int());
        };
    header_chain
        .set_head(BlockHeight::new(1), Some(record))
        .unwrap();

    assert_eq!(deleted, vec![10, 9, 8, 7, 6, 5, 4]);
    assert_eq!(header_chain.current_header().as_ref(), &headers[0]);
    assert_eq!(kv_store.read_head_header_hash(), Some(headers[0].hash()));
    for number in 2..=10 {
        assert!(header_chain.header_by_number(BlockHeight::new(number)).is_none());
    }
}

#[test]
fn head_reload_test() {
    setup_logger(LevelFilter::Trace);

    let (kv_store, headers) = canonical_store(10);

    // 1. With the head header hash gone, the head block hash is used instead.
    log::debug!("Replacing the head header hash with a head block hash.");
    kv_store.delete(&variables::HEAD_HEADER_HASH).unwrap();
    let mut wb = HeaderChainWriteBatch::<MemWriteBatch>::new();
    wb.set_head_block_hash(&headers[4].hash()).unwrap();
    kv_store.write(wb.into_inner()).unwrap();

    let header_chain = open(&kv_store);
    assert_eq!(header_chain.current_header().as_ref(), &headers[4]);

    // 2. With neither pointer, or a pointer to an unknown header, the head is genesis.
    log::debug!("Pointing the head block hash at an unknown header.");
    let mut wb = HeaderChainWriteBatch::<MemWriteBatch>::new();
    wb.set_head_block_hash(&CryptoHash::new([0xAB; 32])).unwrap();
    kv_store.write(wb.into_inner()).unwrap();

    let header_chain = open(&kv_store);
    assert_eq!(header_chain.current_header().as_ref(), &headers[0]);
}

#[test]
fn set_current_header_test() {
    setup_logger(LevelFilter::Trace);

    let (kv_store, headers) = canonical_store(10);
    let header_chain = open(&kv_store);

    header_chain.set_current_header(headers[7].clone()).unwrap();
    assert_eq!(header_chain.current_header().as_ref(), &headers[7]);
    assert_eq!(kv_store.read_head_header_hash(), Some(headers[7].hash()));
    assert_eq!(open(&kv_store).current_header().as_ref(), &headers[7]);
}

#[test]
fn set_genesis_test() {
    setup_logger(LevelFilter::Trace);

    let (kv_store, headers) = canonical_store(3);
    let header_chain = open(&kv_store);
    assert_eq!(header_chain.genesis_header().as_ref(), &genesis());

    // Only the in-memory genesis is replaced.
    header_chain.set_genesis(headers[2].clone());
    assert_eq!(header_chain.genesis_header().as_ref(), &headers[2]);
    assert_eq!(open(&kv_store).genesis_header().as_ref(), &genesis());
}

#[test]
fn failed_reads_test() {
    setup_logger(LevelFilter::Trace);

    // 1. Initialize a chain with 10 headers over a store whose reads can be made to fail.
    log::debug!("Initializing a chain with 10 headers.");
    let kv_store = FaultyDB::new();
    let genesis = genesis();
    setup_genesis(&kv_store, &genesis).unwrap();
    let header_chain =
        HeaderChain::new(kv_store.clone(), TestEngine::accept_all(), || false).unwrap();
    let headers = extend(&genesis, 10, 10, 0);
    header_chain
        .insert_header_chain(&headers, Instant::now())
        .unwrap();
    assert_eq!(header_chain.current_header().as_ref(), &headers[9]);

    // 2. While reads fail, opening reports the failure instead of a missing genesis.
    log::debug!("Opening the chain while reads fail.");
    kv_store.fail_reads(true);
    let result = HeaderChain::new(kv_store.clone(), TestEngine::accept_all(), || false);
    assert!(matches!(result, Err(HeaderChainError::KVStoreError(_))));

    // 3. Rewinding fails without touching the chain, rather than falling back to genesis.
    log::debug!("Rewinding to height 5 while reads fail.");
    header_chain.purge_caches();
    let result = header_chain.set_head(BlockHeight::new(5), None);
    assert!(matches!(result, Err(HeaderChainError::KVStoreError(_))));
    assert_eq!(header_chain.current_header().as_ref(), &headers[9]);

    // 3.1. Writing a header fails too. Plain lookups read as missing.
    let next = child(&headers[9], 10, 0);
    let result = header_chain.write_header(&next);
    assert!(matches!(result, Err(HeaderChainError::KVStoreError(_))));
    assert!(header_chain.header_by_number(BlockHeight::new(3)).is_none());

    // 4. Once reads work again, nothing was lost and the rewind goes through.
    log::debug!("Rewinding to height 5 with working reads.");
    kv_store.fail_reads(false);
    for header in &headers {
        assert_eq!(
            kv_store.inner().read_canonical_hash(header.number),
            Some(header.hash())
        );
    }
    assert!(kv_store.inner().read_canonical_hash(next.number).is_none());
    header_chain.set_head(BlockHeight::new(5), None).unwrap();
    assert_eq!(header_chain.current_header().as_ref(), &headers[4]);
    assert_eq!(
        HeaderChain::new(kv_store.clone(), TestEngine::accept_all(), || false)
            .unwrap()
            .current_header()
            .as_ref(),
        &headers[4]
    );
}

#[test]
fn header_hash_test() {
    setup_logger(LevelFilter::Trace);

    // 1. The hash covers every field in order, with big-endian integers and a length-prefixed
    // extra.
    let header = child(&genesis(), 7, 0x2A);
    let mut hasher = Sha256::new();
    hasher.update(header.parent_hash.bytes());
    hasher.update(1u64.to_be_bytes());
    hasher.update(10u64.to_be_bytes());
    hasher.update(7u128.to_be_bytes());
    hasher.update([0x2A; 32]);
    hasher.update(1u64.to_be_bytes());
    hasher.update([0x2A]);
    let expected: [u8; 32] = hasher.finalize().into();
    assert_eq!(header.hash(), CryptoHash::new(expected));

    // 2. Emptying extra changes the hash.
    let mut shifted = header.clone();
    shifted.extra = Vec::new();
    assert_ne!(shifted.hash(), header.hash());
}
