//! Header fixtures.

use std::time::Instant;

use headerchain_rs::{
    header_chain::{setup_genesis, HeaderChain},
    kv_store::MemDB,
    types::{
        data_types::{BlockHeight, CryptoHash},
        header::Header,
    },
};

use super::engine::TestEngine;

pub(crate) const GENESIS_DIFFICULTY: u128 = 1;

pub(crate) fn genesis() -> Header {
    Header::new(
        CryptoHash::default(),
        BlockHeight::new(0),
        0,
        GENESIS_DIFFICULTY,
        CryptoHash::default(),
        b"genesis".to_vec(),
    )
}

/// A child of `parent` with the given difficulty. `salt` tells apart siblings that would otherwise
/// be identical.
pub(crate) fn child(parent: &Header, difficulty: u128, salt: u8) -> Header {
    Header::new(
        parent.hash(),
        parent.number.child().expect("height overflow"),
        parent.timestamp + 10,
        difficulty,
        CryptoHash::new([salt; 32]),
        vec![salt],
    )
}

/// `len` headers extending `parent`, each with the given difficulty.
pub(crate) fn extend(parent: &Header, len: usize, difficulty: u128, salt: u8) -> Vec<Header> {
    let mut headers: Vec<Header> = Vec::with_capacity(len);
    for _ in 0..len {
        let next = child(headers.last().unwrap_or(parent), difficulty, salt);
        headers.push(next);
    }
    headers
}

/// A store holding genesis plus headers 1..=`len`, all canonical. Returns the store and every
/// header, genesis first, so that `headers[n]` is the header at height `n`.
pub(crate) fn canonical_store(len: usize) -> (MemDB, Vec<Header>) {
    let kv_store = MemDB::new();
    let genesis = genesis();
    setup_genesis(&kv_store, &genesis).unwrap();

    let mut headers = vec![genesis.clone()];
    headers.extend(extend(&genesis, len, 10, 0));

    let header_chain = open(&kv_store);
    header_chain
        .insert_header_chain(&headers[1..], Instant::now())
        .unwrap();

    (kv_store, headers)
}

pub(crate) fn open(kv_store: &MemDB) -> HeaderChain<MemDB, TestEngine> {
    HeaderChain::new(kv_store.clone(), TestEngine::accept_all(), || false).unwrap()
}
