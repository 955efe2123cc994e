/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Byte-prefixes that specify where each header chain variable is stored in the user-provided
//! key-value store.
//!
//! # List of State Variables
//!
//! |Variable|Type|Description|
//! |---|---|---|
//! |Headers|([`BlockHeight`](crate::types::data_types::BlockHeight), [`CryptoHash`](crate::types::data_types::CryptoHash)) -> [`Header`](crate::types::header::Header)|Every header that has been written and not rewound, canonical or not.|
//! |Header Numbers|[`CryptoHash`](crate::types::data_types::CryptoHash) -> [`BlockHeight`](crate::types::data_types::BlockHeight)|Mapping between a header's hash and its number. Lets a header be found from its hash alone.|
//! |Canonical Hashes|[`BlockHeight`](crate::types::data_types::BlockHeight) -> [`CryptoHash`](crate::types::data_types::CryptoHash)|The canonical chain. Only contains heights on the path from genesis to the head, because at every other height there may be multiple headers.|
//! |Header TDs|([`BlockHeight`](crate::types::data_types::BlockHeight), [`CryptoHash`](crate::types::data_types::CryptoHash)) -> [`TotalDifficulty`](crate::types::data_types::TotalDifficulty)|Total difficulty of each header.|
//! |Head Header Hash|[`CryptoHash`](crate::types::data_types::CryptoHash)|Hash of the head of the header chain.|
//! |Head Block Hash|[`CryptoHash`](crate::types::data_types::CryptoHash)|Hash of the head of the block chain (the highest header whose body is also stored).|
//! |Block Bodies|([`BlockHeight`](crate::types::data_types::BlockHeight), [`CryptoHash`](crate::types::data_types::CryptoHash)) -> [`BlockBody`](crate::types::header::BlockBody)|Bodies written by [`BlockChain`](crate::blockchain::BlockChain).|
//!
//! # Persistence of state variables
//!
//! Each variable is stored as **Borsh-serialized values**. Single values (the two head hashes) are
//! stored at one-byte constant keys. Mappings are stored at keys formed by concatenating the
//! variable's one-byte prefix with the key of the mapping. Heights inside keys are big-endian, so that
//! the entries of a mapping keyed by height iterate in height order.

use crate::types::data_types::{BlockHeight, CryptoHash};

// State variables
pub const HEADERS: [u8; 1] = [0];
pub const HEADER_NUMBERS: [u8; 1] = [1];
pub const CANONICAL_HASHES: [u8; 1] = [2];
pub const HEADER_TDS: [u8; 1] = [3];
pub const HEAD_HEADER_HASH: [u8; 1] = [4];
pub const HEAD_BLOCK_HASH: [u8; 1] = [5];
pub const BLOCK_BODIES: [u8; 1] = [6];

/// Concatenate two byteslices into one vector.
pub fn concat(a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut res = Vec::with_capacity(a.len() + b.len());
    res.extend_from_slice(a);
    res.extend_from_slice(b);
    res
}

/// `prefix` + `number` (big-endian) + `hash`.
pub(crate) fn number_hash_key(prefix: &[u8], number: BlockHeight, hash: &CryptoHash) -> Vec<u8> {
    concat(&concat(prefix, &number.to_be_bytes()), &hash.bytes())
}

pub(crate) fn header_key(number: BlockHeight, hash: &CryptoHash) -> Vec<u8> {
    number_hash_key(&HEADERS, number, hash)
}

pub(crate) fn header_number_key(hash: &CryptoHash) -> Vec<u8> {
    concat(&HEADER_NUMBERS, &hash.bytes())
}

pub(crate) fn canonical_hash_key(number: BlockHeight) -> Vec<u8> {
    concat(&CANONICAL_HASHES, &number.to_be_bytes())
}

pub(crate) fn header_td_key(number: BlockHeight, hash: &CryptoHash) -> Vec<u8> {
    number_hash_key(&HEADER_TDS, number, hash)
}

pub(crate) fn block_body_key(number: BlockHeight, hash: &CryptoHash) -> Vec<u8> {
    number_hash_key(&BLOCK_BODIES, number, hash)
}
