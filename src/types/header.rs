/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Definitions for the 'header' type and its associated methods.

use borsh::{BorshDeserialize, BorshSerialize};
pub use sha2::Sha256 as CryptoHasher;
use sha2::Digest;

use crate::types::data_types::{BlockHeight, CryptoHash};

/// A block header.
///
/// Headers are immutable once accepted into the header chain and are identified by their
/// [hash](Self::hash). The hash is derived from the other fields on demand and is never stored
/// next to the header.
///
/// Only `parent_hash` and `number` carry meaning for the header chain. The remaining fields are
/// payload that the chain stores and returns untouched, except for `difficulty`, which feeds
/// total-difficulty fork choice.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Header {
    pub parent_hash: CryptoHash,
    pub number: BlockHeight,
    pub timestamp: u64,
    pub difficulty: u128,
    pub state_root: CryptoHash,
    pub extra: Vec<u8>,
}

impl Header {
    pub fn new(
        parent_hash: CryptoHash,
        number: BlockHeight,
        timestamp: u64,
        difficulty: u128,
        state_root: CryptoHash,
        extra: Vec<u8>,
    ) -> Header {
        Header {
            parent_hash,
            number,
            timestamp,
            difficulty,
            state_root,
            extra,
        }
    }

    /// SHA256 over every field of the header, in declaration order. Integers are hashed as
    /// big-endian bytes, and `extra` is preceded by its length as a big-endian `u64`. This is not
    /// the borsh encoding of the header, which is little-endian.
    pub fn hash(&self) -> CryptoHash {
        let mut hasher = CryptoHasher::new();
        hasher.update(self.parent_hash.bytes());
        hasher.update(self.number.to_be_bytes());
        hasher.update(self.timestamp.to_be_bytes());
        hasher.update(self.difficulty.to_be_bytes());
        hasher.update(self.state_root.bytes());
        hasher.update((self.extra.len() as u64).to_be_bytes());
        hasher.update(&self.extra);
        CryptoHash::new(hasher.finalize().into())
    }

    pub fn is_genesis(&self) -> bool {
        self.number.is_genesis()
    }
}

/// Opaque body of a block, kept next to its header by [`BlockChain`](crate::blockchain::BlockChain).
#[derive(Clone, Debug, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct BlockBody {
    pub transactions: Vec<Vec<u8>>,
}

impl BlockBody {
    pub fn new(transactions: Vec<Vec<u8>>) -> BlockBody {
        BlockBody { transactions }
    }
}
