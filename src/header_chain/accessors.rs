/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Typed access to the [header chain variables](super::variables) stored in a key-value store.
//!
//! Reads go through [`HeaderStoreGet`], which is implemented for every [`KVGet`]: the store itself,
//! and any of its snapshots. Writes are staged in a [`HeaderChainWriteBatch`] and become visible
//! atomically when the batch is passed to [`KVStore::write`](crate::kv_store::KVStore::write).
//!
//! A missing value is never an error. A value that exists but cannot be deserialized is logged as a
//! warning and then treated as missing. Every `read_*` method has a `try_read_*` twin that reports
//! a failed read of the store as [`KVStoreError`]; the plain variant logs it and returns `None`.

use std::fmt::Display;

use borsh::{BorshDeserialize, BorshSerialize};

use crate::{
    kv_store::{KVGet, KVStoreError, WriteBatch},
    types::{
        data_types::{BlockHeight, CryptoHash, TotalDifficulty},
        header::{BlockBody, Header},
    },
};

use super::variables;

pub trait HeaderStoreGet: KVGet {
    /* ↓↓↓ Headers ↓↓↓ */

    fn try_read_header(
        &self,
        hash: &CryptoHash,
        number: BlockHeight,
    ) -> Result<Option<Header>, KVStoreError> {
        let key = Key::Header { hash: *hash, number };
        fetch(self, key, &variables::header_key(number, hash))
    }

    fn read_header(&self, hash: &CryptoHash, number: BlockHeight) -> Option<Header> {
        or_log(self.try_read_header(hash, number))
    }

    fn try_has_header(&self, hash: &CryptoHash, number: BlockHeight) -> Result<bool, KVStoreError> {
        Ok(self.try_get(&variables::header_key(number, hash))?.is_some())
    }

    fn has_header(&self, hash: &CryptoHash, number: BlockHeight) -> bool {
        self.get(&variables::header_key(number, hash)).is_some()
    }

    /* ↓↓↓ Header Numbers ↓↓↓ */

    fn try_read_header_number(
        &self,
        hash: &CryptoHash,
    ) -> Result<Option<BlockHeight>, KVStoreError> {
        fetch(self, Key::HeaderNumber { hash: *hash }, &variables::header_number_key(hash))
    }

    fn read_header_number(&self, hash: &CryptoHash) -> Option<BlockHeight> {
        or_log(self.try_read_header_number(hash))
    }

    /* ↓↓↓ Canonical Hashes ↓↓↓ */

    fn try_read_canonical_hash(
        &self,
        number: BlockHeight,
    ) -> Result<Option<CryptoHash>, KVStoreError> {
        fetch(self, Key::CanonicalHash { number }, &variables::canonical_hash_key(number))
    }

    fn read_canonical_hash(&self, number: BlockHeight) -> Option<CryptoHash> {
        or_log(self.try_read_canonical_hash(number))
    }

    /* ↓↓↓ Header TDs ↓↓↓ */

    fn try_read_td(
        &self,
        hash: &CryptoHash,
        number: BlockHeight,
    ) -> Result<Option<TotalDifficulty>, KVStoreError> {
        let key = Key::HeaderTD { hash: *hash, number };
        fetch(self, key, &variables::header_td_key(number, hash))
    }

    fn read_td(&self, hash: &CryptoHash, number: BlockHeight) -> Option<TotalDifficulty> {
        or_log(self.try_read_td(hash, number))
    }

    /* ↓↓↓ Head Pointers ↓↓↓ */

    fn try_read_head_header_hash(&self) -> Result<Option<CryptoHash>, KVStoreError> {
        fetch(self, Key::HeadHeaderHash, &variables::HEAD_HEADER_HASH)
    }

    fn read_head_header_hash(&self) -> Option<CryptoHash> {
        or_log(self.try_read_head_header_hash())
    }

    fn try_read_head_block_hash(&self) -> Result<Option<CryptoHash>, KVStoreError> {
        fetch(self, Key::HeadBlockHash, &variables::HEAD_BLOCK_HASH)
    }

    fn read_head_block_hash(&self) -> Option<CryptoHash> {
        or_log(self.try_read_head_block_hash())
    }

    /* ↓↓↓ Block Bodies ↓↓↓ */

    fn try_read_body(
        &self,
        hash: &CryptoHash,
        number: BlockHeight,
    ) -> Result<Option<BlockBody>, KVStoreError> {
        let key = Key::BlockBody { hash: *hash, number };
        fetch(self, key, &variables::block_body_key(number, hash))
    }

    fn read_body(&self, hash: &CryptoHash, number: BlockHeight) -> Option<BlockBody> {
        or_log(self.try_read_body(hash, number))
    }
}

impl<T: KVGet + ?Sized> HeaderStoreGet for T {}

/// Read and decode one variable. Only a failed read is an error; a value that does not decode is
/// logged and reads as missing.
fn fetch<S: KVGet + ?Sized, T: BorshDeserialize>(
    store: &S,
    key: Key,
    bytes_key: &[u8],
) -> Result<Option<T>, KVStoreError> {
    let bytes = match store.try_get(bytes_key)? {
        Some(bytes) => bytes,
        None => return Ok(None),
    };
    match T::try_from_slice(&bytes) {
        Ok(value) => Ok(Some(value)),
        Err(err) => {
            log::warn!("Failed to deserialize {}: {}", key, err);
            Ok(None)
        }
    }
}

/// Collapse a failed read into a miss, logging it.
pub(crate) fn or_log<T>(result: Result<Option<T>, KVStoreError>) -> Option<T> {
    match result {
        Ok(value) => value,
        Err(err) => {
            log::warn!("Failed to read from the header store: {}", err);
            None
        }
    }
}

/// Identifies the header chain variable a failed read or write was about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Header { hash: CryptoHash, number: BlockHeight },
    HeaderNumber { hash: CryptoHash },
    CanonicalHash { number: BlockHeight },
    HeaderTD { hash: CryptoHash, number: BlockHeight },
    HeadHeaderHash,
    HeadBlockHash,
    BlockBody { hash: CryptoHash, number: BlockHeight },
}

impl Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Key::Header { hash, number } => write!(f, "Header {} at height {}", hash, number),
            Key::HeaderNumber { hash } => write!(f, "Header Number for header {}", hash),
            Key::CanonicalHash { number } => write!(f, "Canonical Hash at height {}", number),
            Key::HeaderTD { hash, number } => {
                write!(f, "Total Difficulty for header {} at height {}", hash, number)
            }
            Key::HeadHeaderHash => write!(f, "Head Header Hash"),
            Key::HeadBlockHash => write!(f, "Head Block Hash"),
            Key::BlockBody { hash, number } => {
                write!(f, "Block Body for header {} at height {}", hash, number)
            }
        }
    }
}

/// Error when writing a key-value pair to the [write batch][HeaderChainWriteBatch].
/// The error may arise when the value cannot be serialized, and hence cannot be
/// written to the write batch.
#[derive(Debug, thiserror::Error)]
pub enum KVSetError {
    #[error("failed to serialize {key}: {source}")]
    SerializeValueError { key: Key, source: std::io::Error },
}

/// Stages writes to the header chain variables. Nothing is visible to readers until the batch is
/// written into the store.
pub struct HeaderChainWriteBatch<W: WriteBatch>(pub(crate) W);

impl<W: WriteBatch> HeaderChainWriteBatch<W> {
    pub fn new() -> HeaderChainWriteBatch<W> {
        HeaderChainWriteBatch(W::new())
    }

    /// Get the underlying write batch, e.g., to stage writes to keys outside of the header chain's
    /// keyspace in the same atomic write.
    pub fn inner_mut(&mut self) -> &mut W {
        &mut self.0
    }

    pub fn into_inner(self) -> W {
        self.0
    }

    /* ↓↓↓ Headers ↓↓↓ */

    /// Stage the header itself and its hash-to-number mapping.
    pub fn set_header(&mut self, header: &Header) -> Result<(), KVSetError> {
        let hash = header.hash();
        let number = header.number;
        self.0.set(
            &variables::header_key(number, &hash),
            &serialize(Key::Header { hash, number }, header)?,
        );
        self.0.set(
            &variables::header_number_key(&hash),
            &serialize(Key::HeaderNumber { hash }, &number)?,
        );
        Ok(())
    }

    /// Stage the deletion of a header, its hash-to-number mapping, and its total difficulty.
    pub fn delete_header(&mut self, hash: &CryptoHash, number: BlockHeight) {
        self.0.delete(&variables::header_key(number, hash));
        self.0.delete(&variables::header_number_key(hash));
        self.0.delete(&variables::header_td_key(number, hash));
    }

    /* ↓↓↓ Canonical Hashes ↓↓↓ */

    pub fn set_canonical_hash(
        &mut self,
        number: BlockHeight,
        hash: &CryptoHash,
    ) -> Result<(), KVSetError> {
        self.0.set(
            &variables::canonical_hash_key(number),
            &serialize(Key::CanonicalHash { number }, hash)?,
        );
        Ok(())
    }

    pub fn delete_canonical_hash(&mut self, number: BlockHeight) {
        self.0.delete(&variables::canonical_hash_key(number));
    }

    /* ↓↓↓ Header TDs ↓↓↓ */

    pub fn set_td(
        &mut self,
        hash: &CryptoHash,
        number: BlockHeight,
        td: TotalDifficulty,
    ) -> Result<(), KVSetError> {
        self.0.set(
            &variables::header_td_key(number, hash),
            &serialize(Key::HeaderTD { hash: *hash, number }, &td)?,
        );
        Ok(())
    }

    /* ↓↓↓ Head Pointers ↓↓↓ */

    pub fn set_head_header_hash(&mut self, hash: &CryptoHash) -> Result<(), KVSetError> {
        self.0.set(
            &variables::HEAD_HEADER_HASH,
            &serialize(Key::HeadHeaderHash, hash)?,
        );
        Ok(())
    }

    pub fn set_head_block_hash(&mut self, hash: &CryptoHash) -> Result<(), KVSetError> {
        self.0.set(
            &variables::HEAD_BLOCK_HASH,
            &serialize(Key::HeadBlockHash, hash)?,
        );
        Ok(())
    }

    /* ↓↓↓ Block Bodies ↓↓↓ */

    pub fn set_body(
        &mut self,
        hash: &CryptoHash,
        number: BlockHeight,
        body: &BlockBody,
    ) -> Result<(), KVSetError> {
        self.0.set(
            &variables::block_body_key(number, hash),
            &serialize(Key::BlockBody { hash: *hash, number }, body)?,
        );
        Ok(())
    }

    pub fn delete_body(&mut self, hash: &CryptoHash, number: BlockHeight) {
        self.0.delete(&variables::block_body_key(number, hash));
    }
}

impl<W: WriteBatch> Default for HeaderChainWriteBatch<W> {
    fn default() -> Self {
        Self::new()
    }
}

fn serialize<T: BorshSerialize>(key: Key, value: &T) -> Result<Vec<u8>, KVSetError> {
    value
        .try_to_vec()
        .map_err(|source| KVSetError::SerializeValueError { key, source })
}

