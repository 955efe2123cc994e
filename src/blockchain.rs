/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The block chain: a [`HeaderChain`] plus the block bodies stored next to its headers.
//!
//! `BlockChain` is the owner of the header chain that the rest of the node talks to. It funnels
//! every mutating call to the header chain through one lock, which is what makes the header chain's
//! mutating methods safe to call from multiple threads.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use crate::{
    consensus::ConsensusEngine,
    header_chain::{
        cache::Cache, DeleteCallback, HeaderChain, HeaderChainError, HeaderChainWriteBatch,
        HeaderStoreGet, InsertStats, WriteStatus,
    },
    kv_store::{KVStore, KVStoreError},
    types::{
        data_types::{BlockHeight, CryptoHash},
        header::{BlockBody, Header},
    },
};

pub const BODY_CACHE_LIMIT: usize = 256;

pub struct BlockChain<K: KVStore, E: ConsensusEngine> {
    header_chain: HeaderChain<K, E>,
    chain_lock: Mutex<()>,
    body_cache: Cache<CryptoHash, Arc<BlockBody>>,
}

impl<K: KVStore, E: ConsensusEngine> BlockChain<K, E> {
    pub fn new(header_chain: HeaderChain<K, E>) -> BlockChain<K, E> {
        BlockChain {
            header_chain,
            chain_lock: Mutex::new(()),
            body_cache: Cache::new(BODY_CACHE_LIMIT),
        }
    }

    /// Get the header chain for reading. Mutating it directly bypasses the chain lock.
    pub fn header_chain(&self) -> &HeaderChain<K, E> {
        &self.header_chain
    }

    pub fn current_header(&self) -> Arc<Header> {
        self.header_chain.current_header()
    }

    /// Get the head of the block chain: the highest header on the canonical chain whose body is
    /// also stored.
    pub fn current_block_hash(&self) -> Option<CryptoHash> {
        self.header_chain.kv_store().read_head_block_hash()
    }

    /* ↓↓↓ Mutations (serialized by the chain lock) ↓↓↓ */

    pub fn insert_header_chain(
        &self,
        chain: &[Header],
        start: Instant,
    ) -> Result<InsertStats, HeaderChainError> {
        let _guard = self.chain_lock.lock();
        self.header_chain.insert_header_chain(chain, start)
    }

    pub fn write_header(&self, header: &Header) -> Result<WriteStatus, HeaderChainError> {
        let _guard = self.chain_lock.lock();
        self.header_chain.write_header(header)
    }

    pub fn set_current_header(&self, header: Header) -> Result<(), HeaderChainError> {
        let _guard = self.chain_lock.lock();
        self.header_chain.set_current_header(header)
    }

    /// Rewind both the header chain and the block chain to `target`. The bodies of every rewound
    /// header are deleted in the same atomic write as the headers themselves.
    pub fn set_head(&self, target: BlockHeight) -> Result<(), HeaderChainError> {
        let _guard = self.chain_lock.lock();

        let delete_body: &mut DeleteCallback<'_, K::WriteBatch> =
            &mut |wb: &mut HeaderChainWriteBatch<K::WriteBatch>,
                  hash: CryptoHash,
                  number: BlockHeight| {
                wb.delete_body(&hash, number);
                self.body_cache.remove(&hash);
            };
        self.header_chain.set_head(target, Some(delete_body))?;

        // The block head is the highest remaining header that still has its body.
        let mut head = self.header_chain.current_header();
        while !head.is_genesis() && !self.try_has_body(&head.hash(), head.number)? {
            let parent = match head.number.parent() {
                Some(parent_number) => self
                    .header_chain
                    .try_header(&head.parent_hash, parent_number)?,
                None => None,
            };
            head = match parent {
                Some(parent) => parent,
                None => self.header_chain.genesis_header(),
            };
        }

        let mut wb = HeaderChainWriteBatch::<K::WriteBatch>::new();
        wb.set_head_block_hash(&head.hash())?;
        self.header_chain.kv_store().write(wb.into_inner())?;
        Ok(())
    }

    /// Store the body of the header with the given hash and number. If the header is the head of
    /// the header chain, it also becomes the head of the block chain.
    pub fn write_body(
        &self,
        hash: &CryptoHash,
        number: BlockHeight,
        body: BlockBody,
    ) -> Result<(), HeaderChainError> {
        let _guard = self.chain_lock.lock();

        let mut wb = HeaderChainWriteBatch::<K::WriteBatch>::new();
        wb.set_body(hash, number, &body)?;
        if self.header_chain.current_header_hash() == *hash {
            wb.set_head_block_hash(hash)?;
        }
        self.header_chain.kv_store().write(wb.into_inner())?;

        self.body_cache.put(*hash, Arc::new(body));
        Ok(())
    }

    /* ↓↓↓ Bodies ↓↓↓ */

    pub fn body(&self, hash: &CryptoHash, number: BlockHeight) -> Option<Arc<BlockBody>> {
        if let Some(body) = self.body_cache.get(hash) {
            return Some(body);
        }
        let body = Arc::new(self.header_chain.kv_store().read_body(hash, number)?);
        self.body_cache.put(*hash, Arc::clone(&body));
        Some(body)
    }

    pub fn has_body(&self, hash: &CryptoHash, number: BlockHeight) -> bool {
        self.body_cache.contains(hash)
            || self.header_chain.kv_store().read_body(hash, number).is_some()
    }

    fn try_has_body(&self, hash: &CryptoHash, number: BlockHeight) -> Result<bool, KVStoreError> {
        if self.body_cache.contains(hash) {
            return Ok(true);
        }
        Ok(self.header_chain.kv_store().try_read_body(hash, number)?.is_some())
    }
}
