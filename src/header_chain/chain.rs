/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The [`HeaderChain`] type and its configuration.
//!
//! # Concurrency
//!
//! Every read method, including [`HeaderChain::current_header`], can be called from any number of
//! threads at any time. The head pointer is swapped atomically, so readers never see a half-updated
//! head.
//!
//! The mutating methods ([`set_current_header`](HeaderChain::set_current_header),
//! [`set_head`](HeaderChain::set_head), [`write_header`](HeaderChain::write_header) and
//! [`insert_header_chain`](HeaderChain::insert_header_chain)) are **not** mutually exclusive with each
//! other. Callers must serialize them, e.g., by holding a lock around every call, as
//! [`BlockChain`](crate::blockchain::BlockChain) does.

use std::{
    sync::{mpsc::Sender, Arc},
    time::{Duration, Instant, SystemTime},
};

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use rand::{rngs::OsRng, rngs::StdRng, Rng, SeedableRng};
use typed_builder::TypedBuilder;

use crate::{
    consensus::{ConsensusEngine, ConsensusError},
    events::{Event, InsertHeaderEvent, RewindChainEvent, UpdateHeadEvent},
    kv_store::{KVStore, KVStoreError},
    types::{
        data_types::{BlockHeight, CryptoHash, TotalDifficulty},
        header::Header,
    },
};

use super::{
    accessors::{or_log, HeaderChainWriteBatch, HeaderStoreGet, KVSetError},
    cache::Cache,
};

pub const HEADER_CACHE_LIMIT: usize = 512;
pub const NUMBER_CACHE_LIMIT: usize = 2048;
pub const TD_CACHE_LIMIT: usize = 1024;

/// Called by [`HeaderChain::set_head`] once for every header that is rewound, before the header's
/// own deletion is staged. The callback may stage more deletions (e.g., of the header's block body)
/// into the same write batch, but must not write the batch into the store.
pub type DeleteCallback<'a, W> =
    dyn FnMut(&mut HeaderChainWriteBatch<W>, CryptoHash, BlockHeight) + 'a;

/// Sizes of the header chain's caches.
///
/// ```ignore
/// let configuration = HeaderChainConfiguration::builder()
///     .header_cache_limit(1024)
///     .build();
/// ```
#[derive(Clone, Debug, TypedBuilder)]
#[builder(builder_method(doc = "
    Create a builder for building a [HeaderChainConfiguration]. Every setter is optional; unset
    limits take their default values.
"))]
pub struct HeaderChainConfiguration {
    #[builder(default = HEADER_CACHE_LIMIT, setter(doc = "Set the maximum number of headers kept in memory. Optional (default 512)."))]
    pub header_cache_limit: usize,
    #[builder(default = NUMBER_CACHE_LIMIT, setter(doc = "Set the maximum number of hash-to-number mappings kept in memory. Optional (default 2048)."))]
    pub number_cache_limit: usize,
    #[builder(default = TD_CACHE_LIMIT, setter(doc = "Set the maximum number of total difficulties kept in memory. Optional (default 1024)."))]
    pub td_cache_limit: usize,
}

impl Default for HeaderChainConfiguration {
    fn default() -> Self {
        HeaderChainConfiguration::builder().build()
    }
}

/// Outcome of [`HeaderChain::write_header`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteStatus {
    /// The header became the new head of the canonical chain.
    Canonical,
    /// The header was stored on a side chain. The head did not move.
    Side,
    /// The header was already stored. Nothing was written.
    Known,
}

/// Summary of one call to [`HeaderChain::insert_header_chain`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InsertStats {
    /// Number of headers written, canonical or not.
    pub processed: usize,
    /// Number of headers skipped because they were already stored.
    pub ignored: usize,
    pub last_hash: Option<CryptoHash>,
    pub last_number: Option<BlockHeight>,
    /// Whether the interrupt predicate stopped the insertion before every header was handled.
    pub interrupted: bool,
    pub elapsed: Duration,
}

/// The header chain: the set of stored headers, the canonical chain through them, and the pointer
/// to its head.
///
/// The key-value store is the source of truth for everything except the head pointer and the
/// genesis header, which are kept in memory and reloaded from the store on construction. Lookups go
/// through three LRU caches (headers, hash-to-number, and total difficulties). The caches are never
/// invalidated when a header is written, since a header never changes once it is stored, but entries
/// for rewound headers are removed by [`set_head`](Self::set_head).
pub struct HeaderChain<K: KVStore, E: ConsensusEngine> {
    kv_store: K,
    engine: E,

    genesis_header: ArcSwap<Header>,
    current_header: ArcSwap<Header>,

    header_cache: Cache<CryptoHash, Arc<Header>>,
    number_cache: Cache<CryptoHash, BlockHeight>,
    td_cache: Cache<CryptoHash, TotalDifficulty>,

    interrupt: Box<dyn Fn() -> bool + Send + Sync>,
    rng: Mutex<StdRng>,

    event_publisher: Option<Sender<Event>>,
}

impl<K: KVStore, E: ConsensusEngine> HeaderChain<K, E> {
    /// Open the header chain stored in `kv_store`, with caches of the default sizes.
    ///
    /// `interrupt` is polled between headers by [`insert_header_chain`](Self::insert_header_chain);
    /// when it returns `true` the insertion stops early.
    ///
    /// # Errors
    /// - [`HeaderChainError::NoGenesis`] if the store has no canonical header at height 0. Use
    ///   [`setup_genesis`](super::genesis::setup_genesis) to write one.
    /// - [`HeaderChainError::RandomSeed`] if the OS random number generator fails.
    /// - [`HeaderChainError::KVStoreError`] if reading the genesis header or the head pointer from
    ///   the store fails.
    pub fn new(
        kv_store: K,
        engine: E,
        interrupt: impl Fn() -> bool + Send + Sync + 'static,
    ) -> Result<HeaderChain<K, E>, HeaderChainError> {
        Self::with_configuration(kv_store, engine, interrupt, HeaderChainConfiguration::default())
    }

    /// Like [`new`](Self::new), but with caches sized according to `configuration`.
    pub fn with_configuration(
        kv_store: K,
        engine: E,
        interrupt: impl Fn() -> bool + Send + Sync + 'static,
        configuration: HeaderChainConfiguration,
    ) -> Result<HeaderChain<K, E>, HeaderChainError> {
        let rng = StdRng::from_rng(OsRng).map_err(HeaderChainError::RandomSeed)?;

        let genesis_number = BlockHeight::new(0);
        let genesis_hash = kv_store
            .try_read_canonical_hash(genesis_number)?
            .ok_or(HeaderChainError::NoGenesis)?;
        let genesis_header = kv_store
            .try_read_header(&genesis_hash, genesis_number)?
            .map(Arc::new)
            .ok_or(HeaderChainError::NoGenesis)?;

        let header_chain = HeaderChain {
            kv_store,
            engine,
            genesis_header: ArcSwap::new(Arc::clone(&genesis_header)),
            current_header: ArcSwap::new(Arc::clone(&genesis_header)),
            header_cache: Cache::new(configuration.header_cache_limit),
            number_cache: Cache::new(configuration.number_cache_limit),
            td_cache: Cache::new(configuration.td_cache_limit),
            interrupt: Box::new(interrupt),
            rng: Mutex::new(rng),
            event_publisher: None,
        };

        // Older stores only carry the head block hash.
        let head_hash = match header_chain.kv_store.try_read_head_header_hash()? {
            Some(hash) => Some(hash),
            None => header_chain.kv_store.try_read_head_block_hash()?,
        };
        let persisted_head = match head_hash {
            Some(hash) => header_chain.try_header_by_hash(&hash)?,
            None => None,
        };
        if let Some(head) = persisted_head {
            header_chain.current_header.store(head);
        }

        Ok(header_chain)
    }

    /// Publish events about changes to the chain on `event_publisher`.
    pub fn with_event_publisher(mut self, event_publisher: Sender<Event>) -> Self {
        self.event_publisher = Some(event_publisher);
        self
    }

    pub fn kv_store(&self) -> &K {
        &self.kv_store
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /* ↓↓↓ Lookups ↓↓↓ */

    /// Get the header with the given hash and number, whether it is canonical or not.
    pub fn header(&self, hash: &CryptoHash, number: BlockHeight) -> Option<Arc<Header>> {
        or_log(self.try_header(hash, number))
    }

    /// Like [`header`](Self::header), but a failed read of the store is returned as an error
    /// instead of reading as a missing header.
    pub fn try_header(
        &self,
        hash: &CryptoHash,
        number: BlockHeight,
    ) -> Result<Option<Arc<Header>>, KVStoreError> {
        if let Some(header) = self.header_cache.get(hash) {
            if header.number == number {
                return Ok(Some(header));
            }
        }
        let header = match self.kv_store.try_read_header(hash, number)? {
            Some(header) => Arc::new(header),
            None => return Ok(None),
        };
        self.header_cache.put(*hash, Arc::clone(&header));
        Ok(Some(header))
    }

    pub fn header_by_hash(&self, hash: &CryptoHash) -> Option<Arc<Header>> {
        let number = self.block_number(hash)?;
        self.header(hash, number)
    }

    /// Get the canonical header at `number`. Headers at `number` that are not on the canonical chain
    /// can only be found with [`header`](Self::header).
    pub fn header_by_number(&self, number: BlockHeight) -> Option<Arc<Header>> {
        let hash = self.kv_store.read_canonical_hash(number)?;
        self.header(&hash, number)
    }

    fn try_header_by_hash(&self, hash: &CryptoHash) -> Result<Option<Arc<Header>>, KVStoreError> {
        match self.try_block_number(hash)? {
            Some(number) => self.try_header(hash, number),
            None => Ok(None),
        }
    }

    pub fn block_number(&self, hash: &CryptoHash) -> Option<BlockHeight> {
        or_log(self.try_block_number(hash))
    }

    fn try_block_number(&self, hash: &CryptoHash) -> Result<Option<BlockHeight>, KVStoreError> {
        if let Some(number) = self.number_cache.get(hash) {
            return Ok(Some(number));
        }
        let number = self.kv_store.try_read_header_number(hash)?;
        if let Some(number) = number {
            self.number_cache.put(*hash, number);
        }
        Ok(number)
    }

    pub fn has_header(&self, hash: &CryptoHash, number: BlockHeight) -> bool {
        if self.number_cache.contains(hash) || self.header_cache.contains(hash) {
            return true;
        }
        self.kv_store.has_header(hash, number)
    }

    /// Get the total difficulty of the header with the given hash and number.
    pub fn td(&self, hash: &CryptoHash, number: BlockHeight) -> Option<TotalDifficulty> {
        or_log(self.try_td(hash, number))
    }

    fn try_td(
        &self,
        hash: &CryptoHash,
        number: BlockHeight,
    ) -> Result<Option<TotalDifficulty>, KVStoreError> {
        if let Some(td) = self.td_cache.get(hash) {
            return Ok(Some(td));
        }
        let td = self.kv_store.try_read_td(hash, number)?;
        if let Some(td) = td {
            self.td_cache.put(*hash, td);
        }
        Ok(td)
    }

    pub fn td_by_hash(&self, hash: &CryptoHash) -> Option<TotalDifficulty> {
        let number = self.block_number(hash)?;
        self.td(hash, number)
    }

    /// Get the hash and number of the header `ancestor` generations above the header with the given
    /// hash and number. `ancestor == 0` returns the header itself.
    ///
    /// Returns `None` if `ancestor` reaches below genesis or if an ancestor along the way is missing.
    pub fn ancestor(
        &self,
        hash: &CryptoHash,
        number: BlockHeight,
        ancestor: u64,
    ) -> Option<(CryptoHash, BlockHeight)> {
        if ancestor > number.int() {
            return None;
        }
        let target = BlockHeight::new(number.int() - ancestor);

        // Shortcut through the canonical index if the header is canonical.
        if self.kv_store.read_canonical_hash(number).as_ref() == Some(hash) {
            return self
                .kv_store
                .read_canonical_hash(target)
                .map(|ancestor_hash| (ancestor_hash, target));
        }

        let (mut hash, mut number) = (*hash, number);
        while number > target {
            let header = self.header(&hash, number)?;
            hash = header.parent_hash;
            number = number.parent()?;
        }
        Some((hash, number))
    }

    /// Get the hashes of up to `max` ancestors of the header with the given hash, parent first.
    ///
    /// The header's own hash is not included. The walk stops after genesis, or early if an ancestor
    /// is missing from the store.
    pub fn block_hashes_from_hash(&self, hash: &CryptoHash, max: usize) -> Vec<CryptoHash> {
        let mut header = match self.header_by_hash(hash) {
            Some(header) => header,
            None => return Vec::new(),
        };

        let mut chain = Vec::with_capacity(max);
        while chain.len() < max {
            let parent_number = match header.number.parent() {
                Some(parent_number) => parent_number,
                None => break,
            };
            let parent_hash = header.parent_hash;
            header = match self.header(&parent_hash, parent_number) {
                Some(parent) => parent,
                None => break,
            };
            chain.push(parent_hash);
        }
        chain
    }

    /* ↓↓↓ Head and Genesis ↓↓↓ */

    pub fn current_header(&self) -> Arc<Header> {
        self.current_header.load_full()
    }

    pub fn current_header_hash(&self) -> CryptoHash {
        self.current_header.load().hash()
    }

    pub fn genesis_header(&self) -> Arc<Header> {
        self.genesis_header.load_full()
    }

    /// Make `header` the head of the chain.
    ///
    /// The head hash is written into the store before the in-memory pointer is swapped, so the store
    /// never lags behind the pointer.
    ///
    /// # Precondition
    /// Must not run concurrently with another mutating method.
    pub fn set_current_header(&self, header: Header) -> Result<(), HeaderChainError> {
        let hash = header.hash();
        let mut wb = HeaderChainWriteBatch::<K::WriteBatch>::new();
        wb.set_head_header_hash(&hash)?;
        self.kv_store.write(wb.into_inner())?;

        let number = header.number;
        self.current_header.store(Arc::new(header));

        Event::publish(
            &self.event_publisher,
            Event::UpdateHead(UpdateHeadEvent {
                timestamp: SystemTime::now(),
                hash,
                number,
            }),
        );
        Ok(())
    }

    /// Rewind the chain so that its head is at height `target`.
    ///
    /// Every header above `target` on the current chain is deleted, as is every canonical index
    /// entry above `target`. `delete_callback`, if any, is called for every deleted header first,
    /// and may stage deletions of its own. All deletions are written in one atomic batch. If no
    /// header remains at or below `target` on the current chain (e.g., an ancestor is missing from
    /// the store), the head falls back to genesis. The new head hash is written last.
    ///
    /// Calling `set_head` with a `target` at or above the current height changes nothing but the
    /// persisted head hash.
    ///
    /// # Errors
    /// A failed read of the store while walking back is returned before anything is written, so
    /// the chain and its head are left as they were.
    ///
    /// # Precondition
    /// Must not run concurrently with another mutating method.
    pub fn set_head(
        &self,
        target: BlockHeight,
        mut delete_callback: Option<&mut DeleteCallback<'_, K::WriteBatch>>,
    ) -> Result<(), HeaderChainError> {
        let old_head = self.current_header();
        let old_height = old_head.number;

        let mut wb = HeaderChainWriteBatch::<K::WriteBatch>::new();
        let mut deleted = Vec::new();

        let mut cursor = Some(old_head);
        while let Some(header) = cursor.take() {
            if header.number <= target {
                cursor = Some(header);
                break;
            }
            let hash = header.hash();
            let number = header.number;
            if let Some(callback) = delete_callback.as_deref_mut() {
                callback(&mut wb, hash, number);
            }
            wb.delete_header(&hash, number);
            deleted.push(hash);

            cursor = match number.parent() {
                Some(parent_number) => self.try_header(&header.parent_hash, parent_number)?,
                None => None,
            };
        }

        let mut number = old_height;
        while number > target {
            wb.delete_canonical_hash(number);
            number = match number.parent() {
                Some(parent) => parent,
                None => break,
            };
        }

        self.kv_store.write(wb.into_inner())?;

        for hash in &deleted {
            self.header_cache.remove(hash);
            self.number_cache.remove(hash);
            self.td_cache.remove(hash);
        }

        let new_head = cursor.unwrap_or_else(|| self.genesis_header());
        let new_hash = new_head.hash();
        let new_height = new_head.number;
        self.current_header.store(new_head);

        let mut wb = HeaderChainWriteBatch::<K::WriteBatch>::new();
        wb.set_head_header_hash(&new_hash)?;
        self.kv_store.write(wb.into_inner())?;

        if !deleted.is_empty() {
            log::debug!(
                "Rewound header chain from {} to {} ({} headers deleted)",
                old_height,
                new_height,
                deleted.len()
            );
        }
        Event::publish(
            &self.event_publisher,
            Event::RewindChain(RewindChainEvent {
                timestamp: SystemTime::now(),
                from: old_height,
                to: new_height,
                deleted_headers: deleted.len(),
            }),
        );
        Ok(())
    }

    /// Replace the in-memory genesis header. The store is left untouched.
    ///
    /// Only meant for re-initializing the chain, e.g., when a fast sync moves its pivot.
    pub fn set_genesis(&self, header: Header) {
        self.genesis_header.store(Arc::new(header));
    }

    /// Drop every cache entry. Lookups made afterwards read through to the store.
    pub fn purge_caches(&self) {
        self.header_cache.clear();
        self.number_cache.clear();
        self.td_cache.clear();
    }

    /* ↓↓↓ Insertion ↓↓↓ */

    /// Store `header` and, if it carries more total difficulty than the current head, make it the
    /// new head of the canonical chain.
    ///
    /// When the new header wins, the canonical index is rewritten from the header back to the first
    /// ancestor that is already canonical, and every canonical entry above the header's height is
    /// deleted. An equal total difficulty is broken by a coin flip, so that competing miners do not
    /// all stick to their own chain.
    ///
    /// # Errors
    /// - [`HeaderChainError::UnknownAncestor`] if the total difficulty of the header's parent is
    ///   not stored (e.g., because the parent itself is not).
    /// - [`HeaderChainError::KVStoreError`] if a read of the store fails. Nothing is written.
    ///
    /// # Precondition
    /// Must not run concurrently with another mutating method.
    pub fn write_header(&self, header: &Header) -> Result<WriteStatus, HeaderChainError> {
        let hash = header.hash();
        let number = header.number;

        // Ask the store: a reader may re-cache a header that a rewind has just deleted.
        if self.kv_store.try_has_header(&hash, number)? {
            return Ok(WriteStatus::Known);
        }

        let unknown_ancestor = || HeaderChainError::UnknownAncestor {
            parent_hash: header.parent_hash,
            number,
        };
        let parent_number = number.parent().ok_or_else(unknown_ancestor)?;
        let parent_td = self
            .try_td(&header.parent_hash, parent_number)?
            .ok_or_else(unknown_ancestor)?;

        let head = self.current_header();
        let head_hash = head.hash();
        let local_td = self
            .try_td(&head_hash, head.number)?
            .ok_or(HeaderChainError::MissingHeadTotalDifficulty { hash: head_hash })?;
        let external_td = parent_td.extend(header.difficulty);

        let mut wb = HeaderChainWriteBatch::<K::WriteBatch>::new();
        wb.set_td(&hash, number, external_td)?;
        wb.set_header(header)?;

        let becomes_head = external_td > local_td
            || (external_td == local_td && self.rng.lock().gen_bool(0.5));

        if becomes_head {
            let mut stale = number.child();
            while let Some(stale_number) = stale {
                if self.kv_store.try_read_canonical_hash(stale_number)?.is_none() {
                    break;
                }
                wb.delete_canonical_hash(stale_number);
                stale = stale_number.child();
            }

            let (mut ancestor_hash, mut ancestor_number) = (header.parent_hash, parent_number);
            while self.kv_store.try_read_canonical_hash(ancestor_number)? != Some(ancestor_hash) {
                wb.set_canonical_hash(ancestor_number, &ancestor_hash)?;
                let ancestor = self
                    .try_header(&ancestor_hash, ancestor_number)?
                    .ok_or(HeaderChainError::UnknownAncestor {
                        parent_hash: ancestor_hash,
                        number: ancestor_number,
                    })?;
                ancestor_number = match ancestor_number.parent() {
                    Some(parent_number) => parent_number,
                    None => break,
                };
                ancestor_hash = ancestor.parent_hash;
            }

            wb.set_canonical_hash(number, &hash)?;
            wb.set_head_header_hash(&hash)?;
        }

        self.kv_store.write(wb.into_inner())?;

        let header = Arc::new(header.clone());
        self.header_cache.put(hash, Arc::clone(&header));
        self.number_cache.put(hash, number);
        self.td_cache.put(hash, external_td);

        let status = if becomes_head {
            self.current_header.store(header);
            WriteStatus::Canonical
        } else {
            WriteStatus::Side
        };

        Event::publish(
            &self.event_publisher,
            Event::InsertHeader(InsertHeaderEvent {
                timestamp: SystemTime::now(),
                hash,
                number,
                status,
            }),
        );
        Ok(status)
    }

    /// Check that `chain` is contiguous, and that every header in it passes the consensus engine's
    /// verification.
    ///
    /// The first header's parent is looked up in the store. It is fine for it to be missing there;
    /// whether a header without a known parent is acceptable is up to the engine.
    pub fn validate_header_chain(&self, chain: &[Header]) -> Result<(), HeaderChainError> {
        for (index, pair) in chain.windows(2).enumerate() {
            let (previous, header) = (&pair[0], &pair[1]);
            let previous_hash = previous.hash();
            let contiguous = previous.number.child() == Some(header.number)
                && header.parent_hash == previous_hash;
            if !contiguous {
                return Err(HeaderChainError::NonContiguousInsert {
                    index: index + 1,
                    previous_number: previous.number,
                    previous_hash,
                    number: header.number,
                    parent_hash: header.parent_hash,
                });
            }
        }

        for (index, header) in chain.iter().enumerate() {
            let stored_parent;
            let parent = if index == 0 {
                stored_parent = match header.number.parent() {
                    Some(parent_number) => self.try_header(&header.parent_hash, parent_number)?,
                    None => None,
                };
                stored_parent.as_deref()
            } else {
                Some(&chain[index - 1])
            };

            self.engine
                .verify_header(header, parent)
                .map_err(|source| HeaderChainError::ConsensusError { index, source })?;
        }

        Ok(())
    }

    /// Validate `chain`, then [write](Self::write_header) every header in it in order.
    ///
    /// The interrupt predicate is checked before each header; if it fires, the headers written so
    /// far stay written and the returned stats have `interrupted` set. `start` is when the caller
    /// began processing the chain, and is only used to report the elapsed time.
    ///
    /// # Precondition
    /// Must not run concurrently with another mutating method.
    pub fn insert_header_chain(
        &self,
        chain: &[Header],
        start: Instant,
    ) -> Result<InsertStats, HeaderChainError> {
        self.validate_header_chain(chain)?;

        let mut stats = InsertStats::default();
        for header in chain {
            if (self.interrupt)() {
                log::debug!("Premature abort during header chain processing");
                stats.interrupted = true;
                break;
            }

            match self.write_header(header)? {
                WriteStatus::Known => stats.ignored += 1,
                WriteStatus::Canonical | WriteStatus::Side => stats.processed += 1,
            }
            stats.last_hash = Some(header.hash());
            stats.last_number = Some(header.number);
        }
        stats.elapsed = start.elapsed();

        if let (Some(hash), Some(number)) = (stats.last_hash, stats.last_number) {
            log::info!(
                "Imported new block headers, count: {}, elapsed: {:?}, number: {}, hash: {}, \
                 ignored: {}",
                stats.processed,
                stats.elapsed,
                number,
                hash,
                stats.ignored
            );
        }
        Ok(stats)
    }
}

/// Error when constructing or mutating a [`HeaderChain`].
///
/// Lookups never fail: a header, number, or total difficulty that is not stored is returned as
/// `None`, and so is one that cannot be read (the failure is logged). The `try_` lookups and every
/// mutating method report failed reads of the store as [`HeaderChainError::KVStoreError`].
#[derive(Debug, thiserror::Error)]
pub enum HeaderChainError {
    #[error("no genesis header in the store")]
    NoGenesis,

    #[error("header at height {number} cannot be used as genesis")]
    NotGenesis { number: BlockHeight },

    #[error("genesis mismatch: store has {stored}, got {provided}")]
    GenesisMismatch {
        stored: CryptoHash,
        provided: CryptoHash,
    },

    #[error("failed to seed random number generator: {0}")]
    RandomSeed(#[source] rand::Error),

    #[error("unknown ancestor {parent_hash} of header at height {number}")]
    UnknownAncestor {
        parent_hash: CryptoHash,
        number: BlockHeight,
    },

    #[error("total difficulty of head header {hash} is not stored")]
    MissingHeadTotalDifficulty { hash: CryptoHash },

    #[error(
        "non-contiguous insert: item {index} is #{number} with parent {parent_hash}, \
         previous item is #{previous_number} [{previous_hash}]"
    )]
    NonContiguousInsert {
        index: usize,
        previous_number: BlockHeight,
        previous_hash: CryptoHash,
        number: BlockHeight,
        parent_hash: CryptoHash,
    },

    #[error("header {index} failed verification: {source}")]
    ConsensusError { index: usize, source: ConsensusError },

    #[error(transparent)]
    KVStoreError(#[from] KVStoreError),

    #[error(transparent)]
    KVSetError(#[from] KVSetError),
}
