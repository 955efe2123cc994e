/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Bookkeeping for the chain of block headers.
//!
//! A node stores every header it accepts, whether or not the header ends up on the canonical chain.
//! The [`HeaderChain`] keeps track of which of those headers form the canonical chain, and which of
//! them is its head:
//! - Headers are addressed by `(number, hash)` in the store. A separate index maps a hash back to its
//!   number, so that a header can also be found from its hash alone.
//! - The canonical chain is an index from height to hash. It only covers the path from genesis to the
//!   head.
//! - The head is held in memory behind an atomic pointer and mirrored into the store, so that it
//!   survives restarts.
//!
//! The layout of all of this in the key-value store is documented in [`variables`], and typed access
//! to it is provided by [`accessors`].
//!
//! ## Rewinding
//!
//! [`HeaderChain::set_head`] rewinds the chain to a given height. Callers that keep data next to
//! headers (e.g., [block bodies](crate::blockchain::BlockChain)) hook into the rewind with a
//! [`DeleteCallback`](chain::DeleteCallback), which stages the deletion of their data into the same
//! atomic write as the deletion of the headers.

pub mod accessors;

pub(crate) mod cache;

pub mod chain;

pub mod genesis;

pub mod variables;

pub use accessors::{HeaderChainWriteBatch, HeaderStoreGet, KVSetError};
pub use chain::{
    DeleteCallback, HeaderChain, HeaderChainConfiguration, HeaderChainError, InsertStats,
    WriteStatus,
};
pub use genesis::setup_genesis;
