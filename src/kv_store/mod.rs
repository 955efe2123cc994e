/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Pluggable persistence.
//!
//! - Every durable component of the node (the [header chain](crate::header_chain) and the
//!   [discovery database](crate::discovery)) keeps its state in an ordered key-value store.
//! - This crate merely requires that whatever is provided as a persistence mechanism implements the
//!   abstract functionality of a key-value store with atomic, batched writes and forward iteration.
//! - This abstract functionality is made concrete by the traits defined in the [`pluggables`] module.
//! - Two implementations ship with the crate: [`MemDB`](mem_db::MemDB), which keeps everything in
//!   memory, and [`SledDB`](sled_db::SledDB), which keeps everything on disk.
//!
//! Each component owns its part of the keyspace entirely. Two components may share a store as long
//! as their key prefixes do not collide.

pub mod mem_db;

pub mod pluggables;

pub mod sled_db;

pub use mem_db::MemDB;
pub use pluggables::{KVEntries, KVGet, KVIter, KVStore, KVStoreError, WriteBatch};
pub use sled_db::SledDB;
