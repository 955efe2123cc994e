/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The storage-facing core of a blockchain full node.
//!
//! This crate keeps track of two things a node must get right across restarts, concurrent access,
//! and partial failures:
//! 1. The [header chain](header_chain): which headers are stored, which of them form the canonical
//!    chain, and which is its head. Supports rewinding the chain, and inserting headers with
//!    total-difficulty fork choice.
//! 2. The [discovery database](discovery): which peers are known, when they were last seen, and
//!    which of them are fresh enough to be used as seeds.
//!
//! Both are kept in a pluggable, ordered [key-value store](kv_store). Everything else a node does
//! (networking, consensus rules, transaction pools) lives outside this crate and talks to it through
//! the [`ConsensusEngine`](consensus::ConsensusEngine) trait and the types in [`types`].
//!
//! A [`Node`](node::Node) ties the components together and runs their background threads.

pub mod blockchain;

pub mod consensus;

pub mod discovery;

pub(crate) mod event_bus;

pub mod events;

pub mod header_chain;

pub mod kv_store;

pub mod logging;

pub mod node;

pub mod types;
