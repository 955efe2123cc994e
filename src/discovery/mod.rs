/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Persistence for the discovery layer: what is known about every peer, and when it was last seen.
//!
//! The [`NodeDB`] stores, per node:
//! - Its [record](crate::types::node::Node) (id and endpoint).
//! - When it was last pinged, and when it last answered.
//! - How many find-node requests to it have failed.
//! - The endpoint it reported for itself, and its topic registration tickets.
//!
//! Nodes that stop answering are deleted by a periodic [expiry sweep](NodeDB::ensure_expirer).
//! Live nodes can be sampled at random with [`query_seeds`](NodeRecords::query_seeds) to bootstrap
//! connectivity after a restart.
//!
//! The database is a cache of the network, not a source of truth. When its schema version changes,
//! the old contents are thrown away instead of migrated.

pub mod codec;

pub mod database;

pub mod keys;

pub mod records;

pub use database::{NodeDB, NodeDBConfiguration, NodeDBError, CLEANUP_CYCLE, NODE_EXPIRATION};
pub use keys::{make_key, split_key};
pub use records::NodeRecords;
