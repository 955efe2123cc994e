/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Layout of the discovery database's keyspace.
//!
//! Every field of every node lives at `ITEM_PREFIX ++ node id ++ field`. Fields that belong to no
//! node in particular are stored under the reserved all-zero id, which maps to the bare field name.
//! The schema version lives at the bare key [`VERSION_KEY`].

use crate::types::data_types::NodeID;

pub const VERSION_KEY: &[u8] = b"version";
pub const ITEM_PREFIX: &[u8] = b"n:";

// Per-node fields.
pub const DISCOVER_ROOT: &[u8] = b":discover";
pub const DISCOVER_PING: &[u8] = b":discover:lastping";
pub const DISCOVER_PONG: &[u8] = b":discover:lastpong";
pub const DISCOVER_FIND_FAILS: &[u8] = b":discover:findfail";
pub const DISCOVER_LOCAL_ENDPOINT: &[u8] = b":discover:localendpoint";
pub const TOPIC_REG_TICKETS: &[u8] = b":tickets";

/// Build the key of `field` of node `id`.
pub fn make_key(id: &NodeID, field: &[u8]) -> Vec<u8> {
    if id.is_zero() {
        return field.to_vec();
    }
    node_key(id, field)
}

/// Split `key` back into the node id and field it was [made](make_key) from. Keys outside of the
/// node keyspace split into the zero id and the whole key.
pub fn split_key(key: &[u8]) -> (NodeID, &[u8]) {
    let item = match key.strip_prefix(ITEM_PREFIX) {
        Some(item) if item.len() >= NodeID::LEN => item,
        _ => return (NodeID::zero(), key),
    };

    let mut id = [0u8; NodeID::LEN];
    id.copy_from_slice(&item[..NodeID::LEN]);
    (NodeID::new(id), &item[NodeID::LEN..])
}

// Like `make_key`, but never special-cases the zero id.
pub(crate) fn node_key(id: &NodeID, field: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(ITEM_PREFIX.len() + NodeID::LEN + field.len());
    key.extend_from_slice(ITEM_PREFIX);
    key.extend_from_slice(id.as_slice());
    key.extend_from_slice(field);
    key
}
