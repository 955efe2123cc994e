/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Typed access to the records of known nodes, seed sampling, and the expiry sweep.

use std::{
    sync::mpsc::Sender,
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};

use borsh::{BorshDeserialize, BorshSerialize};
use rand::{rngs::OsRng, RngCore};

use crate::{
    events::{Event, ExpireNodeEvent, SweepNodesEvent},
    kv_store::{KVIter, KVStore, KVStoreError, WriteBatch},
    types::{
        data_types::NodeID,
        node::{Endpoint, Node},
    },
};

use super::{
    codec,
    database::NodeDBError,
    keys::{self, make_key, node_key, split_key},
};

// Seed sampling gives up after this many seeks per requested node.
const SEEKS_PER_SEED: usize = 5;

/// The records of every node known to the discovery layer, held in a key-value store.
///
/// This is the part of a [`NodeDB`](super::NodeDB) that is shared with its expiry thread. A missing
/// field reads as its zero value (`0`, the Unix epoch, `(0, 0)`, or `None`), never as an error.
#[derive(Clone)]
pub struct NodeRecords<K: KVStore> {
    pub(super) kv_store: K,
    pub(super) me: NodeID,
    pub(super) expiration: Duration,
    pub(super) event_publisher: Option<Sender<Event>>,
}

impl<K: KVStore> NodeRecords<K> {
    /// The id of the local node. Its records are never expired.
    pub fn me(&self) -> NodeID {
        self.me
    }

    /* ↓↓↓ Raw fields ↓↓↓ */

    /// Read the integer stored at `key`, or 0 if it is missing or malformed.
    pub fn fetch_i64(&self, key: &[u8]) -> i64 {
        self.kv_store
            .get(key)
            .and_then(|blob| codec::decode_i64(&blob))
            .unwrap_or(0)
    }

    // Like `fetch_i64`, but a failed read is an error rather than 0.
    fn try_fetch_i64(&self, key: &[u8]) -> Result<i64, KVStoreError> {
        Ok(self
            .kv_store
            .try_get(key)?
            .and_then(|blob| codec::decode_i64(&blob))
            .unwrap_or(0))
    }

    pub fn store_i64(&self, key: &[u8], n: i64) -> Result<(), NodeDBError> {
        Ok(self.kv_store.set(key, &codec::encode_i64(n))?)
    }

    fn fetch_borsh<T: BorshDeserialize>(&self, key: &[u8]) -> Option<T> {
        let blob = self.kv_store.get(key)?;
        match T::try_from_slice(&blob) {
            Ok(value) => Some(value),
            Err(err) => {
                log::warn!("Failed to deserialize discovery record at {:?}: {}", key, err);
                None
            }
        }
    }

    fn store_borsh<T: BorshSerialize>(&self, key: &[u8], value: &T) -> Result<(), NodeDBError> {
        let blob = value
            .try_to_vec()
            .map_err(|source| NodeDBError::SerializeValueError {
                key: key.to_vec(),
                source,
            })?;
        Ok(self.kv_store.set(key, &blob)?)
    }

    /* ↓↓↓ Nodes ↓↓↓ */

    pub fn node(&self, id: &NodeID) -> Option<Node> {
        self.fetch_borsh(&make_key(id, keys::DISCOVER_ROOT))
    }

    pub fn update_node(&self, node: &Node) -> Result<(), NodeDBError> {
        self.store_borsh(&make_key(&node.id, keys::DISCOVER_ROOT), node)
    }

    /// Delete every field of node `id` in one atomic write.
    ///
    /// The zero id owns no node keys, so deleting it is a no-op. If listing the node's keys fails,
    /// nothing is deleted and the error is returned.
    pub fn delete_node(&self, id: &NodeID) -> Result<(), NodeDBError> {
        let prefix = node_key(id, &[]);
        let mut wb = K::WriteBatch::new();
        let mut deleted = 0;
        for entry in self.kv_store.try_iter_prefix(&prefix) {
            let (key, _) = entry?;
            wb.delete(&key);
            deleted += 1;
        }
        if deleted > 0 {
            self.kv_store.write(wb)?;
        }
        Ok(())
    }

    /* ↓↓↓ Liveness ↓↓↓ */

    /// The last time node `id` was pinged, or the Unix epoch if it never was.
    pub fn last_ping(&self, id: &NodeID) -> SystemTime {
        codec::from_unix_secs(self.fetch_i64(&make_key(id, keys::DISCOVER_PING)))
    }

    pub fn update_last_ping(&self, id: &NodeID, instant: SystemTime) -> Result<(), NodeDBError> {
        self.store_i64(&make_key(id, keys::DISCOVER_PING), codec::unix_secs(instant))
    }

    /// The last time node `id` answered a ping, or the Unix epoch if it never did.
    pub fn last_pong(&self, id: &NodeID) -> SystemTime {
        codec::from_unix_secs(self.fetch_i64(&make_key(id, keys::DISCOVER_PONG)))
    }

    pub fn update_last_pong(&self, id: &NodeID, instant: SystemTime) -> Result<(), NodeDBError> {
        self.store_i64(&make_key(id, keys::DISCOVER_PONG), codec::unix_secs(instant))
    }

    /// Number of failed find-node requests to node `id` since it was last bonded with.
    pub fn find_fails(&self, id: &NodeID) -> u32 {
        u32::try_from(self.fetch_i64(&make_key(id, keys::DISCOVER_FIND_FAILS))).unwrap_or(0)
    }

    pub fn update_find_fails(&self, id: &NodeID, fails: u32) -> Result<(), NodeDBError> {
        self.store_i64(&make_key(id, keys::DISCOVER_FIND_FAILS), i64::from(fails))
    }

    /* ↓↓↓ Endpoints and tickets ↓↓↓ */

    /// The endpoint node `id` reported for itself.
    pub fn local_endpoint(&self, id: &NodeID) -> Option<Endpoint> {
        self.fetch_borsh(&make_key(id, keys::DISCOVER_LOCAL_ENDPOINT))
    }

    pub fn update_local_endpoint(
        &self,
        id: &NodeID,
        endpoint: &Endpoint,
    ) -> Result<(), NodeDBError> {
        self.store_borsh(&make_key(id, keys::DISCOVER_LOCAL_ENDPOINT), endpoint)
    }

    /// Topic registration tickets `(issued, used)` of node `id`.
    pub fn topic_reg_tickets(&self, id: &NodeID) -> (u32, u32) {
        self.kv_store
            .get(&make_key(id, keys::TOPIC_REG_TICKETS))
            .map_or((0, 0), |blob| codec::decode_tickets(&blob))
    }

    pub fn update_topic_reg_tickets(
        &self,
        id: &NodeID,
        issued: u32,
        used: u32,
    ) -> Result<(), NodeDBError> {
        Ok(self.kv_store.set(
            &make_key(id, keys::TOPIC_REG_TICKETS),
            &codec::encode_tickets(issued, used),
        )?)
    }

    /* ↓↓↓ Seed sampling ↓↓↓ */

    /// Pick up to `n` distinct nodes, other than the local node, that answered a ping within the
    /// last `max_age`.
    ///
    /// Nodes are found by seeking to random positions in the node keyspace and taking the first node
    /// at or after each position. Since node ids are uniformly distributed, this approximates
    /// uniform sampling without an index. At most `5 * n` seeks are made, so fewer than `n` nodes
    /// are returned when fresh nodes are scarce.
    pub fn query_seeds(&self, n: usize, max_age: Duration) -> Vec<Node> {
        let now = SystemTime::now();
        let mut nodes: Vec<Node> = Vec::with_capacity(n);
        let mut id = [0u8; NodeID::LEN];

        for _ in 0..n.saturating_mul(SEEKS_PER_SEED) {
            if nodes.len() >= n {
                break;
            }

            // Walk the first byte forward through the keyspace between seeks, so that consecutive
            // seeks spread out instead of clustering.
            let counter = id[0];
            OsRng.fill_bytes(&mut id);
            id[0] = counter.wrapping_add(id[0] % 16);

            let node = match self.next_node(&node_key(&NodeID::new(id), keys::DISCOVER_ROOT)) {
                Some(node) => node,
                None => {
                    id[0] = 0;
                    continue;
                }
            };

            if node.id == self.me {
                continue;
            }
            let age = now
                .duration_since(self.last_pong(&node.id))
                .unwrap_or(Duration::ZERO);
            if age > max_age {
                continue;
            }
            if nodes.iter().any(|picked| picked.id == node.id) {
                continue;
            }
            nodes.push(node);
        }
        nodes
    }

    // The first decodable node record at or after `seek`.
    fn next_node(&self, seek: &[u8]) -> Option<Node> {
        for (key, value) in self.kv_store.iter_from(seek) {
            if !key.starts_with(keys::ITEM_PREFIX) {
                return None;
            }
            let (id, field) = split_key(&key);
            if field != keys::DISCOVER_ROOT {
                continue;
            }
            match Node::try_from_slice(&value) {
                Ok(node) => return Some(node),
                Err(err) => log::warn!("Invalid node {}: {}", id, err),
            }
        }
        None
    }

    /* ↓↓↓ Expiry ↓↓↓ */

    /// Delete every node, other than the local node, that has not answered a ping within the
    /// expiration period. Returns the number of nodes deleted.
    ///
    /// Iterates over a snapshot of the store, so concurrent updates neither corrupt the sweep nor
    /// get corrupted by it. A failed read stops the sweep with an error; nodes whose last pong
    /// cannot be read are never deleted.
    pub fn expire_nodes(&self) -> Result<usize, NodeDBError> {
        let start = Instant::now();
        let threshold = SystemTime::now()
            .checked_sub(self.expiration)
            .unwrap_or(UNIX_EPOCH);

        let snapshot = self.kv_store.snapshot();
        let mut expired = 0;
        for entry in snapshot.try_iter_prefix(keys::ITEM_PREFIX) {
            let (key, _) = entry?;
            let (id, field) = split_key(&key);
            if field != keys::DISCOVER_ROOT || id.is_zero() || id == self.me {
                continue;
            }
            let last_pong = self.try_fetch_i64(&make_key(&id, keys::DISCOVER_PONG))?;
            if codec::from_unix_secs(last_pong) > threshold {
                continue;
            }

            self.delete_node(&id)?;
            expired += 1;
            Event::publish(
                &self.event_publisher,
                Event::ExpireNode(ExpireNodeEvent {
                    timestamp: SystemTime::now(),
                    node: id,
                }),
            );
        }

        Event::publish(
            &self.event_publisher,
            Event::SweepNodes(SweepNodesEvent {
                timestamp: SystemTime::now(),
                expired,
                duration: start.elapsed(),
            }),
        );
        Ok(expired)
    }
}
