/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Definitions of the events emitted by the header chain and the discovery database, for event
//! handling and logging.
//!
//! An event for a given action indicates that the action has been completed, i.e., that its effects
//! have been written into the key-value store.

use std::sync::mpsc::Sender;
use std::time::{Duration, SystemTime};

use crate::header_chain::WriteStatus;
use crate::types::data_types::{BlockHeight, CryptoHash, NodeID};

pub enum Event {
    // Header chain events.
    UpdateHead(UpdateHeadEvent),
    RewindChain(RewindChainEvent),
    InsertHeader(InsertHeaderEvent),
    // Discovery database events.
    ExpireNode(ExpireNodeEvent),
    SweepNodes(SweepNodesEvent),
}

impl Event {
    /// Send `event` on `event_publisher`, if there is one. Events are dropped silently once the
    /// receiving end has hung up.
    pub(crate) fn publish(event_publisher: &Option<Sender<Event>>, event: Event) {
        if let Some(event_publisher) = event_publisher {
            let _ = event_publisher.send(event);
        }
    }
}

/// The head of the header chain was set explicitly.
pub struct UpdateHeadEvent {
    pub timestamp: SystemTime,
    pub hash: CryptoHash,
    pub number: BlockHeight,
}

/// The header chain was rewound from height `from` to height `to`.
pub struct RewindChainEvent {
    pub timestamp: SystemTime,
    pub from: BlockHeight,
    pub to: BlockHeight,
    pub deleted_headers: usize,
}

pub struct InsertHeaderEvent {
    pub timestamp: SystemTime,
    pub hash: CryptoHash,
    pub number: BlockHeight,
    pub status: WriteStatus,
}

/// Every record of a node was deleted by the expiry sweep.
pub struct ExpireNodeEvent {
    pub timestamp: SystemTime,
    pub node: NodeID,
}

/// One run of the expiry sweep finished.
pub struct SweepNodesEvent {
    pub timestamp: SystemTime,
    pub expired: usize,
    pub duration: Duration,
}
