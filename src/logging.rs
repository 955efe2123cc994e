/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Functions that log out events.
//!
//! The logs defined in this module are printed if the user enabled them via the node's
//! [spec](crate::node::NodeSpec).
//!
//! This crate logs using the [log](https://docs.rs/log/latest/log/) crate. To get these messages
//! printed onto a terminal or to a file, set up a
//! [logging implementation](https://docs.rs/log/latest/log/#available-logging-implementations).
//!
//! ## Log message format
//!
//! Log messages are CSVs (Comma Separated Values) with at least two values. The first two values are
//! always:
//! 1. The name of the [event](crate::events) in PascalCase (defined in this module as constants).
//! 2. The time the event was emitted (as number of seconds since the Unix Epoch).
//!
//! The rest of the values differ depending on the kind of event. For example, the following snippet
//! is how an [InsertHeader](crate::events::InsertHeaderEvent) is printed:
//!
//! ```text
//! InsertHeader, 1701329264, fNGCJyk, 12, Canonical
//! ```
//!
//! In the snippet:
//! - The third value is the first seven characters of the Base64 encoding of the header's hash.
//! - The fourth value is the height of the header.
//! - The fifth value is the [status](crate::header_chain::WriteStatus) the header was written with.

use std::time::{Duration, SystemTime};

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};

use crate::events::*;

// Names of each event in PascalCase for printing:
pub const UPDATE_HEAD: &str = "UpdateHead";
pub const REWIND_CHAIN: &str = "RewindChain";
pub const INSERT_HEADER: &str = "InsertHeader";

pub const EXPIRE_NODE: &str = "ExpireNode";
pub const SWEEP_NODES: &str = "SweepNodes";

/// Implemented by event types. Used to get a closure that logs the event.
pub(crate) trait Logger {
    /// Returns a pointer to the default logging handler for a given event type.
    fn get_logger() -> Box<dyn Fn(&Self) + Send>;
}

impl Logger for UpdateHeadEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |update_head_event: &UpdateHeadEvent| {
            log::info!(
                "{}, {}, {}, {}",
                UPDATE_HEAD,
                secs_since_unix_epoch(update_head_event.timestamp),
                first_seven_base64_chars(&update_head_event.hash.bytes()),
                update_head_event.number
            )
        };
        Box::new(logger)
    }
}

impl Logger for RewindChainEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |rewind_chain_event: &RewindChainEvent| {
            log::info!(
                "{}, {}, {}, {}, {}",
                REWIND_CHAIN,
                secs_since_unix_epoch(rewind_chain_event.timestamp),
                rewind_chain_event.from,
                rewind_chain_event.to,
                rewind_chain_event.deleted_headers
            )
        };
        Box::new(logger)
    }
}

impl Logger for InsertHeaderEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |insert_header_event: &InsertHeaderEvent| {
            log::info!(
                "{}, {}, {}, {}, {:?}",
                INSERT_HEADER,
                secs_since_unix_epoch(insert_header_event.timestamp),
                first_seven_base64_chars(&insert_header_event.hash.bytes()),
                insert_header_event.number,
                insert_header_event.status
            )
        };
        Box::new(logger)
    }
}

impl Logger for ExpireNodeEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |expire_node_event: &ExpireNodeEvent| {
            log::info!(
                "{}, {}, {}",
                EXPIRE_NODE,
                secs_since_unix_epoch(expire_node_event.timestamp),
                first_seven_base64_chars(expire_node_event.node.as_slice())
            )
        };
        Box::new(logger)
    }
}

impl Logger for SweepNodesEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |sweep_nodes_event: &SweepNodesEvent| {
            log::info!(
                "{}, {}, {}, {}",
                SWEEP_NODES,
                secs_since_unix_epoch(sweep_nodes_event.timestamp),
                sweep_nodes_event.expired,
                millis(sweep_nodes_event.duration)
            )
        };
        Box::new(logger)
    }
}

// Get a more readable representation of a bytesequence by base64-encoding it and taking the first 7 characters.
fn first_seven_base64_chars(bytes: &[u8]) -> String {
    let encoded = STANDARD_NO_PAD.encode(bytes);
    if encoded.len() > 7 {
        encoded[0..7].to_string()
    } else {
        encoded
    }
}

// Events are never timestamped before the epoch; if the clock says otherwise, print 0.
fn secs_since_unix_epoch(timestamp: SystemTime) -> u64 {
    timestamp
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|duration| duration.as_secs())
        .unwrap_or(0)
}

fn millis(duration: Duration) -> u128 {
    duration.as_millis()
}
