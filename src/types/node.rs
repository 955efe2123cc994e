/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Peer descriptors stored by the [discovery database](crate::discovery).

use std::net::{IpAddr, Ipv6Addr};

use borsh::{BorshDeserialize, BorshSerialize};

use crate::types::data_types::NodeID;

/// Network endpoint of a peer.
///
/// IPv4 addresses are stored in their IPv4-mapped IPv6 form so that every endpoint has the same
/// fixed-size encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Endpoint {
    ip: [u8; 16],
    pub udp: u16,
    pub tcp: u16,
}

impl Endpoint {
    pub fn new(ip: IpAddr, udp: u16, tcp: u16) -> Endpoint {
        let ip = match ip {
            IpAddr::V4(v4) => v4.to_ipv6_mapped(),
            IpAddr::V6(v6) => v6,
        };
        Endpoint {
            ip: ip.octets(),
            udp,
            tcp,
        }
    }

    pub fn ip(&self) -> IpAddr {
        let v6 = Ipv6Addr::from(self.ip);
        match v6.to_ipv4_mapped() {
            Some(v4) => IpAddr::V4(v4),
            None => IpAddr::V6(v6),
        }
    }
}

/// A known peer: its identity and where to reach it.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Node {
    pub id: NodeID,
    pub endpoint: Endpoint,
}

impl Node {
    pub fn new(id: NodeID, endpoint: Endpoint) -> Node {
        Node { id, endpoint }
    }
}
