//! Discovery fixtures.

use std::net::{IpAddr, Ipv4Addr};

use ed25519_dalek::SigningKey;
use headerchain_rs::types::{
    data_types::NodeID,
    node::{Endpoint, Node},
};
use rand_core::OsRng;

/// A fresh node id, taken from a newly generated Ed25519 verifying key.
pub(crate) fn random_node_id() -> NodeID {
    let mut csprg = OsRng {};
    NodeID::from(&SigningKey::generate(&mut csprg).verifying_key())
}

pub(crate) fn random_node(port: u16) -> Node {
    Node::new(
        random_node_id(),
        Endpoint::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)), port, port),
    )
}
