/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Types that exist only to store bytes, and do not have any major "active" behavior.

use std::{
    fmt::{self, Debug, Display, Formatter},
    hash::Hash,
};

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use borsh::{BorshDeserialize, BorshSerialize};
use ed25519_dalek::VerifyingKey;

/// Height of a header in the header chain.
///
/// Starts at 0 for the genesis header and increases by 1 for every header linked to its parent
/// through [`parent_hash`](crate::types::header::Header::parent_hash).
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    BorshDeserialize,
    BorshSerialize,
)]
pub struct BlockHeight(u64);

impl BlockHeight {
    /// Create a new `BlockHeight` with an `int` inner value.
    pub const fn new(int: u64) -> Self {
        Self(int)
    }

    /// Get the inner `u64` value of this `BlockHeight`.
    pub const fn int(&self) -> u64 {
        self.0
    }

    /// Get the big-endian representation of the inner `u64` value of this `BlockHeight`.
    ///
    /// Big-endian keeps keys that embed heights sorted by height in an ordered key-value store.
    pub fn to_be_bytes(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    /// Get the height of this height's parent, or `None` if this is the genesis height.
    pub fn parent(&self) -> Option<BlockHeight> {
        self.0.checked_sub(1).map(BlockHeight)
    }

    /// Get the height of this height's children, or `None` at `u64::MAX`.
    pub fn child(&self) -> Option<BlockHeight> {
        self.0.checked_add(1).map(BlockHeight)
    }

    pub const fn is_genesis(&self) -> bool {
        self.0 == 0
    }
}

impl Display for BlockHeight {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// 32-byte cryptographic hash.
///
/// Header hashes are always SHA256 hashes (see [`Header::hash`](crate::types::header::Header::hash)).
/// State roots may come from any 32-byte hash function.
#[derive(
    Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, BorshDeserialize, BorshSerialize,
)]
pub struct CryptoHash([u8; 32]);

impl CryptoHash {
    /// Create a new `CryptoHash` wrapping `bytes`.
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the inner `[u8; 32]` value of this `CryptoHash`.
    pub const fn bytes(&self) -> [u8; 32] {
        self.0
    }
}

impl From<[u8; 32]> for CryptoHash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl Display for CryptoHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", STANDARD_NO_PAD.encode(self.0))
    }
}

impl Debug for CryptoHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "CryptoHash({})", self)
    }
}

/// Sum of the difficulties of a header and all of its ancestors.
///
/// The header chain treats the chain with the highest total difficulty as canonical.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, BorshDeserialize, BorshSerialize,
)]
pub struct TotalDifficulty(u128);

impl TotalDifficulty {
    pub const fn new(int: u128) -> Self {
        Self(int)
    }

    pub const fn int(&self) -> u128 {
        self.0
    }

    /// Extend this total difficulty by the difficulty of one more header. Saturates instead of
    /// overflowing.
    pub fn extend(&self, difficulty: u128) -> TotalDifficulty {
        TotalDifficulty(self.0.saturating_add(difficulty))
    }
}

impl Display for TotalDifficulty {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// Fixed-length identity of a peer in the discovery layer.
///
/// Node identities are 32 bytes long, which is exactly the length of an Ed25519 public key, so a
/// node's identity can be taken directly from its [`VerifyingKey`].
///
/// The all-zero `NodeID` is reserved: keys built for it in the discovery database carry no identity
/// prefix at all and are used for process-global fields.
#[derive(
    Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, BorshDeserialize, BorshSerialize,
)]
pub struct NodeID([u8; 32]);

impl NodeID {
    pub const LEN: usize = 32;

    /// Create a new `NodeID` wrapping `bytes`.
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The reserved all-zero identity.
    pub const fn zero() -> Self {
        Self([0u8; 32])
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Get the inner `[u8; 32]` value of this `NodeID`.
    pub const fn bytes(&self) -> [u8; 32] {
        self.0
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl From<&VerifyingKey> for NodeID {
    fn from(verifying_key: &VerifyingKey) -> Self {
        Self(verifying_key.to_bytes())
    }
}

impl Display for NodeID {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", STANDARD_NO_PAD.encode(self.0))
    }
}

impl Debug for NodeID {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "NodeID({})", self)
    }
}
