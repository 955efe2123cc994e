/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The consensus engine interface held by the [header chain](crate::header_chain::HeaderChain).
//!
//! The header chain knows nothing about what makes a header valid. Before inserting a batch of
//! headers, it asks the engine to [verify](ConsensusEngine::verify_header) each of them, and gives up
//! on the whole batch at the first header the engine rejects.

use crate::types::{data_types::CryptoHash, header::Header};

/// Methods that a type needs to implement to decide which headers may enter the header chain.
///
/// Implementations are shared between every thread that inserts headers, and so must be
/// `Send + Sync`.
pub trait ConsensusEngine: Send + Sync + 'static {
    /// Check whether `header` is valid as a child of `parent`.
    ///
    /// `parent` is `None` when the parent is not known, either because it is not stored, or because
    /// `header` is the genesis header.
    fn verify_header(&self, header: &Header, parent: Option<&Header>) -> Result<(), ConsensusError>;
}

/// Reasons for which a [`ConsensusEngine`] can reject a header.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConsensusError {
    /// The header's parent is needed to verify it, but is not known.
    #[error("unknown parent {parent_hash}")]
    UnknownParent { parent_hash: CryptoHash },

    /// The header breaks one of the engine's rules.
    #[error("invalid header: {reason}")]
    Invalid { reason: String },
}
