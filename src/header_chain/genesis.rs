/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Writing the genesis header into a fresh store.

use crate::{
    kv_store::KVStore,
    types::{
        data_types::{BlockHeight, CryptoHash, TotalDifficulty},
        header::Header,
    },
};

use super::{
    accessors::{HeaderChainWriteBatch, HeaderStoreGet},
    chain::HeaderChainError,
};

/// Write `genesis` into `kv_store` as the canonical header at height 0, and point both head hashes
/// at it. Returns the genesis hash.
///
/// Does nothing if the same genesis header is already stored, so it is safe to call on every
/// startup.
///
/// # Errors
/// - [`HeaderChainError::NotGenesis`] if `genesis` is not at height 0.
/// - [`HeaderChainError::GenesisMismatch`] if a different genesis header is already stored.
pub fn setup_genesis<K: KVStore>(
    kv_store: &K,
    genesis: &Header,
) -> Result<CryptoHash, HeaderChainError> {
    if !genesis.is_genesis() {
        return Err(HeaderChainError::NotGenesis {
            number: genesis.number,
        });
    }

    let hash = genesis.hash();
    let number = BlockHeight::new(0);
    match kv_store.try_read_canonical_hash(number)? {
        Some(stored) if stored == hash => return Ok(hash),
        Some(stored) => {
            return Err(HeaderChainError::GenesisMismatch {
                stored,
                provided: hash,
            })
        }
        None => (),
    }

    let mut wb = HeaderChainWriteBatch::<K::WriteBatch>::new();
    wb.set_header(genesis)?;
    wb.set_td(&hash, number, TotalDifficulty::new(genesis.difficulty))?;
    wb.set_canonical_hash(number, &hash)?;
    wb.set_head_header_hash(&hash)?;
    wb.set_head_block_hash(&hash)?;
    kv_store.write(wb.into_inner())?;

    log::info!("Wrote genesis header {}", hash);
    Ok(hash)
}
