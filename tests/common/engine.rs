//! A consensus engine for tests that accepts every header, except at the heights it is told to
//! reject.

use std::collections::HashSet;

use headerchain_rs::{
    consensus::{ConsensusEngine, ConsensusError},
    types::{data_types::BlockHeight, header::Header},
};

#[derive(Default)]
pub(crate) struct TestEngine {
    reject: HashSet<BlockHeight>,
}

impl TestEngine {
    pub(crate) fn accept_all() -> TestEngine {
        TestEngine::default()
    }

    pub(crate) fn rejecting(heights: impl IntoIterator<Item = u64>) -> TestEngine {
        TestEngine {
            reject: heights.into_iter().map(BlockHeight::new).collect(),
        }
    }
}

impl ConsensusEngine for TestEngine {
    fn verify_header(
        &self,
        header: &Header,
        parent: Option<&Header>,
    ) -> Result<(), ConsensusError> {
        if self.reject.contains(&header.number) {
            return Err(ConsensusError::Invalid {
                reason: format!("height {} is rejected", header.number),
            });
        }
        match parent {
            Some(parent) if parent.number.child() != Some(header.number) => {
                Err(ConsensusError::Invalid {
                    reason: String::from("parent is not one height below"),
                })
            }
            Some(_) => Ok(()),
            None if header.is_genesis() => Ok(()),
            None => Err(ConsensusError::UnknownParent {
                parent_hash: header.parent_hash,
            }),
        }
    }
}
