use bitcoin::Block;
use stela_nametx::filter::CommitmentTxEntry;
use stela_primitives::l1::{L1BlockCommitment, L1BlockId};

/// L1 events that we observe and want the indexing task to work on.
#[derive(Clone, Debug)]
#[allow(clippy::large_enum_variant, reason = "blocks dominate either way")]
pub enum L1Event {
    /// A new canonical block together with the commitments found inside it.
    BlockData(BlockData),

    /// The chain we were following was superseded; unwind down to this block
    /// before resuming.
    RevertTo(L1BlockCommitment),
}

/// Stores the bitcoin block and interpretations of relevant transactions
/// within the block.
#[derive(Clone, Debug)]
pub struct BlockData {
    /// Block number.
    block_num: u64,

    /// Raw block data.
    block: Block,

    /// Transactions in the block that carry protocol commitments.
    relevant_txs: Vec<CommitmentTxEntry>,
}

impl BlockData {
    pub fn new(block_num: u64, block: Block, relevant_txs: Vec<CommitmentTxEntry>) -> Self {
        Self {
            block_num,
            block,
            relevant_txs,
        }
    }

    pub fn block_num(&self) -> u64 {
        self.block_num
    }

    pub fn block(&self) -> &Block {
        &self.block
    }

    pub fn relevant_txs(&self) -> &[CommitmentTxEntry] {
        &self.relevant_txs
    }

    /// Height/id pair of this block.
    pub fn block_commitment(&self) -> L1BlockCommitment {
        L1BlockCommitment::new(self.block_num, L1BlockId::from(self.block.block_hash()))
    }
}
