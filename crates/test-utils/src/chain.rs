//! A scripted in-memory chain serving blocks like a bitcoind node, with
//! reorg injection for driving the follower in tests.

use std::sync::Arc;

use async_trait::async_trait;
use bitcoin::{
    block::{Header, Version as BlockVersion},
    hashes::Hash,
    Block, BlockHash, CompactTarget, Transaction, TxMerkleNode, Txid,
};
use parking_lot::Mutex;
use stela_btcio::{ChainTipInfo, ClientError, ClientResult, L1Client};

struct MockChainState {
    /// Blocks by height; index 0 is a synthetic genesis.
    blocks: Vec<Block>,

    /// Monotonic fake clock making every mined header unique.
    clock: u32,

    /// Everything submitted through `broadcast_tx`.
    broadcasted: Vec<Transaction>,
}

/// Grows deterministic fake blocks on demand and serves them like a node.
///
/// Cloning shares the underlying chain, so a test can keep one handle for
/// mining while the follower polls another.
#[derive(Clone)]
#[expect(
    missing_debug_implementations,
    reason = "bitcoin blocks make for unreadable debug output"
)]
pub struct MockChainClient {
    state: Arc<Mutex<MockChainState>>,
}

impl Default for MockChainClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChainClient {
    /// New chain holding only the synthetic genesis block at height 0.
    pub fn new() -> Self {
        let genesis = build_block(BlockHash::all_zeros(), 1, vec![]);
        Self {
            state: Arc::new(Mutex::new(MockChainState {
                blocks: vec![genesis],
                clock: 1,
                broadcasted: Vec::new(),
            })),
        }
    }

    /// Appends a block carrying `txs`, returning its hash.
    pub fn mine_block(&self, txs: Vec<Transaction>) -> BlockHash {
        let mut state = self.state.lock();
        state.clock += 1;
        let prev = state.blocks.last().expect("chain never empty").block_hash();
        let block = build_block(prev, state.clock, txs);
        let hash = block.block_hash();
        state.blocks.push(block);
        hash
    }

    /// Appends `count` empty blocks.
    pub fn mine_empty_blocks(&self, count: usize) -> Vec<BlockHash> {
        (0..count).map(|_| self.mine_block(vec![])).collect()
    }

    /// Current tip height and hash.
    pub fn tip(&self) -> (u64, BlockHash) {
        let state = self.state.lock();
        let block = state.blocks.last().expect("chain never empty");
        ((state.blocks.len() - 1) as u64, block.block_hash())
    }

    /// Replaces everything above `height` with a fresh branch, one block per
    /// entry of `branch_txs`.  For the follower to adopt it the new branch
    /// should be at least as long as what it replaces.
    pub fn reorg_to(&self, height: u64, branch_txs: Vec<Vec<Transaction>>) -> Vec<BlockHash> {
        {
            let mut state = self.state.lock();
            assert!((height as usize) < state.blocks.len(), "reorg point beyond tip");
            state.blocks.truncate(height as usize + 1);
            // Skew the clock so the branch headers differ from the ones they
            // replace.
            state.clock += 1000;
        }
        branch_txs.into_iter().map(|txs| self.mine_block(txs)).collect()
    }

    /// Everything submitted through `broadcast_tx`, in order.
    pub fn broadcasted(&self) -> Vec<Transaction> {
        self.state.lock().broadcasted.clone()
    }
}

fn build_block(prev: BlockHash, time: u32, txs: Vec<Transaction>) -> Block {
    let mut block = Block {
        header: Header {
            version: BlockVersion::TWO,
            prev_blockhash: prev,
            merkle_root: TxMerkleNode::all_zeros(),
            time,
            bits: CompactTarget::from_consensus(0x207fffff),
            nonce: 0,
        },
        txdata: txs,
    };
    if let Some(root) = block.compute_merkle_root() {
        block.header.merkle_root = root;
    }
    block
}

#[async_trait]
impl L1Client for MockChainClient {
    async fn get_chain_tip(&self) -> ClientResult<ChainTipInfo> {
        let state = self.state.lock();
        let best = state.blocks.last().expect("chain never empty");
        Ok(ChainTipInfo {
            blocks: (state.blocks.len() - 1) as u64,
            best_block_hash: best.block_hash(),
        })
    }

    async fn get_block_hash_at(&self, height: u64) -> ClientResult<BlockHash> {
        let state = self.state.lock();
        state
            .blocks
            .get(height as usize)
            .map(|b| b.block_hash())
            .ok_or(ClientError::BlockNotFound(height))
    }

    async fn get_block_at(&self, height: u64) -> ClientResult<Block> {
        let state = self.state.lock();
        state
            .blocks
            .get(height as usize)
            .cloned()
            .ok_or(ClientError::BlockNotFound(height))
    }

    async fn broadcast_tx(&self, tx: &Transaction) -> ClientResult<Txid> {
        let mut state = self.state.lock();
        state.broadcasted.push(tx.clone());
        Ok(tx.compute_txid())
    }
}
