//! Chain-data collaborator abstraction.
//!
//! The follower only ever talks to this narrow trait; the production
//! implementation delegates to a `bitcoind` RPC client, tests use a scripted
//! mock.

use async_trait::async_trait;
use bitcoin::{consensus, Block, BlockHash, Transaction, Txid};
use bitcoind_async_client::{
    traits::{Broadcaster, Reader},
    Client,
};
use thiserror::Error;

/// Errors from the chain-data source.  The reader treats all of these as
/// transient and retries with backoff.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("chain fetch failed: {0}")]
    Network(String),

    #[error("no block at height {0}")]
    BlockNotFound(u64),

    #[error("unbroadcastable transaction: {0}")]
    MalformedTx(String),
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Snapshot of the remote node's best chain.
#[derive(Debug, Clone)]
pub struct ChainTipInfo {
    /// Best block height.
    pub blocks: u64,

    /// Best block hash.
    pub best_block_hash: BlockHash,
}

/// The chain-data collaborator the follower reads from and broadcasts
/// through.
#[async_trait]
pub trait L1Client: Sync + Send + 'static {
    /// Current best height and hash.
    async fn get_chain_tip(&self) -> ClientResult<ChainTipInfo>;

    /// Hash of the block at `height` on the node's best chain.
    async fn get_block_hash_at(&self, height: u64) -> ClientResult<BlockHash>;

    /// Full block at `height` on the node's best chain.
    async fn get_block_at(&self, height: u64) -> ClientResult<Block>;

    /// Submits a transaction to the network, returning its txid.
    async fn broadcast_tx(&self, tx: &Transaction) -> ClientResult<Txid>;
}

#[async_trait]
impl L1Client for Client {
    async fn get_chain_tip(&self) -> ClientResult<ChainTipInfo> {
        let info = Reader::get_blockchain_info(self)
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        let best_block_hash = info.best_block_hash;
        Ok(ChainTipInfo {
            blocks: info.blocks as u64,
            best_block_hash,
        })
    }

    async fn get_block_hash_at(&self, height: u64) -> ClientResult<BlockHash> {
        Reader::get_block_hash(self, height)
            .await
            .map_err(|e| ClientError::Network(e.to_string()))
    }

    async fn get_block_at(&self, height: u64) -> ClientResult<Block> {
        Reader::get_block_at(self, height)
            .await
            .map_err(|e| ClientError::Network(e.to_string()))
    }

    async fn broadcast_tx(&self, tx: &Transaction) -> ClientResult<Txid> {
        Broadcaster::send_raw_transaction(self, tx)
            .await
            .map_err(|e| ClientError::Network(e.to_string()))
    }
}

/// Deserializes and broadcasts raw transaction bytes, returning the txid.
pub async fn broadcast_raw_tx(client: &impl L1Client, tx_bytes: &[u8]) -> ClientResult<Txid> {
    let tx: Transaction = consensus::encode::deserialize(tx_bytes)
        .map_err(|e| ClientError::MalformedTx(e.to_string()))?;
    client.broadcast_tx(&tx).await
}
