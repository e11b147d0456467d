//! Extraction of protocol commitments from blocks.
//!
//! Scanning is visitor-based so different consumers can assemble different
//! outputs from the same pass; the standard consumer is
//! [`CommitmentCollector`], which just keeps decoded commitments in output
//! order.

use bitcoin::Block;
use stela_params::ProtocolParams;
use stela_primitives::buf::Buf32;
use tracing::trace;

use crate::codec::{decode_commitment_script, Commitment};

/// Visitor invoked for each commitment found while scanning one transaction.
pub trait TxVisitor {
    /// Output assembled from everything the visitor saw in one transaction.
    type Output;

    fn visit_commitment(&mut self, vout: u32, commitment: Commitment);

    /// Finishes the transaction; `None` means it carried nothing relevant.
    fn finalize(self) -> Option<Self::Output>;
}

/// Standard visitor collecting decoded commitments in output order.
#[derive(Debug, Clone, Default)]
pub struct CommitmentCollector {
    ops: Vec<(u32, Commitment)>,
}

impl CommitmentCollector {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TxVisitor for CommitmentCollector {
    type Output = Vec<(u32, Commitment)>;

    fn visit_commitment(&mut self, vout: u32, commitment: Commitment) {
        self.ops.push((vout, commitment));
    }

    fn finalize(self) -> Option<Self::Output> {
        if self.ops.is_empty() {
            None
        } else {
            Some(self.ops)
        }
    }
}

/// A transaction that carried protocol commitments, with its position within
/// the block for in-block tie breaking.
#[derive(Debug, Clone)]
pub struct RelevantTxEntry<T> {
    txid: Buf32,
    position: u32,
    item: T,
}

impl<T> RelevantTxEntry<T> {
    pub fn txid(&self) -> Buf32 {
        self.txid
    }

    pub fn position(&self) -> u32 {
        self.position
    }

    pub fn item(&self) -> &T {
        &self.item
    }
}

/// What the indexer consumes per relevant transaction.
pub type CommitmentTxEntry = RelevantTxEntry<Vec<(u32, Commitment)>>;

/// Runs every output of every transaction in the block through a fresh
/// visitor, returning entries for the transactions that mattered.
pub fn index_block<V: TxVisitor>(
    block: &Block,
    visitor_fn: impl Fn() -> V,
    params: &ProtocolParams,
) -> Vec<RelevantTxEntry<V::Output>> {
    block
        .txdata
        .iter()
        .enumerate()
        .filter_map(|(position, tx)| {
            let mut visitor = visitor_fn();
            for (vout, txout) in tx.output.iter().enumerate() {
                if let Some(commitment) = decode_commitment_script(params, &txout.script_pubkey) {
                    trace!(?commitment, %vout, "found commitment output");
                    visitor.visit_commitment(vout as u32, commitment);
                }
            }
            visitor.finalize().map(|item| RelevantTxEntry {
                txid: tx.compute_txid().into(),
                position: position as u32,
                item,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use bitcoin::{
        absolute::LockTime, block::Header, block::Version as BlockVersion, hashes::Hash,
        transaction::Version, Amount, BlockHash, CompactTarget, OutPoint, ScriptBuf, Sequence,
        Transaction, TxIn, TxMerkleNode, TxOut, Witness,
    };
    use stela_primitives::buf::Buf32;

    use super::*;
    use crate::codec::encode_commitment_script;

    fn plain_tx(value: u64) -> Transaction {
        Transaction {
            version: Version::TWO,
            lock_time: LockTime::ZERO,
            input: vec![TxIn {
                previous_output: OutPoint::null(),
                script_sig: ScriptBuf::new(),
                sequence: Sequence::MAX,
                witness: Witness::new(),
            }],
            output: vec![TxOut {
                value: Amount::from_sat(value),
                script_pubkey: ScriptBuf::new(),
            }],
        }
    }

    fn commitment_tx(params: &ProtocolParams, commitment: &Commitment) -> Transaction {
        let mut tx = plain_tx(5_000);
        tx.output.push(TxOut {
            value: Amount::ZERO,
            script_pubkey: encode_commitment_script(params, commitment).unwrap(),
        });
        tx
    }

    fn block_with(txs: Vec<Transaction>) -> Block {
        let mut block = Block {
            header: Header {
                version: BlockVersion::TWO,
                prev_blockhash: BlockHash::all_zeros(),
                merkle_root: TxMerkleNode::all_zeros(),
                time: 1,
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

    #[test]
    fn test_index_block_finds_commitments_in_order() {
        let params = ProtocolParams::regtest();
        let reg = Commitment::Registration {
            name: "alice".parse().unwrap(),
            owner: Buf32::new([1; 32]),
        };

        let block = block_with(vec![
            plain_tx(1),
            commitment_tx(&params, &reg),
            plain_tx(2),
        ]);
        let entries = index_block(&block, CommitmentCollector::new, &params);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].position(), 1);
        let (vout, found) = &entries[0].item()[0];
        assert_eq!(*vout, 1);
        assert_eq!(found, &reg);
    }

    #[test]
    fn test_index_block_skips_irrelevant_blocks() {
        let params = ProtocolParams::regtest();
        let block = block_with(vec![plain_tx(1), plain_tx(2)]);
        let entries = index_block(&block, CommitmentCollector::new, &params);
        assert!(entries.is_empty());
    }

    #[test]
    fn test_index_block_multiple_commitments_one_tx() {
        let params = ProtocolParams::regtest();
        let reg_a = Commitment::Registration {
            name: "alice".parse().unwrap(),
            owner: Buf32::new([1; 32]),
        };
        let reg_b = Commitment::Registration {
            name: "bob".parse().unwrap(),
            owner: Buf32::new([2; 32]),
        };

        let mut tx = commitment_tx(&params, &reg_a);
        tx.output.push(TxOut {
            value: Amount::ZERO,
            script_pubkey: encode_commitment_script(&params, &reg_b).unwrap(),
        });

        let block = block_with(vec![tx]);
        let entries = index_block(&block, CommitmentCollector::new, &params);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].item().len(), 2);
        assert_eq!(entries[0].item()[0].1, reg_a);
        assert_eq!(entries[0].item()[1].1, reg_b);
    }
}
