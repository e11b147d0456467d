use bitcoin::Amount;
use serde::{Deserialize, Serialize};
use stela_primitives::l1::MagicBytes;

use crate::serde_helpers::{serde_amount_sat, serde_magic_bytes};

/// Commitment wire-format version this implementation speaks.
pub const COMMITMENT_VERSION: u8 = 1;

/// Parameters every node indexing the same name layer must agree on.
///
/// These are part of the protocol identity: two nodes with different values
/// here will materialize different name tables from the same chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolParams {
    /// Magic bytes tagging commitment outputs.
    #[serde(with = "serde_magic_bytes")]
    pub magic_bytes: MagicBytes,

    /// Commitment format version accepted when decoding.
    #[serde(default = "default_commitment_version")]
    pub commitment_version: u8,

    /// Blocks on top of a registration's block before it is treated as final.
    pub required_confirmations: u64,

    /// How many recent blocks the follower keeps for reorg detection; a
    /// reorganization reaching deeper than this window is fatal and needs
    /// operator intervention.
    pub reorg_safe_depth: u64,

    /// First L1 height the indexer cares about.
    pub genesis_height: u64,

    /// Value attached to the appended commitment output. OP_RETURN outputs
    /// are provably unspendable, so this stays zero on every real network.
    #[serde(with = "serde_amount_sat", default = "default_commitment_value")]
    pub commitment_output_value: Amount,
}

fn default_commitment_version() -> u8 {
    COMMITMENT_VERSION
}

fn default_commitment_value() -> Amount {
    Amount::ZERO
}

impl ProtocolParams {
    /// Parameters suitable for regtest and unit tests: short confirmation
    /// window, shallow reorg horizon.
    pub fn regtest() -> Self {
        Self {
            magic_bytes: MagicBytes::new(*b"STLA"),
            commitment_version: COMMITMENT_VERSION,
            required_confirmations: 3,
            reorg_safe_depth: 8,
            genesis_height: 1,
            commitment_output_value: Amount::ZERO,
        }
    }
}
