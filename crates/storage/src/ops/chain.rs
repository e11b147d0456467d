//! Canonical-chain operation interface.

use stela_db::traits::ChainDatabase;
use stela_primitives::l1::L1BlockId;

use crate::inst_ops;

inst_ops! {
    (<D: ChainDatabase> => ChainDataOps) {
        set_canonical_chain_entry(height: u64, blockid: L1BlockId) => ();
        remove_canonical_chain_entries(start_height: u64, end_height: u64) => ();
        get_canonical_chain_tip() => Option<(u64, L1BlockId)>;
        get_canonical_blockid_at_height(height: u64) => Option<L1BlockId>;
    }
}
