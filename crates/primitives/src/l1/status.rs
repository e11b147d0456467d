use arbitrary::Arbitrary;
use serde::{Deserialize, Serialize};

/// Data that reflects what's happening around L1.
#[derive(Debug, Clone, Serialize, Deserialize, Default, Arbitrary)]
pub struct L1Status {
    /// If the last time we tried to poll the client (as of `last_update`)
    /// we were successful.
    pub bitcoin_rpc_connected: bool,

    /// The last error message we received when trying to poll the client, if
    /// there was one.
    pub last_rpc_error: Option<String>,

    /// Current block height.
    pub cur_height: u64,

    /// Current tip block ID as string.
    pub cur_tip_blkid: String,

    /// UNIX millis time of the last time we got a new update from the L1 connector.
    pub last_update: u64,
}
