//! Aggregation of status updates published by the reader.

use std::time::{SystemTime, UNIX_EPOCH};

use stela_status::StatusChannel;

/// Deferred modifications to the shared `L1Status`, batched per poll round.
#[derive(Debug, Clone)]
pub enum L1StatusUpdate {
    CurHeight(u64),
    CurTip(String),
    LastUpdate(u64),
    RpcConnected(bool),
    RpcError(String),
}

pub(crate) fn apply_status_updates(status_updates: &[L1StatusUpdate], channel: &StatusChannel) {
    channel.update_l1_status(|status| {
        for update in status_updates {
            match update {
                L1StatusUpdate::CurHeight(height) => status.cur_height = *height,
                L1StatusUpdate::CurTip(tip) => status.cur_tip_blkid = tip.clone(),
                L1StatusUpdate::LastUpdate(epoch_time) => status.last_update = *epoch_time,
                L1StatusUpdate::RpcConnected(connected) => {
                    status.bitcoin_rpc_connected = *connected;
                }
                L1StatusUpdate::RpcError(err) => status.last_rpc_error = Some(err.clone()),
            }
        }
    });
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
