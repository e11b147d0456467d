//! Confirmation accounting against the canonical chain.

use std::sync::Arc;

use stela_db::types::NameStatus;
use stela_primitives::{l1::L1BlockCommitment, name::Name};
use stela_storage::IndexStorage;

/// Confirmation count of a block at `inclusion_height` seen from
/// `tip_height`: the containing block itself counts as one.
pub fn confirmations(tip_height: u64, inclusion_height: u64) -> u64 {
    (tip_height + 1).saturating_sub(inclusion_height)
}

/// Read-side view answering confirmation queries.
///
/// Holds no state of its own; every answer is derived from the chain cursor
/// and the queried inclusion block.
#[derive(Clone)]
#[expect(
    missing_debug_implementations,
    reason = "some inner types don't have Debug implementations"
)]
pub struct ConfirmationTracker {
    storage: Arc<IndexStorage>,
}

impl ConfirmationTracker {
    pub fn new(storage: Arc<IndexStorage>) -> Self {
        Self { storage }
    }

    /// Confirmations of a transaction included in `inclusion`, or 0 when
    /// that block is no longer on the canonical chain.
    pub async fn confirmations_of(&self, inclusion: &L1BlockCommitment) -> anyhow::Result<u64> {
        let chain = self.storage.chain();

        let Some((tip_height, _)) = chain.get_canonical_chain_tip_async().await? else {
            return Ok(0);
        };

        match chain
            .get_canonical_blockid_at_height_async(inclusion.height())
            .await?
        {
            Some(blkid) if blkid == *inclusion.blkid() => {
                Ok(confirmations(tip_height, inclusion.height()))
            }
            _ => Ok(0),
        }
    }

    /// Whether the name's registration has been promoted to final.
    ///
    /// Promotion itself happens as a side effect of the follower applying the
    /// block that crosses the threshold, not from polling here.
    pub async fn is_final(&self, name: &Name) -> anyhow::Result<bool> {
        let entry = self.storage.names().get_name_entry_async(name.clone()).await?;
        Ok(matches!(
            entry,
            Some(entry) if entry.status == NameStatus::Confirmed
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirmations_arithmetic() {
        assert_eq!(confirmations(100, 100), 1);
        assert_eq!(confirmations(102, 100), 3);
        assert_eq!(confirmations(99, 100), 0);
    }
}
