use stela_primitives::l1::L1BlockId;
use tracing::*;

use super::{
    event::L1Event,
    query::ReaderContext,
    BlockIndexer,
};
use crate::client::L1Client;

/// Routes a reader event into the indexer and the canonical-chain store.
///
/// Block effects are applied before the canonical chain is extended, so a
/// crash in between leaves an effect log that makes the eventual re-apply a
/// no-op; the cursor only ever advances past durably indexed blocks.
pub(crate) async fn handle_l1_event<C: L1Client>(
    event: L1Event,
    ctx: &ReaderContext<C>,
    indexer: &impl BlockIndexer,
) -> anyhow::Result<()> {
    match event {
        L1Event::RevertTo(block) => {
            let height = block.height();
            let tip = ctx.storage.chain().get_chain_tip_height_async().await?;
            if tip.is_some_and(|tip| tip > height) {
                indexer.undo_blocks_to(height).await?;
                ctx.storage.chain().revert_canonical_chain_async(height).await?;
                debug!(%height, "reverted canonical chain");
            } else {
                debug!(%height, "nothing stored above revert target");
            }
        }

        L1Event::BlockData(blockdata) => {
            let height = blockdata.block_num();

            // Bail out fast if we don't have to care.
            let genesis = ctx.params.genesis_height;
            if height < genesis {
                warn!(%height, %genesis, "ignoring block before genesis");
                return Ok(());
            }

            indexer.apply_block(&blockdata).await?;

            let blkid = L1BlockId::from(blockdata.block().block_hash());
            ctx.storage
                .chain()
                .extend_canonical_chain_async(&blkid, height)
                .await?;
            info!(%height, %blkid, "indexed new block");
        }
    }

    Ok(())
}
