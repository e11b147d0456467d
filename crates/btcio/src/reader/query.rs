//! The main reader loop: polls the chain-data source for new blocks,
//! detecting and unwinding reorganizations along the way.

use std::{collections::VecDeque, sync::Arc, time::Duration};

use stela_config::btcio::ReaderConfig;
use stela_nametx::filter::{index_block, CommitmentCollector};
use stela_params::ProtocolParams;
use stela_primitives::l1::{L1BlockCommitment, L1BlockId};
use stela_status::StatusChannel;
use stela_storage::IndexStorage;
use thiserror::Error;
use tracing::*;

use super::{
    event::{BlockData, L1Event},
    handler::handle_l1_event,
    state::{ReaderState, SyncPhase},
    BlockIndexer,
};
use crate::{
    client::{ClientError, L1Client},
    status::{apply_status_updates, now_millis, L1StatusUpdate},
};

/// Errors out of a poll round.  Client-side failures are retried with
/// backoff; the rest end the task.
#[derive(Debug, Error)]
pub enum ReaderError {
    /// Transient failure talking to the chain-data source.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// A fetched block does not extend our local best; the next round's
    /// pivot search takes it from here.
    #[error("block at height {0} does not extend the local best block")]
    Discontinuity(u64),

    /// The rollback search went past the tracked window; the local view is
    /// too stale to recover without operator intervention.
    #[error("reorg reaches below tracked window (oldest tracked height {0})")]
    ReorgDepthExceeded(u64),

    /// Failure applying or persisting a block.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReaderError {
    /// Whether the reader should retry after backing off instead of dying.
    fn is_transient(&self) -> bool {
        matches!(self, ReaderError::Client(_) | ReaderError::Discontinuity(_))
    }
}

/// Context that encapsulates common items needed by the reader.
pub(crate) struct ReaderContext<C: L1Client> {
    /// Chain-data client.
    pub(crate) client: Arc<C>,

    /// Storage managers.
    pub(crate) storage: Arc<IndexStorage>,

    /// Reader loop tuning.
    pub(crate) config: Arc<ReaderConfig>,

    /// Protocol params.
    pub(crate) params: Arc<ProtocolParams>,

    /// Status transmitter.
    pub(crate) status_channel: StatusChannel,
}

/// The main task that initializes the reader state and starts following the
/// chain.  Runs until a non-transient error surfaces.
pub async fn l1_reader_task<C: L1Client>(
    client: Arc<C>,
    storage: Arc<IndexStorage>,
    config: Arc<ReaderConfig>,
    params: Arc<ProtocolParams>,
    status_channel: StatusChannel,
    indexer: Arc<impl BlockIndexer>,
) -> anyhow::Result<()> {
    let target_next_block = calculate_target_next_block(&storage, params.genesis_height).await?;

    let ctx = ReaderContext {
        client,
        storage,
        config,
        params,
        status_channel,
    };

    do_reader_task(ctx, target_next_block, indexer.as_ref()).await
}

/// Calculates the target next block to start polling from: one past our
/// cursor, or the genesis height on first start.
async fn calculate_target_next_block(
    storage: &IndexStorage,
    genesis_height: u64,
) -> anyhow::Result<u64> {
    let target_next_block = storage
        .chain()
        .get_canonical_chain_tip_async()
        .await?
        .map(|(height, _)| height + 1)
        .unwrap_or(genesis_height);
    assert!(target_next_block >= genesis_height);
    Ok(target_next_block)
}

/// Inner function that actually does the reading task.
async fn do_reader_task<C: L1Client>(
    ctx: ReaderContext<C>,
    target_next_block: u64,
    indexer: &impl BlockIndexer,
) -> anyhow::Result<()> {
    info!(%target_next_block, "started L1 reader task");

    let poll_dur = Duration::from_millis(ctx.config.client_poll_dur_ms);
    let mut state = init_reader_state(&ctx, target_next_block).await?;
    let best_blkid = *state.best_block();
    info!(%best_blkid, "initialized L1 reader state");

    let mut fail_count = 0u32;
    loop {
        let mut status_updates: Vec<L1StatusUpdate> = Vec::new();

        let delay = match poll_for_new_blocks(&ctx, &mut state, &mut status_updates, indexer).await
        {
            Ok(()) => {
                fail_count = 0;
                poll_dur
            }
            Err(err) if err.is_transient() => {
                fail_count += 1;
                let backoff = backoff_delay(&ctx.config, fail_count);
                warn!(%err, attempts = fail_count, ?backoff, "failed to poll chain source, backing off");
                status_updates.push(L1StatusUpdate::RpcConnected(false));
                status_updates.push(L1StatusUpdate::RpcError(err.to_string()));
                backoff
            }
            Err(err) => {
                error!(%err, "reader task failed");
                return Err(err.into());
            }
        };

        status_updates.push(L1StatusUpdate::LastUpdate(now_millis()));
        apply_status_updates(&status_updates, &ctx.status_channel);

        tokio::time::sleep(delay).await;
    }
}

/// Exponential backoff with the configured base and cap.
fn backoff_delay(config: &ReaderConfig, fail_count: u32) -> Duration {
    let exp = 1u64 << (fail_count.saturating_sub(1)).min(16);
    let millis = config.retry_base_ms.saturating_mul(exp).min(config.retry_max_ms);
    Duration::from_millis(millis)
}

/// Inits the reader state, backfilling recent block hashes so the pivot
/// search has something to compare against.  Heights we have indexed come
/// from our own canonical table (so a reorg that happened while we were down
/// is detected); the rest come from the client.
async fn init_reader_state<C: L1Client>(
    ctx: &ReaderContext<C>,
    target_next_block: u64,
) -> anyhow::Result<ReaderState> {
    debug!(%target_next_block, "initializing reader state");
    let mut init_queue = VecDeque::new();

    let lookback = (ctx.params.reorg_safe_depth * 2) as usize;
    let pre_genesis = ctx.params.genesis_height.saturating_sub(1);
    let target = target_next_block as i64;

    let chain_info = ctx.client.get_chain_tip().await?;
    let start_height = (target - lookback as i64)
        .max(pre_genesis as i64)
        .min(chain_info.blocks as i64) as u64;
    let end_height = chain_info
        .blocks
        .min(pre_genesis.max(target_next_block.saturating_sub(1)));
    debug!(%start_height, %end_height, "queried chain source, have init range");

    let mut real_cur_height = start_height;
    for height in start_height..=end_height {
        let blkid = match ctx
            .storage
            .chain()
            .get_canonical_blockid_at_height_async(height)
            .await?
        {
            Some(blkid) => blkid,
            None => L1BlockId::from(ctx.client.get_block_hash_at(height).await?),
        };
        debug!(%height, %blkid, "loaded recent L1 block");
        init_queue.push_back(blkid);
        real_cur_height = height;
    }

    Ok(ReaderState::new(real_cur_height + 1, lookback, init_queue))
}

/// Polls the chain to see if there's new blocks to look at, possibly
/// unwinding if there's a mixup and we have to go back.
async fn poll_for_new_blocks<C: L1Client>(
    ctx: &ReaderContext<C>,
    state: &mut ReaderState,
    status_updates: &mut Vec<L1StatusUpdate>,
    indexer: &impl BlockIndexer,
) -> Result<(), ReaderError> {
    state.set_phase(SyncPhase::Syncing);
    let chain_info = ctx.client.get_chain_tip().await?;
    status_updates.push(L1StatusUpdate::RpcConnected(true));
    let client_height = chain_info.blocks;
    let fresh_best_block = L1BlockId::from(chain_info.best_block_hash);

    if fresh_best_block == *state.best_block() {
        trace!("polled client, nothing to do");
        state.set_phase(SyncPhase::Synced);
        return Ok(());
    }

    // First, check for a reorg if there is one.
    if let Some((pivot_height, pivot_blkid)) = find_pivot_block(ctx.client.as_ref(), state).await? {
        if pivot_height < state.best_block_idx() {
            info!(%pivot_height, %pivot_blkid, "found apparent reorg");
            state.set_phase(SyncPhase::RollingBack);
            let block = L1BlockCommitment::new(pivot_height, pivot_blkid);
            state.rollback_to_height(pivot_height);

            // Unwind the indexed state before any forward progress resumes.
            handle_l1_event(L1Event::RevertTo(block), ctx, indexer).await?;
            return Ok(());
        }
    } else {
        let oldest = state.oldest_tracked_height();
        error!(%oldest, "unable to find pivot within tracked window");
        return Err(ReaderError::ReorgDepthExceeded(oldest));
    }

    debug!(%client_height, "have new blocks");

    // Now process each block we missed.
    let scan_start_height = state.next_height();
    for fetch_height in scan_start_height..=client_height {
        match fetch_and_process_block(ctx, fetch_height, state, status_updates, indexer).await {
            Ok(blkid) => {
                info!(%fetch_height, %blkid, "accepted new block");
            }
            Err(err) if err.is_transient() => {
                warn!(%fetch_height, %err, "failed to fetch new block");
                return Err(err);
            }
            Err(err) => return Err(err),
        };
    }

    if state.best_block_idx() >= client_height {
        state.set_phase(SyncPhase::Synced);
    }

    Ok(())
}

/// Finds the highest height where we agree with the client's chain.  If we
/// never find one within the tracked window then we're really screwed.
async fn find_pivot_block<C: L1Client>(
    client: &C,
    state: &ReaderState,
) -> Result<Option<(u64, L1BlockId)>, ClientError> {
    for (height, l1blkid) in state.iter_blocks_back() {
        // If at genesis, we can't reorg any farther.
        if height == 0 {
            return Ok(Some((height, *l1blkid)));
        }

        let queried_l1blkid = L1BlockId::from(client.get_block_hash_at(height).await?);
        trace!(%height, %l1blkid, %queried_l1blkid, "comparing blocks to find pivot");
        if queried_l1blkid == *l1blkid {
            return Ok(Some((height, *l1blkid)));
        }
    }

    Ok(None)
}

/// Fetches a block at the given height, extracts commitments, and feeds the
/// result through the event handler.  Only advances the local best after the
/// block's effects are durably recorded.
async fn fetch_and_process_block<C: L1Client>(
    ctx: &ReaderContext<C>,
    height: u64,
    state: &mut ReaderState,
    status_updates: &mut Vec<L1StatusUpdate>,
    indexer: &impl BlockIndexer,
) -> Result<L1BlockId, ReaderError> {
    let block = ctx.client.get_block_at(height).await?;

    let parent = L1BlockId::from(block.header.prev_blockhash);
    if parent != *state.best_block() {
        return Err(ReaderError::Discontinuity(height));
    }

    let txs = block.txdata.len();
    let entries = index_block(&block, CommitmentCollector::new, ctx.params.as_ref());
    let l1blkid = L1BlockId::from(block.block_hash());
    trace!(%height, %l1blkid, %txs, "fetched block from client");

    status_updates.push(L1StatusUpdate::CurHeight(height));
    status_updates.push(L1StatusUpdate::CurTip(l1blkid.to_string()));

    let blockdata = BlockData::new(height, block, entries);
    handle_l1_event(L1Event::BlockData(blockdata), ctx, indexer)
        .await
        .map_err(ReaderError::Other)?;

    let _deep = state.accept_new_block(l1blkid);

    Ok(l1blkid)
}
