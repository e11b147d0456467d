//! The chain follower: keeps a cursor on the L1 chain, emits new canonical
//! blocks to the indexer, and unwinds it across reorganizations.

pub mod event;
mod handler;
pub mod query;
mod state;

use async_trait::async_trait;
pub use event::{BlockData, L1Event};
pub use query::{l1_reader_task, ReaderError};
pub use state::SyncPhase;

/// Consumer of canonical-chain events; the registration indexer implements
/// this.
#[async_trait]
pub trait BlockIndexer: Sync + Send + 'static {
    /// Applies a new canonical block's commitments.  Must be a no-op when the
    /// block was already applied.
    async fn apply_block(&self, blockdata: &BlockData) -> anyhow::Result<()>;

    /// Undoes every indexed block above `height`, deepest-first.
    async fn undo_blocks_to(&self, height: u64) -> anyhow::Result<()>;
}
