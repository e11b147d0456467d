//! Caching manager of the canonical-chain view (the chain cursor).

use std::sync::Arc;

use stela_db::{traits::ChainDatabase, DbError, DbResult};
use stela_primitives::l1::L1BlockId;
use threadpool::ThreadPool;
use tracing::error;

use crate::{cache::CacheTable, ops};

#[expect(
    missing_debug_implementations,
    reason = "some inner types don't have Debug implementations"
)]
pub struct ChainManager {
    ops: ops::chain::ChainDataOps,
    blockheight_cache: CacheTable<u64, Option<L1BlockId>>,
}

impl ChainManager {
    /// Create new instance of [`ChainManager`].
    pub fn new(pool: ThreadPool, db: Arc<impl ChainDatabase + 'static>) -> Self {
        let ops = ops::chain::Context::new(db).into_ops(pool);
        let blockheight_cache = CacheTable::new(64.try_into().expect("nonzero cache size"));
        Self {
            ops,
            blockheight_cache,
        }
    }

    /// Append [`L1BlockId`] to the tracked canonical chain at the specified
    /// height.  The height must extend the current tip by exactly one, except
    /// for the very first entry.
    pub fn extend_canonical_chain(&self, blockid: &L1BlockId, height: u64) -> DbResult<()> {
        if let Some((tip_height, _tip_blockid)) = self.get_canonical_chain_tip()? {
            if height != tip_height + 1 {
                error!(expected = %(tip_height + 1), got = %height, "attempted to extend canonical chain out of order");
                return Err(DbError::OooInsert("canonical_chain", height));
            }
        }

        self.blockheight_cache.purge_blocking(&height);
        self.ops.set_canonical_chain_entry_blocking(height, *blockid)
    }

    /// Append [`L1BlockId`] to the tracked canonical chain at the specified
    /// height.  The height must extend the current tip by exactly one, except
    /// for the very first entry.
    pub async fn extend_canonical_chain_async(
        &self,
        blockid: &L1BlockId,
        height: u64,
    ) -> DbResult<()> {
        if let Some((tip_height, _tip_blockid)) = self.get_canonical_chain_tip_async().await? {
            if height != tip_height + 1 {
                error!(expected = %(tip_height + 1), got = %height, "attempted to extend canonical chain out of order");
                return Err(DbError::OooInsert("canonical_chain", height));
            }
        }

        self.blockheight_cache.purge_async(&height).await;
        self.ops
            .set_canonical_chain_entry_async(height, *blockid)
            .await
    }

    /// Reverts the tracked canonical chain to `height`, dropping everything
    /// above it.  `height` must not exceed the current tip.
    pub fn revert_canonical_chain(&self, height: u64) -> DbResult<()> {
        let Some((tip_height, _)) = self.ops.get_canonical_chain_tip_blocking()? else {
            // no chain to revert
            // but clear cache anyway for sanity
            self.blockheight_cache.blocking_clear();
            return Err(DbError::CanonicalChainEmpty);
        };

        if height > tip_height {
            return Err(DbError::InvalidRevertHeight(height, tip_height));
        }

        // clear items from cache for range height+1..=tip_height
        self.blockheight_cache
            .purge_if_blocking(|h| height < *h && *h <= tip_height);

        self.ops
            .remove_canonical_chain_entries_blocking(height + 1, tip_height)
    }

    /// Reverts the tracked canonical chain to `height`, dropping everything
    /// above it.  `height` must not exceed the current tip.
    pub async fn revert_canonical_chain_async(&self, height: u64) -> DbResult<()> {
        let Some((tip_height, _)) = self.ops.get_canonical_chain_tip_async().await? else {
            self.blockheight_cache.blocking_clear();
            return Err(DbError::CanonicalChainEmpty);
        };

        if height > tip_height {
            return Err(DbError::InvalidRevertHeight(height, tip_height));
        }

        // clear items from cache for range height+1..=tip_height
        self.blockheight_cache
            .purge_if_async(|h| height < *h && *h <= tip_height)
            .await;

        self.ops
            .remove_canonical_chain_entries_async(height + 1, tip_height)
            .await
    }

    // Get tracked canonical chain tip height and blockid.
    pub fn get_canonical_chain_tip(&self) -> DbResult<Option<(u64, L1BlockId)>> {
        self.ops.get_canonical_chain_tip_blocking()
    }

    // Get tracked canonical chain tip height and blockid.
    pub async fn get_canonical_chain_tip_async(&self) -> DbResult<Option<(u64, L1BlockId)>> {
        self.ops.get_canonical_chain_tip_async().await
    }

    // Get tracked canonical chain tip height.
    pub fn get_chain_tip_height(&self) -> DbResult<Option<u64>> {
        Ok(self.get_canonical_chain_tip()?.map(|(height, _)| height))
    }

    // Get tracked canonical chain tip height.
    pub async fn get_chain_tip_height_async(&self) -> DbResult<Option<u64>> {
        Ok(self
            .get_canonical_chain_tip_async()
            .await?
            .map(|(height, _)| height))
    }

    // Get [`L1BlockId`] at `height` in the tracked canonical chain.
    pub fn get_canonical_blockid_at_height(&self, height: u64) -> DbResult<Option<L1BlockId>> {
        self.blockheight_cache.get_or_fetch_blocking(&height, || {
            self.ops.get_canonical_blockid_at_height_blocking(height)
        })
    }

    // Get [`L1BlockId`] at `height` in the tracked canonical chain.
    pub async fn get_canonical_blockid_at_height_async(
        &self,
        height: u64,
    ) -> DbResult<Option<L1BlockId>> {
        self.blockheight_cache
            .get_or_fetch(&height, || {
                self.ops.get_canonical_blockid_at_height_chan(height)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use stela_db::stubs::StubChainDb;
    use stela_primitives::buf::Buf32;

    use super::*;

    fn blkid(byte: u8) -> L1BlockId {
        L1BlockId::from(Buf32::new([byte; 32]))
    }

    fn manager() -> ChainManager {
        let pool = threadpool::Builder::new().num_threads(2).build();
        ChainManager::new(pool, Arc::new(StubChainDb::new()))
    }

    #[test]
    fn test_extend_requires_continuity() {
        let mgr = manager();
        mgr.extend_canonical_chain(&blkid(1), 100).unwrap();
        mgr.extend_canonical_chain(&blkid(2), 101).unwrap();

        let err = mgr.extend_canonical_chain(&blkid(3), 103).unwrap_err();
        assert!(matches!(err, DbError::OooInsert("canonical_chain", 103)));

        assert_eq!(
            mgr.get_canonical_chain_tip().unwrap(),
            Some((101, blkid(2)))
        );
    }

    #[test]
    fn test_revert_purges_cached_heights() {
        let mgr = manager();
        for (i, height) in (100u64..=104).enumerate() {
            mgr.extend_canonical_chain(&blkid(i as u8 + 1), height)
                .unwrap();
        }
        // warm the cache
        for height in 100u64..=104 {
            let _ = mgr.get_canonical_blockid_at_height(height).unwrap();
        }

        mgr.revert_canonical_chain(101).unwrap();
        assert_eq!(mgr.get_chain_tip_height().unwrap(), Some(101));
        assert_eq!(mgr.get_canonical_blockid_at_height(103).unwrap(), None);
        assert_eq!(
            mgr.get_canonical_blockid_at_height(101).unwrap(),
            Some(blkid(2))
        );
    }

    #[test]
    fn test_revert_bounds_checked() {
        let mgr = manager();
        assert!(matches!(
            mgr.revert_canonical_chain(5).unwrap_err(),
            DbError::CanonicalChainEmpty
        ));

        mgr.extend_canonical_chain(&blkid(1), 10).unwrap();
        assert!(matches!(
            mgr.revert_canonical_chain(11).unwrap_err(),
            DbError::InvalidRevertHeight(11, 10)
        ));
    }

    #[tokio::test]
    async fn test_async_paths_mirror_blocking() {
        let mgr = manager();
        mgr.extend_canonical_chain_async(&blkid(1), 7).await.unwrap();
        mgr.extend_canonical_chain_async(&blkid(2), 8).await.unwrap();
        assert_eq!(
            mgr.get_canonical_blockid_at_height_async(8).await.unwrap(),
            Some(blkid(2))
        );
        mgr.revert_canonical_chain_async(7).await.unwrap();
        assert_eq!(mgr.get_chain_tip_height_async().await.unwrap(), Some(7));
    }
}
