//! Storage managers for the name index.

pub mod cache;
pub mod exec;
pub mod managers;
pub mod ops;

use std::sync::Arc;

pub use managers::{chain::ChainManager, name::NameStoreManager};
use stela_db::traits::DatabaseBackend;

// these re-exports are required for the exec::inst_ops macro
#[doc(hidden)]
pub use {paste, stela_db, threadpool, tokio, tracing};

/// A consolidation of database managers.
#[derive(Clone)]
#[expect(
    missing_debug_implementations,
    reason = "some inner types don't have Debug implementations"
)]
pub struct IndexStorage {
    chain_manager: Arc<ChainManager>,
    name_manager: Arc<NameStoreManager>,
}

impl IndexStorage {
    pub fn chain(&self) -> &Arc<ChainManager> {
        &self.chain_manager
    }

    pub fn names(&self) -> &Arc<NameStoreManager> {
        &self.name_manager
    }
}

/// Given a raw database backend, creates storage managers and returns an
/// [`IndexStorage`] instance around it.
pub fn create_index_storage<D>(
    db: Arc<D>,
    pool: threadpool::ThreadPool,
) -> anyhow::Result<IndexStorage>
where
    D: DatabaseBackend + 'static,
{
    let chain_db = db.chain_db();
    let name_db = db.name_db();

    let chain_manager = Arc::new(ChainManager::new(pool.clone(), chain_db));
    let name_manager = Arc::new(NameStoreManager::new(pool.clone(), name_db));

    Ok(IndexStorage {
        chain_manager,
        name_manager,
    })
}
