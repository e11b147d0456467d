//! Caching manager of the name tables and effect logs.

use std::sync::Arc;

use stela_db::{
    traits::NameDatabase,
    types::{BlockEffects, NameEntry, RecordEntry, RejectedRegistration},
    DbResult,
};
use stela_primitives::{
    buf::Buf32,
    l1::L1BlockId,
    name::{Name, RecordKey},
};
use threadpool::ThreadPool;

use crate::{cache::CacheTable, ops};

#[expect(
    missing_debug_implementations,
    reason = "some inner types don't have Debug implementations"
)]
pub struct NameStoreManager {
    ops: ops::name::NameDataOps,
    name_cache: CacheTable<Name, Option<NameEntry>>,
    record_cache: CacheTable<(Name, RecordKey), Option<RecordEntry>>,
}

impl NameStoreManager {
    /// Create new instance of [`NameStoreManager`].
    pub fn new(pool: ThreadPool, db: Arc<impl NameDatabase + 'static>) -> Self {
        let ops = ops::name::Context::new(db).into_ops(pool);
        let name_cache = CacheTable::new(256.try_into().expect("nonzero cache size"));
        let record_cache = CacheTable::new(256.try_into().expect("nonzero cache size"));
        Self {
            ops,
            name_cache,
            record_cache,
        }
    }

    pub async fn put_name_entry_async(&self, entry: NameEntry) -> DbResult<()> {
        self.name_cache.purge_async(&entry.name).await;
        self.ops.put_name_entry_async(entry).await
    }

    pub fn get_name_entry(&self, name: Name) -> DbResult<Option<NameEntry>> {
        self.name_cache
            .get_or_fetch_blocking(&name, || self.ops.get_name_entry_blocking(name.clone()))
    }

    pub async fn get_name_entry_async(&self, name: Name) -> DbResult<Option<NameEntry>> {
        self.name_cache
            .get_or_fetch(&name, || self.ops.get_name_entry_chan(name.clone()))
            .await
    }

    pub async fn del_name_entry_async(&self, name: Name) -> DbResult<bool> {
        self.name_cache.purge_async(&name).await;
        self.ops.del_name_entry_async(name).await
    }

    pub async fn put_rejected_registration_async(
        &self,
        entry: RejectedRegistration,
    ) -> DbResult<()> {
        self.ops.put_rejected_registration_async(entry).await
    }

    pub fn get_rejected_registrations(&self, name: Name) -> DbResult<Vec<RejectedRegistration>> {
        self.ops.get_rejected_registrations_blocking(name)
    }

    pub async fn get_rejected_registrations_async(
        &self,
        name: Name,
    ) -> DbResult<Vec<RejectedRegistration>> {
        self.ops.get_rejected_registrations_async(name).await
    }

    pub async fn del_rejected_registration_async(&self, name: Name, txid: Buf32) -> DbResult<bool> {
        self.ops.del_rejected_registration_async(name, txid).await
    }

    pub async fn put_record_entry_async(
        &self,
        name: Name,
        key: RecordKey,
        entry: RecordEntry,
    ) -> DbResult<()> {
        self.record_cache
            .purge_async(&(name.clone(), key.clone()))
            .await;
        self.ops.put_record_entry_async(name, key, entry).await
    }

    pub fn get_record_entry(&self, name: Name, key: RecordKey) -> DbResult<Option<RecordEntry>> {
        self.record_cache
            .get_or_fetch_blocking(&(name.clone(), key.clone()), || {
                self.ops.get_record_entry_blocking(name.clone(), key.clone())
            })
    }

    pub async fn get_record_entry_async(
        &self,
        name: Name,
        key: RecordKey,
    ) -> DbResult<Option<RecordEntry>> {
        self.record_cache
            .get_or_fetch(&(name.clone(), key.clone()), || {
                self.ops.get_record_entry_chan(name.clone(), key.clone())
            })
            .await
    }

    pub async fn del_record_entry_async(&self, name: Name, key: RecordKey) -> DbResult<bool> {
        self.record_cache
            .purge_async(&(name.clone(), key.clone()))
            .await;
        self.ops.del_record_entry_async(name, key).await
    }

    pub fn get_records_for_name(&self, name: Name) -> DbResult<Vec<(RecordKey, RecordEntry)>> {
        self.ops.get_records_for_name_blocking(name)
    }

    pub async fn get_records_for_name_async(
        &self,
        name: Name,
    ) -> DbResult<Vec<(RecordKey, RecordEntry)>> {
        self.ops.get_records_for_name_async(name).await
    }

    pub async fn put_block_effects_async(&self, effects: BlockEffects) -> DbResult<()> {
        self.ops.put_block_effects_async(effects).await
    }

    pub async fn get_block_effects_async(&self, blockid: L1BlockId) -> DbResult<Option<BlockEffects>> {
        self.ops.get_block_effects_async(blockid).await
    }

    pub async fn del_block_effects_async(&self, blockid: L1BlockId) -> DbResult<bool> {
        self.ops.del_block_effects_async(blockid).await
    }
}
