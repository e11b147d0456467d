//! Trait definitions for low level database interfaces.  This borrows some of
//! its naming conventions from reth.

use std::sync::Arc;

use stela_primitives::{
    buf::Buf32,
    l1::L1BlockId,
    name::{Name, RecordKey},
};

use crate::{
    types::{BlockEffects, NameEntry, RecordEntry, RejectedRegistration},
    DbResult,
};

/// Common database backend interface bundling the individual trait handles.
pub trait DatabaseBackend: Send + Sync {
    fn name_db(&self) -> Arc<impl NameDatabase>;
    fn chain_db(&self) -> Arc<impl ChainDatabase>;
}

/// Database interface for the canonical-chain view.
///
/// The tip of this table *is* the chain cursor.  Operations are NOT VALIDATED
/// at this level; ensure all writes go through `ChainManager`.
pub trait ChainDatabase: Send + Sync + 'static {
    /// Set a specific height, blockid in canonical chain records.
    fn set_canonical_chain_entry(&self, height: u64, blockid: L1BlockId) -> DbResult<()>;

    /// Remove canonical chain records in the given range (inclusive).
    fn remove_canonical_chain_entries(&self, start_height: u64, end_height: u64) -> DbResult<()>;

    /// Gets current chain tip height, blockid.
    fn get_canonical_chain_tip(&self) -> DbResult<Option<(u64, L1BlockId)>>;

    /// Gets the blockid at height for the current chain.
    fn get_canonical_blockid_at_height(&self, height: u64) -> DbResult<Option<L1BlockId>>;
}

/// Database interface for the materialized name tables and per-block effect
/// logs.  Operations are NOT VALIDATED at this level; protocol rules are
/// enforced by the registration indexer.
pub trait NameDatabase: Send + Sync + 'static {
    /// Writes the winning registration entry for its name, overwriting any
    /// existing entry.
    fn put_name_entry(&self, entry: NameEntry) -> DbResult<()>;

    fn get_name_entry(&self, name: Name) -> DbResult<Option<NameEntry>>;

    /// Deletes a name entry, returning whether one existed.
    fn del_name_entry(&self, name: Name) -> DbResult<bool>;

    /// Records a losing registration under `(name, txid)`.
    fn put_rejected_registration(&self, entry: RejectedRegistration) -> DbResult<()>;

    /// All losing registrations recorded for a name, ordered by txid.
    fn get_rejected_registrations(&self, name: Name) -> DbResult<Vec<RejectedRegistration>>;

    fn del_rejected_registration(&self, name: Name, txid: Buf32) -> DbResult<bool>;

    /// Writes the record value under `(name, key)`, overwriting any previous
    /// value.
    fn put_record_entry(&self, name: Name, key: RecordKey, entry: RecordEntry) -> DbResult<()>;

    fn get_record_entry(&self, name: Name, key: RecordKey) -> DbResult<Option<RecordEntry>>;

    fn del_record_entry(&self, name: Name, key: RecordKey) -> DbResult<bool>;

    /// All records for a name, ordered by key.
    fn get_records_for_name(&self, name: Name) -> DbResult<Vec<(RecordKey, RecordEntry)>>;

    /// Stores the effect log of an applied block, keyed by its block id.
    fn put_block_effects(&self, effects: BlockEffects) -> DbResult<()>;

    fn get_block_effects(&self, blockid: L1BlockId) -> DbResult<Option<BlockEffects>>;

    fn del_block_effects(&self, blockid: L1BlockId) -> DbResult<bool>;
}
