//! In-memory database implementations.
//!
//! These back unit tests and development runs; a real deployment plugs a
//! persistent store behind the same traits.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use parking_lot::Mutex;
use stela_primitives::{
    buf::Buf32,
    l1::L1BlockId,
    name::{Name, RecordKey},
};

use crate::{
    traits::{ChainDatabase, DatabaseBackend, NameDatabase},
    types::{BlockEffects, NameEntry, RecordEntry, RejectedRegistration},
    DbResult,
};

/// In-memory canonical chain table.
#[derive(Debug, Default)]
pub struct StubChainDb {
    canonical: Mutex<BTreeMap<u64, L1BlockId>>,
}

impl StubChainDb {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChainDatabase for StubChainDb {
    fn set_canonical_chain_entry(&self, height: u64, blockid: L1BlockId) -> DbResult<()> {
        self.canonical.lock().insert(height, blockid);
        Ok(())
    }

    fn remove_canonical_chain_entries(&self, start_height: u64, end_height: u64) -> DbResult<()> {
        let mut tbl = self.canonical.lock();
        for height in start_height..=end_height {
            tbl.remove(&height);
        }
        Ok(())
    }

    fn get_canonical_chain_tip(&self) -> DbResult<Option<(u64, L1BlockId)>> {
        Ok(self
            .canonical
            .lock()
            .last_key_value()
            .map(|(height, blockid)| (*height, *blockid)))
    }

    fn get_canonical_blockid_at_height(&self, height: u64) -> DbResult<Option<L1BlockId>> {
        Ok(self.canonical.lock().get(&height).copied())
    }
}

/// In-memory name tables and effect logs.
#[derive(Debug, Default)]
pub struct StubNameDb {
    names: Mutex<HashMap<Name, NameEntry>>,
    rejected: Mutex<BTreeMap<(Name, Buf32), RejectedRegistration>>,
    records: Mutex<BTreeMap<(Name, RecordKey), RecordEntry>>,
    effects: Mutex<HashMap<L1BlockId, BlockEffects>>,
}

impl StubNameDb {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NameDatabase for StubNameDb {
    fn put_name_entry(&self, entry: NameEntry) -> DbResult<()> {
        self.names.lock().insert(entry.name.clone(), entry);
        Ok(())
    }

    fn get_name_entry(&self, name: Name) -> DbResult<Option<NameEntry>> {
        Ok(self.names.lock().get(&name).cloned())
    }

    fn del_name_entry(&self, name: Name) -> DbResult<bool> {
        Ok(self.names.lock().remove(&name).is_some())
    }

    fn put_rejected_registration(&self, entry: RejectedRegistration) -> DbResult<()> {
        self.rejected
            .lock()
            .insert((entry.name.clone(), entry.txid), entry);
        Ok(())
    }

    fn get_rejected_registrations(&self, name: Name) -> DbResult<Vec<RejectedRegistration>> {
        Ok(self
            .rejected
            .lock()
            .range((name.clone(), Buf32::zero())..)
            .take_while(|((n, _), _)| *n == name)
            .map(|(_, entry)| entry.clone())
            .collect())
    }

    fn del_rejected_registration(&self, name: Name, txid: Buf32) -> DbResult<bool> {
        Ok(self.rejected.lock().remove(&(name, txid)).is_some())
    }

    fn put_record_entry(&self, name: Name, key: RecordKey, entry: RecordEntry) -> DbResult<()> {
        self.records.lock().insert((name, key), entry);
        Ok(())
    }

    fn get_record_entry(&self, name: Name, key: RecordKey) -> DbResult<Option<RecordEntry>> {
        Ok(self.records.lock().get(&(name, key)).cloned())
    }

    fn del_record_entry(&self, name: Name, key: RecordKey) -> DbResult<bool> {
        Ok(self.records.lock().remove(&(name, key)).is_some())
    }

    fn get_records_for_name(&self, name: Name) -> DbResult<Vec<(RecordKey, RecordEntry)>> {
        Ok(self
            .records
            .lock()
            .iter()
            .filter(|((n, _), _)| *n == name)
            .map(|((_, key), entry)| (key.clone(), entry.clone()))
            .collect())
    }

    fn put_block_effects(&self, effects: BlockEffects) -> DbResult<()> {
        self.effects.lock().insert(*effects.block.blkid(), effects);
        Ok(())
    }

    fn get_block_effects(&self, blockid: L1BlockId) -> DbResult<Option<BlockEffects>> {
        Ok(self.effects.lock().get(&blockid).cloned())
    }

    fn del_block_effects(&self, blockid: L1BlockId) -> DbResult<bool> {
        Ok(self.effects.lock().remove(&blockid).is_some())
    }
}

/// Backend bundling the in-memory stubs.
#[derive(Debug, Default)]
pub struct StubBackend {
    name_db: Arc<StubNameDb>,
    chain_db: Arc<StubChainDb>,
}

impl StubBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DatabaseBackend for StubBackend {
    fn name_db(&self) -> Arc<impl NameDatabase> {
        self.name_db.clone()
    }

    fn chain_db(&self) -> Arc<impl ChainDatabase> {
        self.chain_db.clone()
    }
}

#[cfg(test)]
mod tests {
    use stela_primitives::l1::L1BlockCommitment;

    use super::*;
    use crate::types::NameStatus;

    fn blkid(byte: u8) -> L1BlockId {
        L1BlockId::from(Buf32::new([byte; 32]))
    }

    fn name_entry(name: &str) -> NameEntry {
        NameEntry {
            name: name.parse().unwrap(),
            owner: Buf32::new([1; 32]),
            registration_txid: Buf32::new([2; 32]),
            registration_txpos: 0,
            registration_block: L1BlockCommitment::new(5, blkid(5)),
            status: NameStatus::Pending,
        }
    }

    #[test]
    fn test_chain_db_tip_tracks_inserts_and_removals() {
        let db = StubChainDb::new();
        assert_eq!(db.get_canonical_chain_tip().unwrap(), None);

        for height in 1..=5 {
            db.set_canonical_chain_entry(height, blkid(height as u8))
                .unwrap();
        }
        assert_eq!(db.get_canonical_chain_tip().unwrap(), Some((5, blkid(5))));

        db.remove_canonical_chain_entries(4, 5).unwrap();
        assert_eq!(db.get_canonical_chain_tip().unwrap(), Some((3, blkid(3))));
        assert_eq!(db.get_canonical_blockid_at_height(4).unwrap(), None);
    }

    #[test]
    fn test_name_db_basic_crud() {
        let db = StubNameDb::new();
        let entry = name_entry("alice");
        db.put_name_entry(entry.clone()).unwrap();
        assert_eq!(
            db.get_name_entry("alice".parse().unwrap()).unwrap(),
            Some(entry)
        );
        assert!(db.del_name_entry("alice".parse().unwrap()).unwrap());
        assert!(!db.del_name_entry("alice".parse().unwrap()).unwrap());
    }

    #[test]
    fn test_records_scoped_per_name() {
        let db = StubNameDb::new();
        let alice: Name = "alice".parse().unwrap();
        let bob: Name = "bob".parse().unwrap();
        let key: RecordKey = "NPUB".parse().unwrap();
        let entry = RecordEntry {
            value: b"value".to_vec(),
            update_txid: Buf32::new([9; 32]),
            update_block: L1BlockCommitment::new(7, blkid(7)),
            update_txpos: 1,
        };

        db.put_record_entry(alice.clone(), key.clone(), entry.clone())
            .unwrap();
        assert_eq!(db.get_records_for_name(alice).unwrap().len(), 1);
        assert!(db.get_records_for_name(bob).unwrap().is_empty());
    }
}
