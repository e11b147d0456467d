//! Name-table operation interface.

use stela_db::{
    traits::NameDatabase,
    types::{BlockEffects, NameEntry, RecordEntry, RejectedRegistration},
};
use stela_primitives::{
    buf::Buf32,
    l1::L1BlockId,
    name::{Name, RecordKey},
};

use crate::inst_ops;

inst_ops! {
    (<D: NameDatabase> => NameDataOps) {
        put_name_entry(entry: NameEntry) => ();
        get_name_entry(name: Name) => Option<NameEntry>;
        del_name_entry(name: Name) => bool;
        put_rejected_registration(entry: RejectedRegistration) => ();
        get_rejected_registrations(name: Name) => Vec<RejectedRegistration>;
        del_rejected_registration(name: Name, txid: Buf32) => bool;
        put_record_entry(name: Name, key: RecordKey, entry: RecordEntry) => ();
        get_record_entry(name: Name, key: RecordKey) => Option<RecordEntry>;
        del_record_entry(name: Name, key: RecordKey) => bool;
        get_records_for_name(name: Name) => Vec<(RecordKey, RecordEntry)>;
        put_block_effects(effects: BlockEffects) => ();
        get_block_effects(blockid: L1BlockId) => Option<BlockEffects>;
        del_block_effects(blockid: L1BlockId) => bool;
    }
}
