//! Block application and rollback over per-block effect logs.

use std::sync::Arc;

use async_trait::async_trait;
use stela_btcio::reader::{BlockData, BlockIndexer};
use stela_db::types::{
    BlockEffects, Effect, NameEntry, NameStatus, RecordEntry, RejectReason, RejectedRegistration,
};
use stela_nametx::Commitment;
use stela_params::ProtocolParams;
use stela_primitives::{
    buf::Buf32,
    l1::L1BlockCommitment,
    name::{Name, RecordKey},
};
use stela_storage::IndexStorage;
use tracing::*;

/// Why a record update was dropped without any state effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// The referenced name has no confirmed registration, or the commitment's
    /// owner key does not match the registered owner.
    UnauthorizedOrUnknownName,
}

/// Summary of what applying one block did.
#[derive(Debug, Clone, Default)]
pub struct ApplyResult {
    /// Names newly registered, pending confirmation.
    pub registered: Vec<Name>,

    /// Registrations rejected because the name was already claimed.
    pub rejected: Vec<Name>,

    /// Record writes applied.
    pub records_written: u64,

    /// Record updates discarded, with reasons.
    pub discarded: Vec<(Name, DiscardReason)>,

    /// Names this block promoted to confirmed.
    pub promoted: Vec<Name>,

    /// True when the block had already been applied and the call was a no-op.
    pub already_applied: bool,
}

/// What a reader observes for a queried name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameState {
    /// Winning registration awaiting confirmations.
    Pending(NameEntry),

    /// Confirmed registration.
    Confirmed(NameEntry),

    /// Only rejected registrations exist for this name.
    Rejected(Vec<RejectedRegistration>),
}

/// Single logical writer over the name tables.
///
/// `apply_block` and `undo_block` are driven strictly sequentially by the
/// chain follower; concurrent readers go through the lookup methods and see
/// either pre- or post-block state.
#[derive(Clone)]
#[expect(
    missing_debug_implementations,
    reason = "some inner types don't have Debug implementations"
)]
pub struct RegistrationIndexer {
    storage: Arc<IndexStorage>,
    params: Arc<ProtocolParams>,
}

impl RegistrationIndexer {
    pub fn new(storage: Arc<IndexStorage>, params: Arc<ProtocolParams>) -> Self {
        Self { storage, params }
    }

    /// Applies a canonical block's commitments and records the effect log
    /// that makes the application reversible.
    ///
    /// Idempotent per block id: re-applying a block whose effect log already
    /// exists is a no-op, which is what makes crash recovery's at-least-once
    /// delivery safe.
    pub async fn apply_block(&self, blockdata: &BlockData) -> anyhow::Result<ApplyResult> {
        let block = blockdata.block_commitment();
        let names = self.storage.names();

        if names.get_block_effects_async(*block.blkid()).await?.is_some() {
            debug!(%block, "block already applied, skipping");
            return Ok(ApplyResult {
                already_applied: true,
                ..Default::default()
            });
        }

        let mut effects = Vec::new();
        let mut res = ApplyResult::default();

        for entry in blockdata.relevant_txs() {
            let txid = entry.txid();
            let position = entry.position();

            for (_vout, commitment) in entry.item() {
                match commitment {
                    Commitment::Registration { name, owner } => {
                        self.apply_registration(block, txid, position, name, owner, &mut effects, &mut res)
                            .await?;
                    }
                    Commitment::RecordUpdate {
                        name,
                        owner,
                        key,
                        value,
                    } => {
                        self.apply_record_update(
                            block, txid, position, name, owner, key, value, &mut effects, &mut res,
                        )
                        .await?;
                    }
                }
            }
        }

        self.promote_matured(block, &mut effects, &mut res).await?;

        names
            .put_block_effects_async(BlockEffects { block, effects })
            .await?;

        Ok(res)
    }

    #[expect(clippy::too_many_arguments, reason = "internal helper on the hot path")]
    async fn apply_registration(
        &self,
        block: L1BlockCommitment,
        txid: Buf32,
        position: u32,
        name: &Name,
        owner: &Buf32,
        effects: &mut Vec<Effect>,
        res: &mut ApplyResult,
    ) -> anyhow::Result<()> {
        let names = self.storage.names();

        // First seen wins; within a block, transaction order already decided
        // who got here first.
        if let Some(existing) = names.get_name_entry_async(name.clone()).await? {
            debug!(%name, winner = %existing.registration_txid, "registration for claimed name rejected");
            names
                .put_rejected_registration_async(RejectedRegistration {
                    name: name.clone(),
                    owner: *owner,
                    txid,
                    block,
                    reason: RejectReason::NameAlreadyClaimed,
                })
                .await?;
            effects.push(Effect::RejectedRegistration {
                name: name.clone(),
                txid,
            });
            res.rejected.push(name.clone());
            return Ok(());
        }

        names
            .put_name_entry_async(NameEntry {
                name: name.clone(),
                owner: *owner,
                registration_txid: txid,
                registration_txpos: position,
                registration_block: block,
                status: NameStatus::Pending,
            })
            .await?;
        effects.push(Effect::RegisteredName { name: name.clone() });
        res.registered.push(name.clone());
        info!(%name, "observed name registration");

        Ok(())
    }

    #[expect(clippy::too_many_arguments, reason = "internal helper on the hot path")]
    async fn apply_record_update(
        &self,
        block: L1BlockCommitment,
        txid: Buf32,
        position: u32,
        name: &Name,
        owner: &Buf32,
        key: &RecordKey,
        value: &[u8],
        effects: &mut Vec<Effect>,
        res: &mut ApplyResult,
    ) -> anyhow::Result<()> {
        let names = self.storage.names();

        let authorized = matches!(
            names.get_name_entry_async(name.clone()).await?,
            Some(entry) if entry.status == NameStatus::Confirmed && entry.owner == *owner
        );
        if !authorized {
            debug!(%name, %key, "record update discarded");
            res.discarded
                .push((name.clone(), DiscardReason::UnauthorizedOrUnknownName));
            return Ok(());
        }

        let prev = names.get_record_entry_async(name.clone(), key.clone()).await?;
        names
            .put_record_entry_async(
                name.clone(),
                key.clone(),
                RecordEntry {
                    value: value.to_vec(),
                    update_txid: txid,
                    update_block: block,
                    update_txpos: position,
                },
            )
            .await?;
        effects.push(Effect::WroteRecord {
            name: name.clone(),
            key: key.clone(),
            prev,
        });
        res.records_written += 1;
        debug!(%name, %key, "record updated");

        Ok(())
    }

    /// Promotes names whose registration has just reached the confirmation
    /// threshold: registrations from the block `required_confirmations` below
    /// the one being applied.
    async fn promote_matured(
        &self,
        block: L1BlockCommitment,
        effects: &mut Vec<Effect>,
        res: &mut ApplyResult,
    ) -> anyhow::Result<()> {
        let Some(reg_height) = block.height().checked_sub(self.params.required_confirmations)
        else {
            return Ok(());
        };

        let Some(reg_blkid) = self
            .storage
            .chain()
            .get_canonical_blockid_at_height_async(reg_height)
            .await?
        else {
            return Ok(());
        };
        let names = self.storage.names();
        let Some(reg_log) = names.get_block_effects_async(reg_blkid).await? else {
            return Ok(());
        };

        for effect in &reg_log.effects {
            let Effect::RegisteredName { name } = effect else {
                continue;
            };
            let Some(mut entry) = names.get_name_entry_async(name.clone()).await? else {
                continue;
            };
            if entry.status != NameStatus::Pending {
                continue;
            }

            entry.status = NameStatus::Confirmed;
            names.put_name_entry_async(entry).await?;
            effects.push(Effect::Promoted { name: name.clone() });
            res.promoted.push(name.clone());
            info!(%name, height = block.height(), "name registration confirmed");
        }

        Ok(())
    }

    /// Reverses exactly the effects recorded for `block`, newest-first, then
    /// drops the log.  Not a re-scan, a targeted inverse.
    pub async fn undo_block(&self, block: L1BlockCommitment) -> anyhow::Result<()> {
        let names = self.storage.names();

        let Some(log) = names.get_block_effects_async(*block.blkid()).await? else {
            warn!(%block, "no effect log for block being undone");
            return Ok(());
        };

        for effect in log.effects.iter().rev() {
            match effect {
                Effect::RegisteredName { name } => {
                    names.del_name_entry_async(name.clone()).await?;
                }
                Effect::RejectedRegistration { name, txid } => {
                    names
                        .del_rejected_registration_async(name.clone(), *txid)
                        .await?;
                }
                Effect::WroteRecord { name, key, prev } => match prev {
                    Some(prev_entry) => {
                        names
                            .put_record_entry_async(name.clone(), key.clone(), prev_entry.clone())
                            .await?;
                    }
                    None => {
                        names.del_record_entry_async(name.clone(), key.clone()).await?;
                    }
                },
                Effect::Promoted { name } => {
                    if let Some(mut entry) = names.get_name_entry_async(name.clone()).await? {
                        entry.status = NameStatus::Pending;
                        names.put_name_entry_async(entry).await?;
                    }
                }
            }
        }

        names.del_block_effects_async(*block.blkid()).await?;
        debug!(%block, "undid block effects");

        Ok(())
    }

    /// Materialized view of a name: the winning entry if one exists, else any
    /// rejected registrations.  Rejection reasons surface only through this
    /// materialized state, never as errors.
    pub async fn lookup_name(&self, name: &Name) -> anyhow::Result<Option<NameState>> {
        let names = self.storage.names();

        if let Some(entry) = names.get_name_entry_async(name.clone()).await? {
            let state = match entry.status {
                NameStatus::Pending => NameState::Pending(entry),
                NameStatus::Confirmed => NameState::Confirmed(entry),
            };
            return Ok(Some(state));
        }

        let rejected = names.get_rejected_registrations_async(name.clone()).await?;
        if rejected.is_empty() {
            Ok(None)
        } else {
            Ok(Some(NameState::Rejected(rejected)))
        }
    }

    /// Current value of one record under a name.
    pub async fn lookup_record(
        &self,
        name: &Name,
        key: &RecordKey,
    ) -> anyhow::Result<Option<RecordEntry>> {
        Ok(self
            .storage
            .names()
            .get_record_entry_async(name.clone(), key.clone())
            .await?)
    }

    /// All records under a name, ordered by key.
    pub async fn lookup_records(&self, name: &Name) -> anyhow::Result<Vec<(RecordKey, RecordEntry)>> {
        Ok(self
            .storage
            .names()
            .get_records_for_name_async(name.clone())
            .await?)
    }
}

#[async_trait]
impl BlockIndexer for RegistrationIndexer {
    async fn apply_block(&self, blockdata: &BlockData) -> anyhow::Result<()> {
        RegistrationIndexer::apply_block(self, blockdata).await?;
        Ok(())
    }

    async fn undo_blocks_to(&self, height: u64) -> anyhow::Result<()> {
        let chain = self.storage.chain();
        let Some((tip_height, _)) = chain.get_canonical_chain_tip_async().await? else {
            return Ok(());
        };

        for undo_height in ((height + 1)..=tip_height).rev() {
            let Some(blkid) = chain
                .get_canonical_blockid_at_height_async(undo_height)
                .await?
            else {
                continue;
            };
            self.undo_block(L1BlockCommitment::new(undo_height, blkid)).await?;
        }

        Ok(())
    }
}
