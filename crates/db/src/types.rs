//! Persisted entry types for the name index.

use arbitrary::Arbitrary;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use stela_primitives::{
    buf::Buf32,
    l1::L1BlockCommitment,
    name::{Name, RecordKey},
};

/// Lifecycle of the winning registration for a name.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    BorshSerialize,
    BorshDeserialize,
    Arbitrary,
    Serialize,
    Deserialize,
)]
#[serde(tag = "status")]
pub enum NameStatus {
    /// Observed in a block, waiting for the confirmation threshold.
    Pending,

    /// Reached the required confirmation depth; records may be attached.
    Confirmed,
}

/// Why a registration lost.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    BorshSerialize,
    BorshDeserialize,
    Arbitrary,
    Serialize,
    Deserialize,
)]
pub enum RejectReason {
    /// An earlier registration for the name was already pending or confirmed.
    NameAlreadyClaimed,
}

/// The winning registration for a name, keyed by the name itself.
///
/// The invariant "at most one pending-or-confirmed entry per name" is exactly
/// the uniqueness of this table's key; losing registrations go to
/// [`RejectedRegistration`] instead of overwriting the winner.
#[derive(
    Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Arbitrary, Serialize, Deserialize,
)]
pub struct NameEntry {
    pub name: Name,

    /// X-only key that owns the name.
    pub owner: Buf32,

    /// Transaction that carried the winning registration commitment.
    pub registration_txid: Buf32,

    /// Position of that transaction within its block.
    pub registration_txpos: u32,

    /// Block the registration was included in.
    pub registration_block: L1BlockCommitment,

    pub status: NameStatus,
}

/// A losing registration, kept for auditability, keyed by `(name, txid)`.
#[derive(
    Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Arbitrary, Serialize, Deserialize,
)]
pub struct RejectedRegistration {
    pub name: Name,
    pub owner: Buf32,
    pub txid: Buf32,
    pub block: L1BlockCommitment,
    pub reason: RejectReason,
}

/// Current value of one record key under a name, keyed by `(name, key)`.
#[derive(
    Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Arbitrary, Serialize, Deserialize,
)]
pub struct RecordEntry {
    pub value: Vec<u8>,

    /// Transaction that carried the update commitment.
    pub update_txid: Buf32,

    /// Block that transaction was included in.
    pub update_block: L1BlockCommitment,

    /// Position of that transaction within its block; together with the block
    /// height this orders last-writer-wins.
    pub update_txpos: u32,
}

/// One reversible state mutation performed while applying a block.
#[derive(
    Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Arbitrary, Serialize, Deserialize,
)]
pub enum Effect {
    /// A name entry was created in `Pending` status.
    RegisteredName { name: Name },

    /// A losing registration was recorded.
    RejectedRegistration { name: Name, txid: Buf32 },

    /// A record entry was written, capturing the value it replaced.
    WroteRecord {
        name: Name,
        key: RecordKey,
        prev: Option<RecordEntry>,
    },

    /// A pending name crossed the confirmation threshold.
    Promoted { name: Name },
}

/// Exact log of the mutations one block caused, keyed by its block id.
///
/// Undoing a block is a replay of this log in reverse, never a re-scan; the
/// log's existence also marks the block as applied, which is what makes
/// re-application after a crash a no-op.
#[derive(
    Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Arbitrary, Serialize, Deserialize,
)]
pub struct BlockEffects {
    pub block: L1BlockCommitment,
    pub effects: Vec<Effect>,
}
