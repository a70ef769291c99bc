//! Transaction records and the record builder.
//!
//! These are plain data types with small, pure mutation helpers — no state
//! access, no list bookkeeping (that belongs to the record list builder in
//! `ledger-records`). Kept in the base types crate so every upstream crate
//! shares one definition.

use crate::ids::{AccountId, ConsensusTimestamp, TransactionId};
use crate::status::ResponseCode;
use serde::{Deserialize, Serialize};

/// A single balance movement carried by a record.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct TransferEntry {
    pub account: AccountId,
    /// Signed amount in the ledger's base unit; negative is a debit.
    pub amount: i64,
}

/// The four preceding-record flavours.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum PrecedingKind {
    /// Capped to a per-user-transaction bound.
    Limited,
    /// May be reverted by the user transaction failing.
    Reversible,
    /// Bounded only by the consensus-time tracker; used for migration.
    Unlimited,
    /// May be dropped entirely if the user transaction reverts.
    Removable,
}

/// The three following-record flavours.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum FollowingKind {
    Ordinary,
    Removable,
    RemovableWithCustomizer,
}

/// Where a record sits relative to the user transaction in its record list.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum RecordKind {
    Preceding(PrecedingKind),
    User,
    Following(FollowingKind),
}

impl RecordKind {
    pub fn is_removable(&self) -> bool {
        matches!(
            self,
            RecordKind::Preceding(PrecedingKind::Removable)
                | RecordKind::Following(FollowingKind::Removable)
                | RecordKind::Following(FollowingKind::RemovableWithCustomizer)
        )
    }

    pub fn is_preceding(&self) -> bool {
        matches!(self, RecordKind::Preceding(_))
    }

    pub fn is_following(&self) -> bool {
        matches!(self, RecordKind::Following(_))
    }
}

/// Accumulates the outcome of one dispatch (user, preceding, or following)
/// until the round's `FINALIZE` phase assigns a consensus timestamp and the
/// nonce becomes permanent.
#[derive(Clone, Debug)]
pub struct RecordBuilder {
    pub transaction_id: TransactionId,
    pub kind: RecordKind,
    pub status: ResponseCode,
    pub consensus_timestamp: Option<ConsensusTimestamp>,
    pub parent_consensus_timestamp: Option<ConsensusTimestamp>,
    pub fee: u64,
    pub transfers: Vec<TransferEntry>,
    pub memo: String,
    /// The synthesized transaction bytes for synthetic (non-user) dispatches.
    pub transaction_bytes: Vec<u8>,
    pub sidecars: Vec<Vec<u8>>,
    /// The dispatch that created this record, used by `revert_children_of`
    /// to find every descendant of a reverting parent.
    pub source_id: Option<TransactionId>,
    /// Set when a removable record is reverted; such records are dropped
    /// from the emitted list entirely rather than externalized with an error
    /// status.
    pub should_not_be_externalized: bool,
}

impl RecordBuilder {
    pub fn new(transaction_id: TransactionId, kind: RecordKind) -> Self {
        Self {
            transaction_id,
            kind,
            status: ResponseCode::Success,
            consensus_timestamp: None,
            parent_consensus_timestamp: None,
            fee: 0,
            transfers: Vec::new(),
            memo: String::new(),
            transaction_bytes: Vec::new(),
            sidecars: Vec::new(),
            source_id: None,
            should_not_be_externalized: false,
        }
    }

    pub fn with_source(mut self, source_id: TransactionId) -> Self {
        self.source_id = Some(source_id);
        self
    }

    pub fn set_status(&mut self, status: ResponseCode) {
        self.status = status;
    }

    pub fn add_transfer(&mut self, account: AccountId, amount: i64) {
        self.transfers.push(TransferEntry { account, amount });
    }

    /// Clears side effects and applies the parent's failure status:
    /// non-removable descendants survive in the emitted list but carry the
    /// parent's error status with transfers wiped.
    pub fn revert_with(&mut self, parent_status: ResponseCode) {
        self.status = parent_status;
        self.transfers.clear();
        self.sidecars.clear();
    }

    /// Fixes the consensus timestamp and, for following records, the parent
    /// pointer (the source record's own assigned timestamp), producing the
    /// completed `Record`.
    pub fn finalize(self, parent_consensus_timestamp: Option<ConsensusTimestamp>, consensus_timestamp: ConsensusTimestamp) -> Record {
        Record {
            transaction_id: self.transaction_id,
            kind: self.kind,
            status: self.status,
            consensus_timestamp,
            parent_consensus_timestamp,
            fee: self.fee,
            transfers: self.transfers,
            memo: self.memo,
            transaction_bytes: self.transaction_bytes,
            sidecars: self.sidecars,
        }
    }
}

/// A record builder with status, timestamp, and parent pointer fixed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Record {
    pub transaction_id: TransactionId,
    pub kind: RecordKind,
    pub status: ResponseCode,
    pub consensus_timestamp: ConsensusTimestamp,
    pub parent_consensus_timestamp: Option<ConsensusTimestamp>,
    pub fee: u64,
    pub transfers: Vec<TransferEntry>,
    pub memo: String,
    pub transaction_bytes: Vec<u8>,
    pub sidecars: Vec<Vec<u8>>,
}
