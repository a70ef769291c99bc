//! The record list builder: accumulates preceding, user, and following
//! record builders, assigns deterministic nonces and consensus-time offsets,
//! and implements revert-subtree.

use std::collections::HashMap;

use ledger_telemetry::sinks::{dispatch_metrics, record_metrics};
use ledger_types::error::ResourceLimitError;
use ledger_types::ids::{ConsensusTimestamp, TransactionId};
use ledger_types::record::{FollowingKind, PrecedingKind, Record, RecordBuilder, RecordKind};
use ledger_types::status::ResponseCode;

use crate::time_tracker::ConsensusTimeTracker;

/// One user transaction's full set of record builders, in the order they
/// were created.
pub struct RecordListBuilder {
    preceding: Vec<RecordBuilder>,
    user: RecordBuilder,
    following: Vec<RecordBuilder>,
    next_nonce: u32,
}

impl RecordListBuilder {
    /// Starts a new list for `user_transaction_id`; nonces for its preceding
    /// and following records start at the user transaction's nonce + 1.
    pub fn new(user_transaction_id: TransactionId) -> Self {
        Self {
            preceding: Vec::new(),
            user: RecordBuilder::new(user_transaction_id, RecordKind::User),
            following: Vec::new(),
            next_nonce: user_transaction_id.nonce + 1,
        }
    }

    pub fn user_mut(&mut self) -> &mut RecordBuilder {
        &mut self.user
    }

    pub fn user(&self) -> &RecordBuilder {
        &self.user
    }

    pub fn preceding_mut(&mut self, index: usize) -> &mut RecordBuilder {
        &mut self.preceding[index]
    }

    pub fn following_mut(&mut self, index: usize) -> &mut RecordBuilder {
        &mut self.following[index]
    }

    pub fn preceding_len(&self) -> usize {
        self.preceding.len()
    }

    pub fn following_len(&self) -> usize {
        self.following.len()
    }

    /// Reverts every *reversible preceding* record once the user
    /// transaction itself fails. Unlike `revert_children_of` this never
    /// drops a record — reversible preceding records are not removable,
    /// they simply carry the parent's failure status.
    pub fn revert_reversible_preceding(&mut self, user_status: ResponseCode) {
        for record in self.preceding.iter_mut() {
            if matches!(record.kind, RecordKind::Preceding(PrecedingKind::Reversible))
                && record.status.is_success()
            {
                record.revert_with(user_status);
            }
        }
    }

    fn assign_nonce(&mut self, payer_id: TransactionId) -> TransactionId {
        let id = payer_id.with_nonce(self.next_nonce);
        self.next_nonce += 1;
        id
    }

    /// Adds a new preceding record, checking the tracker's budget first.
    pub fn add_preceding(
        &mut self,
        kind: PrecedingKind,
        tracker: &mut ConsensusTimeTracker,
    ) -> Result<&mut RecordBuilder, ResourceLimitError> {
        if !tracker.consume_preceding() {
            return Err(ResourceLimitError::MaxChildRecordsExceeded);
        }
        let id = self.assign_nonce(self.user.transaction_id);
        let builder = RecordBuilder::new(id, RecordKind::Preceding(kind)).with_source(self.user.transaction_id);
        record_metrics().inc_preceding_records(preceding_kind_label(kind));
        self.preceding.push(builder);
        Ok(self.preceding.last_mut().expect("just pushed"))
    }

    /// Adds a new following record as a child of `source_id`, checking the
    /// tracker's budget first.
    pub fn add_following(
        &mut self,
        kind: FollowingKind,
        source_id: TransactionId,
        tracker: &mut ConsensusTimeTracker,
    ) -> Result<&mut RecordBuilder, ResourceLimitError> {
        if !tracker.consume_following() {
            return Err(ResourceLimitError::MaxChildRecordsExceeded);
        }
        let id = self.assign_nonce(self.user.transaction_id);
        let builder = RecordBuilder::new(id, RecordKind::Following(kind)).with_source(source_id);
        record_metrics().inc_following_records(following_kind_label(kind));
        dispatch_metrics().inc_child_dispatches(matches!(kind, FollowingKind::Removable | FollowingKind::RemovableWithCustomizer));
        self.following.push(builder);
        Ok(self.following.last_mut().expect("just pushed"))
    }

    /// Marks every following record descending from `parent_id` (directly
    /// or transitively) with `parent_status`, dropping the removable ones
    /// entirely from the list.
    pub fn revert_children_of(&mut self, parent_id: TransactionId, parent_status: ResponseCode) {
        let mut reverted_ids = vec![parent_id];
        loop {
            let mut newly_reverted = Vec::new();
            for record in self.following.iter_mut() {
                if record.should_not_be_externalized {
                    continue;
                }
                let Some(source_id) = record.source_id else {
                    continue;
                };
                if reverted_ids.contains(&source_id) && record.status.is_success() {
                    record.revert_with(parent_status);
                    if record.kind.is_removable() {
                        record.should_not_be_externalized = true;
                    }
                    newly_reverted.push(record.transaction_id);
                    dispatch_metrics().inc_reverted_children();
                }
            }
            if newly_reverted.is_empty() {
                break;
            }
            reverted_ids.extend(newly_reverted);
        }
    }

    /// Drops a single removable preceding record from the list without
    /// touching its descendants (a reverted *removable preceding*).
    pub fn drop_preceding(&mut self, id: TransactionId) {
        if let Some(record) = self.preceding.iter_mut().find(|r| r.transaction_id == id) {
            record.should_not_be_externalized = true;
        }
    }

    /// Assigns consensus timestamps and returns the fully emitted list in
    /// ascending-timestamp order: surviving preceding records (oldest
    /// dispatched first — this already yields ascending offsets, since the
    /// oldest dispatch receives the largest `k`), the user record, then
    /// surviving following records. Following records also get their
    /// parent pointer fixed here, to whichever record's dispatch created
    /// them.
    pub fn finalize(self, tracker: &ConsensusTimeTracker) -> Vec<Record> {
        let base = tracker.base();
        let delta = tracker.tick_nanos();
        let mut assigned: HashMap<TransactionId, ConsensusTimestamp> = HashMap::new();

        let surviving_preceding: Vec<RecordBuilder> = self
            .preceding
            .into_iter()
            .filter(|r| !r.should_not_be_externalized)
            .collect();
        let count = surviving_preceding.len() as i64;
        let mut out = Vec::with_capacity(surviving_preceding.len() + 1 + self.following.len());
        for (index, builder) in surviving_preceding.into_iter().enumerate() {
            let k = count - index as i64;
            let timestamp = base.plus_ticks(-k * delta);
            assigned.insert(builder.transaction_id, timestamp);
            out.push(builder.finalize(None, timestamp));
        }

        assigned.insert(self.user.transaction_id, base);
        out.push(self.user.finalize(None, base));

        let mut k = 0i64;
        for builder in self.following {
            if builder.should_not_be_externalized {
                continue;
            }
            k += 1;
            let timestamp = base.plus_ticks(k * delta);
            let parent_timestamp = builder.source_id.and_then(|id| assigned.get(&id).copied());
            assigned.insert(builder.transaction_id, timestamp);
            out.push(builder.finalize(parent_timestamp, timestamp));
        }
        out
    }
}

fn preceding_kind_label(kind: PrecedingKind) -> &'static str {
    match kind {
        PrecedingKind::Limited => "limited",
        PrecedingKind::Reversible => "reversible",
        PrecedingKind::Unlimited => "unlimited",
        PrecedingKind::Removable => "removable",
    }
}

fn following_kind_label(kind: FollowingKind) -> &'static str {
    match kind {
        FollowingKind::Ordinary => "ordinary",
        FollowingKind::Removable => "removable",
        FollowingKind::RemovableWithCustomizer => "removable_with_customizer",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_types::ids::{AccountId, ConsensusTimestamp};

    fn tx_id(nonce: u32) -> TransactionId {
        TransactionId::new(AccountId::from([1u8; 32]), ConsensusTimestamp::new(1_000, 0))
            .with_nonce(nonce)
    }

    fn tracker() -> ConsensusTimeTracker {
        ConsensusTimeTracker::new(ConsensusTimestamp::new(1_000, 0), 10, 10, 1)
    }

    #[test]
    fn nonces_strictly_increase_from_user_plus_one() {
        let mut list = RecordListBuilder::new(tx_id(0));
        let mut tr = tracker();
        let p = list.add_preceding(PrecedingKind::Limited, &mut tr).unwrap();
        assert_eq!(p.transaction_id.nonce, 1);
        let f = list
            .add_following(FollowingKind::Ordinary, tx_id(0), &mut tr)
            .unwrap();
        assert_eq!(f.transaction_id.nonce, 2);
    }

    #[test]
    fn finalize_produces_strictly_ascending_timestamps() {
        let mut list = RecordListBuilder::new(tx_id(0));
        let mut tr = tracker();
        list.add_preceding(PrecedingKind::Limited, &mut tr).unwrap();
        list.add_preceding(PrecedingKind::Limited, &mut tr).unwrap();
        list.add_following(FollowingKind::Ordinary, tx_id(0), &mut tr)
            .unwrap();
        list.add_following(FollowingKind::Ordinary, tx_id(0), &mut tr)
            .unwrap();

        let records = list.finalize(&tr);
        assert_eq!(records.len(), 5);
        for pair in records.windows(2) {
            assert!(pair[0].consensus_timestamp < pair[1].consensus_timestamp);
        }
    }

    #[test]
    fn revert_children_of_marks_descendants_and_drops_removable() {
        let mut list = RecordListBuilder::new(tx_id(0));
        let mut tr = tracker();
        let child = list
            .add_following(FollowingKind::Ordinary, tx_id(0), &mut tr)
            .unwrap()
            .transaction_id;
        list.add_following(FollowingKind::Removable, child, &mut tr)
            .unwrap();
        let ordinary_grandchild = list
            .add_following(FollowingKind::Ordinary, child, &mut tr)
            .unwrap()
            .transaction_id;

        list.revert_children_of(tx_id(0), ResponseCode::HandlerFailure);

        let records = list.finalize(&tr);
        // user + child + ordinary grandchild survive; removable grandchild is dropped.
        assert_eq!(records.len(), 3);
        assert!(records
            .iter()
            .all(|r| r.transaction_id == tx_id(0) || r.status == ResponseCode::HandlerFailure));
        assert!(records
            .iter()
            .any(|r| r.transaction_id == ordinary_grandchild));
    }

    #[test]
    fn following_record_carries_its_source_records_timestamp() {
        let mut list = RecordListBuilder::new(tx_id(0));
        let mut tr = tracker();
        let child_id = list
            .add_following(FollowingKind::Ordinary, tx_id(0), &mut tr)
            .unwrap()
            .transaction_id;
        list.add_following(FollowingKind::Ordinary, child_id, &mut tr)
            .unwrap();

        let records = list.finalize(&tr);
        let user = records.iter().find(|r| r.transaction_id == tx_id(0)).unwrap();
        let child = records.iter().find(|r| r.transaction_id == child_id).unwrap();
        let grandchild = records
            .iter()
            .find(|r| r.transaction_id != tx_id(0) && r.transaction_id != child_id)
            .unwrap();

        assert_eq!(child.parent_consensus_timestamp, Some(user.consensus_timestamp));
        assert_eq!(grandchild.parent_consensus_timestamp, Some(child.consensus_timestamp));
        assert_eq!(user.parent_consensus_timestamp, None);
    }

    #[test]
    fn resource_limit_rejects_over_budget_children() {
        let mut list = RecordListBuilder::new(tx_id(0));
        let mut tr = ConsensusTimeTracker::new(ConsensusTimestamp::new(1_000, 0), 10, 1, 1);
        list.add_following(FollowingKind::Ordinary, tx_id(0), &mut tr)
            .unwrap();
        let err = list
            .add_following(FollowingKind::Ordinary, tx_id(0), &mut tr)
            .unwrap_err();
        assert_eq!(err, ResourceLimitError::MaxChildRecordsExceeded);
    }
}
