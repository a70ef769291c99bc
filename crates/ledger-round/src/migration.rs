//! The migration record publisher: at most once per software upgrade,
//! externalises the state changes the platform applied implicitly on
//! startup, as a list of deferred record-producing events run as unlimited
//! preceding dispatches.

use ledger_records::{ConsensusTimeTracker, RecordListBuilder};
use ledger_types::error::ResourceLimitError;
use ledger_types::ids::AccountId;
use ledger_types::record::PrecedingKind;

/// One state change the platform already applied before the first round
/// (e.g. creating staking reward accounts, cloning treasury accounts,
/// renewing contracts under a free-renewal policy, registering blocked
/// accounts).
#[derive(Clone, Debug)]
pub struct MigrationEvent {
    pub account: AccountId,
    pub memo: String,
}

/// Publishes a fixed, deterministic set of migration events as unlimited
/// preceding records on the first user transaction's record list. The
/// caller is responsible for the run-once gate (a flag lives on the round
/// executor, not here — this publisher is unconditional once invoked).
pub struct MigrationPublisher {
    events: Vec<MigrationEvent>,
}

impl MigrationPublisher {
    pub fn new(events: Vec<MigrationEvent>) -> Self {
        Self { events }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Adds one unlimited-preceding record per migration event, in
    /// deterministic (vector) order, receiving nonces 1..N ahead of the
    /// first user transaction.
    pub fn publish(
        &self,
        record_list: &mut RecordListBuilder,
        tracker: &mut ConsensusTimeTracker,
    ) -> Result<(), ResourceLimitError> {
        for event in &self.events {
            let builder = record_list.add_preceding(PrecedingKind::Unlimited, tracker)?;
            builder.memo = event.memo.clone();
            builder.add_transfer(event.account, 0);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_types::ids::{ConsensusTimestamp, TransactionId};

    #[test]
    fn publishes_one_preceding_record_per_event() {
        let mut record_list = RecordListBuilder::new(TransactionId::new(
            AccountId::from([1u8; 32]),
            ConsensusTimestamp::new(5_000, 0),
        ));
        let mut tracker = ConsensusTimeTracker::new(ConsensusTimestamp::new(5_000, 0), 100, 100, 1);
        let publisher = MigrationPublisher::new(vec![
            MigrationEvent { account: AccountId::from([2u8; 32]), memo: "staking reward account".into() },
            MigrationEvent { account: AccountId::from([3u8; 32]), memo: "treasury clone".into() },
        ]);

        publisher.publish(&mut record_list, &mut tracker).unwrap();
        assert_eq!(record_list.preceding_len(), 2);

        let records = record_list.finalize(&tracker);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].memo, "staking reward account");
        assert_eq!(records[1].memo, "treasury clone");
    }
}
