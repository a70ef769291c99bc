//! The round executor: drives the per-round state machine START →
//! (MIGRATION) → per-transaction phases → END over a single in-process root
//! state container.

use crate::migration::MigrationPublisher;
use ledger_api::authorizer::Authorizer;
use ledger_api::config::RoundExecutorConfig;
use ledger_api::fees::FeeManager;
use ledger_api::notify::{IssReport, NotificationBus};
use ledger_api::record_stream::RecordStreamSink;
use ledger_api::state::StateAccess;
use ledger_api::verifier::{SignatureVerifier, VerificationKey};
use ledger_dispatch::{Dispatcher, HandleContext};
use ledger_records::{ConsensusTimeTracker, RecordCache};
use ledger_state::{InMemoryStateAccess, SavepointStack};
use ledger_types::ids::{AccountId, ConsensusTimestamp, Functionality, NodeId, TransactionId};
use ledger_types::record::Record;
use std::sync::Arc;

/// One user transaction as delivered by the platform round feed:
/// pre-validated and pre-signature-gathered, so the core never touches wire
/// bytes directly.
#[derive(Clone, Debug)]
pub struct UserTransaction {
    pub payer: AccountId,
    pub payer_public_key: Vec<u8>,
    pub valid_start: ConsensusTimestamp,
    pub functionality: Functionality,
    pub transaction_bytes: Vec<u8>,
    pub submitting_node: NodeId,
}

/// The fixed set of capabilities a round executor is constructed with:
/// everything the core consumes from its environment except the state root
/// itself, which the executor owns directly for the duration of a round.
pub struct RoundExecutor {
    root: InMemoryStateAccess,
    config: RoundExecutorConfig,
    dispatcher: Dispatcher,
    cache: RecordCache,
    verifier: Arc<dyn SignatureVerifier>,
    authorizer: Arc<dyn Authorizer>,
    fee_manager: Arc<dyn FeeManager>,
    record_sink: Arc<dyn RecordStreamSink>,
    notifications: NotificationBus,
    migration: MigrationPublisher,
    migration_records_streamed: bool,
}

/// What one round produced: every record externalised, in emission order,
/// across every user transaction the round processed before it either
/// finished normally or was aborted by a fatal `StateError`.
#[derive(Default)]
pub struct RoundReport {
    pub records: Vec<Record>,
    pub aborted: bool,
}

impl RoundExecutor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        root: InMemoryStateAccess,
        config: RoundExecutorConfig,
        dispatcher: Dispatcher,
        verifier: Arc<dyn SignatureVerifier>,
        authorizer: Arc<dyn Authorizer>,
        fee_manager: Arc<dyn FeeManager>,
        record_sink: Arc<dyn RecordStreamSink>,
        notifications: NotificationBus,
        migration: MigrationPublisher,
    ) -> Self {
        let ttl = config.record_cache_ttl_seconds;
        Self {
            root,
            config,
            dispatcher,
            cache: RecordCache::new(ttl),
            verifier,
            authorizer,
            fee_manager,
            record_sink,
            notifications,
            migration,
            migration_records_streamed: false,
        }
    }

    pub fn root(&self) -> &InMemoryStateAccess {
        &self.root
    }

    /// Runs one consensus round over `transactions`, all sharing
    /// `consensus_base` as their round-level timestamp anchor.
    pub async fn run_round(&mut self, round_no: u64, consensus_base: ConsensusTimestamp, transactions: Vec<UserTransaction>) -> RoundReport {
        tracing::info!(target: "round_executor", event = "round_start", round = round_no, tx_count = transactions.len());
        let mut report = RoundReport::default();

        for (index, tx) in transactions.into_iter().enumerate() {
            match self.run_transaction(round_no, index == 0, tx).await {
                Ok(records) => report.records.extend(records),
                Err(reason) => {
                    report.aborted = true;
                    self.notifications
                        .notify_iss(IssReport { round: round_no, reason })
                        .await;
                    break;
                }
            }
        }

        self.cache.evict(consensus_base.seconds);
        tracing::info!(target: "round_executor", event = "round_end", round = round_no, aborted = report.aborted, emitted = report.records.len());
        report
    }

    /// Runs the OPEN_SAVEPOINT..CACHE_UPDATE phases for one user
    /// transaction, applying its net state diff to the root on any outcome
    /// short of a fatal `StateError`. Returns `Err(reason)` only for a
    /// `StateError`, which the caller treats as round-fatal.
    async fn run_transaction(&mut self, round_no: u64, is_first: bool, tx: UserTransaction) -> Result<Vec<Record>, String> {
        let submitting_node = tx.submitting_node;
        let tracker_base = tx.valid_start;
        let mut tracker = ConsensusTimeTracker::new(
            tracker_base,
            self.config.max_preceding_offset,
            self.config.max_following_offset,
            self.config.offset_tick_nanos,
        );
        let user_id = TransactionId::new(tx.payer, tx.valid_start);
        let mut record_list = ledger_records::RecordListBuilder::new(user_id);

        if is_first && !self.migration_records_streamed && !self.migration.is_empty() {
            if let Err(e) = self.migration.publish(&mut record_list, &mut tracker) {
                tracing::warn!(target: "round_executor", event = "migration_capacity_exceeded", round = round_no, error = %e);
            }
        }

        if let ledger_records::DuplicateStatus::SameNode = self.cache.has_duplicate(&user_id, tx.submitting_node) {
            record_list
                .user_mut()
                .set_status(ledger_types::status::ResponseCode::DuplicateTransaction);
            return self.externalize(is_first, submitting_node, record_list, &tracker, &[]).await;
        }

        let mut stack = SavepointStack::new(&self.root);

        let pure_checks = self.dispatcher.dispatch_pure_checks(tx.functionality, &tx.transaction_bytes);
        let pre_handle = pure_checks
            .clone()
            .and_then(|_| self.dispatcher.dispatch_pre_handle(tx.functionality, &tx.transaction_bytes));

        let precheck_failure = match (&pure_checks, &pre_handle) {
            (Err(e), _) => Some(e.to_response_code()),
            (_, Err(e)) => Some(e.to_response_code()),
            _ => None,
        };

        if let Some(status) = precheck_failure {
            record_list.user_mut().set_status(status);
            return self.externalize(is_first, submitting_node, record_list, &tracker, &[]).await;
        }
        let required = pre_handle.expect("checked above");

        if required.payer_key_required
            && !self
                .verifier
                .verification_for(&VerificationKey::Ed25519(tx.payer_public_key.clone()))
                .passed()
        {
            record_list
                .user_mut()
                .set_status(ledger_types::status::ResponseCode::InvalidSignature);
            return self.externalize(is_first, submitting_node, record_list, &tracker, &[]).await;
        }

        if !self.authorizer.is_authorized(tx.payer, tx.functionality) {
            record_list
                .user_mut()
                .set_status(ledger_types::status::ResponseCode::Unauthorized);
            return self.externalize(is_first, submitting_node, record_list, &tracker, &[]).await;
        }

        stack.create_savepoint();
        {
            let mut ctx = HandleContext::new(
                &mut stack,
                &mut record_list,
                &mut tracker,
                &self.dispatcher,
                &*self.verifier,
                &*self.authorizer,
                &*self.fee_manager,
                &self.config,
                Some(tx.payer),
                tx.valid_start,
                tx.functionality,
                tx.transaction_bytes.clone(),
            );
            let outcome = self.dispatcher.dispatch_handle(tx.functionality, &mut ctx).await;
            drop(ctx);

            match outcome {
                Ok(()) => {
                    if let Err(e) = stack.commit() {
                        return Err(format!("commit after successful handle: {e}"));
                    }
                }
                Err(e) => {
                    if let Err(state_err) = stack.rollback() {
                        return Err(format!("rollback after failed handle: {state_err}"));
                    }
                    let status = e.to_response_code();
                    record_list.user_mut().set_status(status);
                    record_list.revert_children_of(user_id, status);
                    record_list.revert_reversible_preceding(status);
                }
            }
        }

        let diff = stack.into_base_batch();
        self.externalize(is_first, submitting_node, record_list, &tracker, &diff).await
    }

    async fn externalize(
        &mut self,
        is_first: bool,
        submitting_node: NodeId,
        record_list: ledger_records::RecordListBuilder,
        tracker: &ConsensusTimeTracker,
        diff: &[(Vec<u8>, Option<Vec<u8>>)],
    ) -> Result<Vec<Record>, String> {
        for (key, value) in diff {
            match value {
                Some(v) => {
                    self.root.insert(key, v).map_err(|e| e.to_string())?;
                }
                None => {
                    self.root.delete(key).map_err(|e| e.to_string())?;
                }
            }
        }

        let records = record_list.finalize(tracker);
        for record in &records {
            self.record_sink.emit(record.clone(), record.sidecars.clone()).await;
        }
        for record in &records {
            self.cache.add(record.clone(), submitting_node);
        }
        if is_first && !self.migration_records_streamed && !self.migration.is_empty() {
            self.migration_records_streamed = true;
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ledger_api::authorizer::{AuthorizableBody, Authorizer, PrivilegedAuthorization};
    use ledger_api::fees::{FeeCalculator, FeeData, FeeManager, Fees};
    use ledger_api::verifier::{SignatureVerifier, VerificationKey, VerificationResult};
    use ledger_services::crypto::{CryptoTransferBody, CryptoTransferHandler, HollowAccountCreateHandler};
    use ledger_services::system::SystemNoopHandler;
    use ledger_services::{CRYPTO_SERVICE, CRYPTO_TRANSFER, HOLLOW_ACCOUNT_CREATE, SYSTEM_NOOP};
    use ledger_state::container::KVState;
    use parity_scale_codec::Encode;
    use std::sync::Mutex;

    struct AllowAll;
    impl Authorizer for AllowAll {
        fn is_authorized(&self, _payer: AccountId, _functionality: Functionality) -> bool {
            true
        }
        fn has_privileged_authorization(
            &self,
            _payer: AccountId,
            _functionality: Functionality,
            _body: &dyn AuthorizableBody,
        ) -> PrivilegedAuthorization {
            PrivilegedAuthorization::Unnecessary
        }
        fn has_waived_fees(&self, _payer: AccountId, _functionality: Functionality, _body: &dyn AuthorizableBody) -> bool {
            true
        }
        fn is_super_user(&self, _payer: AccountId) -> bool {
            false
        }
    }

    struct AllowAllVerifier;
    impl SignatureVerifier for AllowAllVerifier {
        fn verification_for(&self, _key: &VerificationKey) -> VerificationResult {
            VerificationResult::Passed
        }
        fn verification_for_with_assistant(&self, _key: &VerificationKey, _assistant: &VerificationKey) -> VerificationResult {
            VerificationResult::Passed
        }
        fn verified_signature_count(&self) -> usize {
            1
        }
        fn signature_map_size(&self) -> usize {
            1
        }
    }

    struct FreeFees;
    impl FeeCalculator for FreeFees {
        fn calculate(&self) -> Fees {
            Fees::FREE
        }
    }
    impl FeeManager for FreeFees {
        fn create_fee_calculator(
            &self,
            _payer: AccountId,
            _functionality: Functionality,
            _num_sigs: usize,
            _sig_map_size: usize,
            _consensus_time: ConsensusTimestamp,
            _sub_type: u8,
        ) -> Box<dyn FeeCalculator> {
            Box::new(FreeFees)
        }
        fn fee_data(&self, _functionality: Functionality, _consensus_time: ConsensusTimestamp, _sub_type: u8) -> FeeData {
            FeeData::default()
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        records: Mutex<Vec<Record>>,
    }
    #[async_trait]
    impl RecordStreamSink for RecordingSink {
        async fn emit(&self, record: Record, _sidecars: Vec<Vec<u8>>) {
            self.records.lock().unwrap().push(record);
        }
    }

    fn dispatcher() -> Dispatcher {
        let mut d = Dispatcher::new();
        d.register(CRYPTO_TRANSFER, Arc::new(CryptoTransferHandler));
        d.register(HOLLOW_ACCOUNT_CREATE, Arc::new(HollowAccountCreateHandler));
        d.register(SYSTEM_NOOP, Arc::new(SystemNoopHandler));
        d
    }

    fn seeded_root(balances: &[(AccountId, i64)]) -> InMemoryStateAccess {
        let mut root = InMemoryStateAccess::new();
        {
            let mut accounts: KVState<AccountId, i64> = KVState::new(&mut root, CRYPTO_SERVICE, "ACCOUNTS");
            for (account, balance) in balances {
                accounts.put(*account, *balance).unwrap();
            }
        }
        root
    }

    fn executor(root: InMemoryStateAccess, sink: Arc<RecordingSink>) -> RoundExecutor {
        RoundExecutor::new(
            root,
            RoundExecutorConfig::default(),
            dispatcher(),
            Arc::new(AllowAllVerifier),
            Arc::new(AllowAll),
            Arc::new(FreeFees),
            sink,
            NotificationBus::new(),
            MigrationPublisher::new(vec![]),
        )
    }

    #[tokio::test]
    async fn successful_transfer_externalizes_one_record_with_transfers() {
        let sink = Arc::new(RecordingSink::default());
        let sender = AccountId::from([1u8; 32]);
        let recipient = AccountId::from([2u8; 32]);
        let mut executor = executor(seeded_root(&[(sender, 1_000)]), sink.clone());

        let body = CryptoTransferBody { sender, recipient, amount: 100 };
        let tx = UserTransaction {
            payer: sender,
            payer_public_key: vec![1, 2, 3],
            valid_start: ConsensusTimestamp::new(10_000, 0),
            functionality: CRYPTO_TRANSFER,
            transaction_bytes: body.encode(),
            submitting_node: NodeId(1),
        };

        let report = executor.run_round(1, ConsensusTimestamp::new(10_000, 0), vec![tx]).await;
        assert!(!report.aborted);
        assert_eq!(report.records.len(), 2);
        assert!(report.records[0].status.is_success());
        assert_eq!(report.records[1].transfers.len(), 2);
    }

    #[tokio::test]
    async fn duplicate_submission_from_same_node_short_circuits() {
        let sink = Arc::new(RecordingSink::default());
        let payer = AccountId::from([7u8; 32]);
        let mut executor = executor(seeded_root(&[(payer, 1_000)]), sink.clone());

        let tx = UserTransaction {
            payer,
            payer_public_key: vec![1],
            valid_start: ConsensusTimestamp::new(20_000, 0),
            functionality: SYSTEM_NOOP,
            transaction_bytes: vec![],
            submitting_node: NodeId(9),
        };

        let first = executor.run_round(1, ConsensusTimestamp::new(20_000, 0), vec![tx.clone()]).await;
        assert!(first.records[0].status.is_success());

        let second = executor.run_round(2, ConsensusTimestamp::new(20_000, 0), vec![tx]).await;
        assert_eq!(second.records.len(), 1);
        assert_eq!(second.records[0].status, ledger_types::status::ResponseCode::DuplicateTransaction);
    }
}
