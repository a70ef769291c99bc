//! End-to-end round scenarios: revert propagation across sibling following
//! records, the migration run-once gate, and a resource-limit abort that
//! reverts a user transaction without taking down the round.

use async_trait::async_trait;
use ledger_api::authorizer::{AuthorizableBody, Authorizer, PrivilegedAuthorization};
use ledger_api::config::RoundExecutorConfig;
use ledger_api::fees::{FeeCalculator, FeeData, FeeManager, Fees};
use ledger_api::handler::{HandleContextView, RequiredKeys, TransactionHandler};
use ledger_api::notify::NotificationBus;
use ledger_api::record_stream::RecordStreamSink;
use ledger_api::verifier::{SignatureVerifier, VerificationKey, VerificationResult};
use ledger_dispatch::{Dispatcher, NoopHandler};
use ledger_round::{MigrationEvent, MigrationPublisher, RoundExecutor, UserTransaction};
use ledger_state::InMemoryStateAccess;
use ledger_types::error::{HandleError, PreCheckError};
use ledger_types::ids::{AccountId, ConsensusTimestamp, Functionality, NodeId};
use ledger_types::record::Record;
use ledger_types::status::ResponseCode;
use std::sync::{Arc, Mutex};

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

const CHILD_OK: Functionality = Functionality(10);
const CHILD_FAIL: Functionality = Functionality(11);
const PARENT_FANS_OUT: Functionality = Functionality(12);

struct AlwaysFailHandler;
#[async_trait]
impl TransactionHandler for AlwaysFailHandler {
    fn pure_checks(&self, _transaction_bytes: &[u8]) -> Result<(), PreCheckError> {
        Ok(())
    }
    fn pre_handle(&self, _transaction_bytes: &[u8]) -> Result<RequiredKeys, PreCheckError> {
        Ok(RequiredKeys::default())
    }
    async fn handle(&self, _ctx: &mut dyn HandleContextView) -> Result<(), HandleError> {
        Err(HandleError::HandlerFailure("child always fails".into()))
    }
}

struct FanOutHandler;
#[async_trait]
impl TransactionHandler for FanOutHandler {
    fn pure_checks(&self, _transaction_bytes: &[u8]) -> Result<(), PreCheckError> {
        Ok(())
    }
    fn pre_handle(&self, _transaction_bytes: &[u8]) -> Result<RequiredKeys, PreCheckError> {
        Ok(RequiredKeys {
            payer_key_required: true,
            ..RequiredKeys::default()
        })
    }
    async fn handle(&self, ctx: &mut dyn HandleContextView) -> Result<(), HandleError> {
        ctx.dispatch_child_ordinary(CHILD_OK, vec![]).await?;
        let _ = ctx.dispatch_child_ordinary(CHILD_FAIL, vec![]).await;
        Ok(())
    }
}

fn base_dispatcher() -> Dispatcher {
    let mut d = Dispatcher::new();
    d.register(CHILD_OK, Arc::new(NoopHandler));
    d.register(CHILD_FAIL, Arc::new(AlwaysFailHandler));
    d.register(PARENT_FANS_OUT, Arc::new(FanOutHandler));
    d
}

fn executor(dispatcher: Dispatcher, config: RoundExecutorConfig, sink: Arc<RecordingSink>, migration: MigrationPublisher) -> RoundExecutor {
    RoundExecutor::new(
        InMemoryStateAccess::new(),
        config,
        dispatcher,
        Arc::new(AllowAllVerifier),
        Arc::new(AllowAll),
        Arc::new(FreeFees),
        sink,
        NotificationBus::new(),
        migration,
    )
}

#[tokio::test]
async fn a_failing_child_reverts_its_successful_sibling() {
    let mut executor = executor(
        base_dispatcher(),
        RoundExecutorConfig::default(),
        Arc::new(RecordingSink::default()),
        MigrationPublisher::new(vec![]),
    );
    let payer = AccountId::from([4u8; 32]);
    let tx = UserTransaction {
        payer,
        payer_public_key: vec![1],
        valid_start: ConsensusTimestamp::new(30_000, 0),
        functionality: PARENT_FANS_OUT,
        transaction_bytes: vec![],
        submitting_node: NodeId(1),
    };

    let report = executor.run_round(1, ConsensusTimestamp::new(30_000, 0), vec![tx]).await;
    assert!(!report.aborted);
    assert_eq!(report.records.len(), 3);
    assert!(report.records[0].status.is_success(), "user record should still succeed");
    assert_eq!(report.records[1].status, ResponseCode::HandlerFailure, "successful sibling is reverted too");
    assert_eq!(report.records[2].status, ResponseCode::HandlerFailure);
}

#[tokio::test]
async fn migration_records_stream_once_per_round_set() {
    let migration = MigrationPublisher::new(vec![MigrationEvent {
        account: AccountId::from([9u8; 32]),
        memo: "staking reward account".into(),
    }]);
    let mut executor = executor(
        base_dispatcher(),
        RoundExecutorConfig::default(),
        Arc::new(RecordingSink::default()),
        migration,
    );

    let make_tx = |seconds: i64, node: u64| UserTransaction {
        payer: AccountId::from([1u8; 32]),
        payer_public_key: vec![1],
        valid_start: ConsensusTimestamp::new(seconds, 0),
        functionality: CHILD_OK,
        transaction_bytes: vec![],
        submitting_node: NodeId(node),
    };

    let first_round = executor
        .run_round(1, ConsensusTimestamp::new(40_000, 0), vec![make_tx(40_000, 1), make_tx(40_001, 2)])
        .await;
    assert!(!first_round.aborted);
    // migration preceding record + 2 user records; migration runs only once.
    assert_eq!(first_round.records.len(), 3);
    assert_eq!(first_round.records[0].memo, "staking reward account");

    let second_round = executor
        .run_round(2, ConsensusTimestamp::new(50_000, 0), vec![make_tx(50_000, 1)])
        .await;
    assert!(!second_round.aborted);
    assert_eq!(second_round.records.len(), 1);
    assert!(second_round.records.iter().all(|r| r.memo != "staking reward account"));
}

#[tokio::test]
async fn exceeding_the_limited_preceding_cap_reverts_only_that_transaction() {
    let mut config = RoundExecutorConfig::default();
    config.max_limited_preceding_records = 0;

    struct RequestsHollowCreate;
    #[async_trait]
    impl TransactionHandler for RequestsHollowCreate {
        fn pure_checks(&self, _transaction_bytes: &[u8]) -> Result<(), PreCheckError> {
            Ok(())
        }
        fn pre_handle(&self, _transaction_bytes: &[u8]) -> Result<RequiredKeys, PreCheckError> {
            Ok(RequiredKeys::default())
        }
        async fn handle(&self, ctx: &mut dyn HandleContextView) -> Result<(), HandleError> {
            ctx.dispatch_preceding_limited(CHILD_OK, vec![]).await
        }
    }
    const WANTS_PRECEDING: Functionality = Functionality(13);

    let mut dispatcher = base_dispatcher();
    dispatcher.register(WANTS_PRECEDING, Arc::new(RequestsHollowCreate));

    let mut executor = executor(dispatcher, config, Arc::new(RecordingSink::default()), MigrationPublisher::new(vec![]));
    let tx = UserTransaction {
        payer: AccountId::from([5u8; 32]),
        payer_public_key: vec![1],
        valid_start: ConsensusTimestamp::new(60_000, 0),
        functionality: WANTS_PRECEDING,
        transaction_bytes: vec![],
        submitting_node: NodeId(2),
    };

    let report = executor.run_round(1, ConsensusTimestamp::new(60_000, 0), vec![tx]).await;
    assert!(!report.aborted, "a resource-limit rejection is not round-fatal");
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].status, ResponseCode::MaxChildRecordsExceeded);
}
