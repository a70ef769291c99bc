//! The concrete handle context: the façade every handler actually runs
//! against, wiring a savepoint stack, record list builder, and consensus
//! time tracker to the capability traits from `ledger-api`. Borrows the same
//! set of capabilities for the duration of one handler call rather than
//! owning them.

use crate::dispatcher::Dispatcher;
use async_trait::async_trait;
use ledger_api::authorizer::{AuthorizableBody, Authorizer};
use ledger_api::config::RoundExecutorConfig;
use ledger_api::fees::{FeeManager, Fees};
use ledger_api::handler::HandleContextView;
use ledger_api::state::StateAccess;
use ledger_api::verifier::{SignatureVerifier, VerificationKey};
use ledger_records::{ConsensusTimeTracker, RecordListBuilder};
use ledger_state::{ReadOnlyServiceScopedAccess, SavepointStack, ServiceScopedAccess};
use ledger_types::error::HandleError;
use ledger_types::ids::{AccountId, ConsensusTimestamp, Functionality};
use ledger_types::record::PrecedingKind;
use ledger_types::status::ResponseCode;

/// Which record the context's `add_transfer`/`set_status` calls currently
/// mutate — the context always has exactly one record it is building.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum ActiveRecord {
    User,
    Preceding(usize),
    Following(usize),
}

/// Which kind of dispatch is currently running under this context, used
/// solely to enforce the "a preceding dispatch cannot be invoked from within
/// a PRECEDING dispatch" rejection.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum DispatchKind {
    User,
    Preceding,
    Following,
}

/// Whether a successful preceding dispatch commits into the enclosing frame
/// only, or flattens the whole stack.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum PrecedingCommitMode {
    FullStack,
    CurrentFrame,
}

/// An `AuthorizableBody` that never targets a protected entity, used when
/// computing fees for a synthetic dispatch whose body the context has no
/// parsed view of.
struct OpaqueBody;
impl AuthorizableBody for OpaqueBody {
    fn targets_protected_entity(&self) -> bool {
        false
    }
}

/// The façade passed to `TransactionHandler::handle`/`finalize`. Lifetime
/// `'r` is the state root's lifetime (shared with the `SavepointStack`);
/// `'a` is the borrow over this one dispatch.
pub struct HandleContext<'r, 'a> {
    stack: &'a mut SavepointStack<'r>,
    record_list: &'a mut RecordListBuilder,
    tracker: &'a mut ConsensusTimeTracker,
    dispatcher: &'a Dispatcher,
    verifier: &'a dyn SignatureVerifier,
    authorizer: &'a dyn Authorizer,
    fee_manager: &'a dyn FeeManager,
    config: &'a RoundExecutorConfig,
    payer: Option<AccountId>,
    consensus_time: ConsensusTimestamp,
    functionality: Functionality,
    transaction_bytes: Vec<u8>,
    active_record: ActiveRecord,
    dispatch_kind: DispatchKind,
    limited_preceding_count: u32,
}

impl<'r, 'a> HandleContext<'r, 'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        stack: &'a mut SavepointStack<'r>,
        record_list: &'a mut RecordListBuilder,
        tracker: &'a mut ConsensusTimeTracker,
        dispatcher: &'a Dispatcher,
        verifier: &'a dyn SignatureVerifier,
        authorizer: &'a dyn Authorizer,
        fee_manager: &'a dyn FeeManager,
        config: &'a RoundExecutorConfig,
        payer: Option<AccountId>,
        consensus_time: ConsensusTimestamp,
        functionality: Functionality,
        transaction_bytes: Vec<u8>,
    ) -> Self {
        Self {
            stack,
            record_list,
            tracker,
            dispatcher,
            verifier,
            authorizer,
            fee_manager,
            config,
            payer,
            consensus_time,
            functionality,
            transaction_bytes,
            active_record: ActiveRecord::User,
            dispatch_kind: DispatchKind::User,
            limited_preceding_count: 0,
        }
    }

    fn user_transaction_id(&self) -> ledger_types::ids::TransactionId {
        self.record_list.user().transaction_id
    }

    fn active_record_mut(&mut self) -> &mut ledger_types::record::RecordBuilder {
        match self.active_record {
            ActiveRecord::User => self.record_list.user_mut(),
            ActiveRecord::Preceding(index) => self.record_list.preceding_mut(index),
            ActiveRecord::Following(index) => self.record_list.following_mut(index),
        }
    }

    /// Verifies every additional required key gathered by pre-handle against
    /// the context's verifier, regardless of which dispatch kind is running.
    fn verify_required_keys(&self, required: &ledger_api::handler::RequiredKeys) -> Result<(), HandleError> {
        for key in &required.non_payer_keys {
            if !self
                .verifier
                .verification_for(&VerificationKey::Ed25519(key.clone()))
                .passed()
            {
                return Err(HandleError::InvalidSignature("non-payer key".to_string()));
            }
        }
        for alias in &required.hollow_account_aliases {
            if !self
                .verifier
                .verification_for(&VerificationKey::EvmAlias(*alias))
                .passed()
            {
                return Err(HandleError::InvalidSignature("hollow account alias".to_string()));
            }
        }
        Ok(())
    }

    /// Runs one synthetic dispatch's pure-checks/pre-handle/key-verification
    /// and, if all pass, hands control to `body` with the context's
    /// dispatch-scoped fields (`transaction_bytes`, `functionality`, `payer`,
    /// `active_record`, `dispatch_kind`) swapped in for the duration.
    async fn run_synthetic(
        &mut self,
        functionality: Functionality,
        transaction_bytes: Vec<u8>,
        active_record: ActiveRecord,
        dispatch_kind: DispatchKind,
    ) -> Result<(), HandleError> {
        self.dispatcher.dispatch_pure_checks(functionality, &transaction_bytes)?;
        let required = self.dispatcher.dispatch_pre_handle(functionality, &transaction_bytes)?;
        self.verify_required_keys(&required)?;

        let previous_bytes = std::mem::replace(&mut self.transaction_bytes, transaction_bytes);
        let previous_functionality = std::mem::replace(&mut self.functionality, functionality);
        let previous_payer = self.payer.take();
        let previous_active_record = std::mem::replace(&mut self.active_record, active_record);
        let previous_dispatch_kind = std::mem::replace(&mut self.dispatch_kind, dispatch_kind);

        let dispatcher = self.dispatcher;
        let result = dispatcher.dispatch_handle(functionality, self).await;

        self.transaction_bytes = previous_bytes;
        self.functionality = previous_functionality;
        self.payer = previous_payer;
        self.active_record = previous_active_record;
        self.dispatch_kind = previous_dispatch_kind;
        result
    }

    async fn dispatch_preceding(
        &mut self,
        kind: PrecedingKind,
        commit_mode: PrecedingCommitMode,
        functionality: Functionality,
        transaction_bytes: Vec<u8>,
    ) -> Result<(), HandleError> {
        if self.dispatch_kind == DispatchKind::Preceding {
            return Err(HandleError::NestedPrecedingDispatch);
        }
        if kind == PrecedingKind::Limited && self.limited_preceding_count >= self.config.max_limited_preceding_records {
            return Err(HandleError::ResourceLimit(
                ledger_types::error::ResourceLimitError::MaxChildRecordsExceeded,
            ));
        }
        // Weaker stand-in for the source's commented-out `stack.depth() > 1`
        // precondition (see DESIGN.md): a preceding dispatch whose own
        // pre-handle requires a payer signature may not be issued once the
        // current handler has already written to its frame, so fee-charging
        // auto-creation (no prior writes) keeps working while a handler that
        // already mutated state can't smuggle in a second payer-checked
        // dispatch afterward.
        if let Ok(required) = self.dispatcher.dispatch_pre_handle(functionality, &transaction_bytes) {
            if required.payer_key_required && self.stack.is_modified() {
                return Err(HandleError::PrecedingRequiresUnmodifiedFrame);
            }
        }

        let index = self.record_list.preceding_len();
        let builder = self.record_list.add_preceding(kind, self.tracker)?;
        builder.transaction_bytes = transaction_bytes.clone();

        self.stack.create_savepoint();
        let result = self
            .run_synthetic(functionality, transaction_bytes, ActiveRecord::Preceding(index), DispatchKind::Preceding)
            .await;

        match &result {
            Ok(()) => {
                match commit_mode {
                    PrecedingCommitMode::FullStack => {
                        self.stack.commit().expect("savepoint created above");
                        self.stack.commit_full_stack().expect("savepoint created above");
                        self.stack.create_savepoint();
                    }
                    PrecedingCommitMode::CurrentFrame => {
                        self.stack.commit().expect("savepoint created above");
                    }
                }
                if kind == PrecedingKind::Limited {
                    self.limited_preceding_count += 1;
                }
            }
            Err(e) => {
                self.stack.rollback().expect("savepoint created above");
                self.record_list.preceding_mut(index).set_status(e.to_response_code());
            }
        }
        result
    }

    async fn dispatch_child(
        &mut self,
        kind: ledger_types::record::FollowingKind,
        functionality: Functionality,
        transaction_bytes: Vec<u8>,
        customize: Option<Box<dyn for<'c> FnOnce(&'c mut ledger_types::record::RecordBuilder) + Send>>,
    ) -> Result<(), HandleError> {
        let source_id = match self.active_record {
            ActiveRecord::User => self.user_transaction_id(),
            ActiveRecord::Preceding(index) => self.record_list.preceding_mut(index).transaction_id,
            ActiveRecord::Following(index) => self.record_list.following_mut(index).transaction_id,
        };

        let index = self.record_list.following_len();
        let builder = self.record_list.add_following(kind, source_id, self.tracker)?;
        builder.transaction_bytes = transaction_bytes.clone();

        self.stack.create_savepoint();
        let result = self
            .run_synthetic(functionality, transaction_bytes, ActiveRecord::Following(index), DispatchKind::Following)
            .await;

        match &result {
            Ok(()) => {
                if let Some(customize) = customize {
                    customize(self.record_list.following_mut(index));
                }
                self.stack.commit().expect("savepoint created above");
            }
            Err(e) => {
                self.stack.rollback().expect("savepoint created above");
                let user_id = self.user_transaction_id();
                let status = e.to_response_code();
                self.record_list.revert_children_of(user_id, status);
                self.record_list.revert_reversible_preceding(status);
            }
        }
        result
    }
}

#[async_trait]
impl<'r, 'a> HandleContextView for HandleContext<'r, 'a> {
    fn transaction_bytes(&self) -> &[u8] {
        &self.transaction_bytes
    }

    fn consensus_time(&self) -> ConsensusTimestamp {
        self.consensus_time
    }

    fn payer(&self) -> Option<AccountId> {
        self.payer
    }

    fn functionality(&self) -> Functionality {
        self.functionality
    }

    fn writable_store(&mut self, service: &str) -> Box<dyn StateAccess + '_> {
        Box::new(ServiceScopedAccess::new(&mut *self.stack, service))
    }

    fn readable_store(&self, service: &str) -> Box<dyn StateAccess + '_> {
        Box::new(ReadOnlyServiceScopedAccess::new(&*self.stack, service))
    }

    fn add_transfer(&mut self, account: AccountId, amount: i64) {
        self.active_record_mut().add_transfer(account, amount);
    }

    fn set_status(&mut self, status: ResponseCode) {
        self.active_record_mut().set_status(status);
    }

    fn verifier(&self) -> &dyn SignatureVerifier {
        self.verifier
    }

    fn authorizer(&self) -> &dyn Authorizer {
        self.authorizer
    }

    fn dispatch_compute_fees(&self) -> Fees {
        let Some(payer) = self.payer else {
            return Fees::FREE;
        };
        if self.authorizer.has_waived_fees(payer, self.functionality, &OpaqueBody) {
            return Fees::FREE;
        }
        self.fee_manager
            .create_fee_calculator(
                payer,
                self.functionality,
                self.verifier.verified_signature_count(),
                self.verifier.signature_map_size(),
                self.consensus_time,
                0,
            )
            .calculate()
    }

    async fn dispatch_preceding_limited(
        &mut self,
        functionality: Functionality,
        transaction_bytes: Vec<u8>,
    ) -> Result<(), HandleError> {
        self.dispatch_preceding(
            PrecedingKind::Limited,
            PrecedingCommitMode::FullStack,
            functionality,
            transaction_bytes,
        )
        .await
    }

    async fn dispatch_preceding_reversible(
        &mut self,
        functionality: Functionality,
        transaction_bytes: Vec<u8>,
    ) -> Result<(), HandleError> {
        self.dispatch_preceding(
            PrecedingKind::Reversible,
            PrecedingCommitMode::CurrentFrame,
            functionality,
            transaction_bytes,
        )
        .await
    }

    async fn dispatch_preceding_removable(
        &mut self,
        functionality: Functionality,
        transaction_bytes: Vec<u8>,
    ) -> Result<(), HandleError> {
        self.dispatch_preceding(
            PrecedingKind::Removable,
            PrecedingCommitMode::FullStack,
            functionality,
            transaction_bytes,
        )
        .await
    }

    async fn dispatch_child_ordinary(
        &mut self,
        functionality: Functionality,
        transaction_bytes: Vec<u8>,
    ) -> Result<(), HandleError> {
        self.dispatch_child(ledger_types::record::FollowingKind::Ordinary, functionality, transaction_bytes, None)
            .await
    }

    async fn dispatch_child_removable(
        &mut self,
        functionality: Functionality,
        transaction_bytes: Vec<u8>,
    ) -> Result<(), HandleError> {
        self.dispatch_child(ledger_types::record::FollowingKind::Removable, functionality, transaction_bytes, None)
            .await
    }

    async fn dispatch_child_removable_with_customizer(
        &mut self,
        functionality: Functionality,
        transaction_bytes: Vec<u8>,
        customize: Box<dyn for<'c> FnOnce(&'c mut ledger_types::record::RecordBuilder) + Send>,
    ) -> Result<(), HandleError> {
        self.dispatch_child(
            ledger_types::record::FollowingKind::RemovableWithCustomizer,
            functionality,
            transaction_bytes,
            Some(customize),
        )
        .await
    }
}
