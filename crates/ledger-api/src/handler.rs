//! The handler contract: the trait every concrete service implements, and
//! that the dispatcher in `ledger-dispatch` looks up by functionality.
//! Pure-checks and pre-handle are separate trait methods from the mutating
//! handle step, so a transaction can be rejected cheaply before any state
//! access happens.

use crate::authorizer::Authorizer;
use crate::fees::Fees;
use crate::state::StateAccess;
use crate::verifier::SignatureVerifier;
use async_trait::async_trait;
use ledger_types::error::{HandleError, PreCheckError};
use ledger_types::ids::{AccountId, Functionality};
use ledger_types::record::RecordBuilder;
use ledger_types::status::ResponseCode;

/// The required-signer set a pre-handle phase gathers for a transaction.
#[derive(Clone, Debug, Default)]
pub struct RequiredKeys {
    pub payer_key_required: bool,
    pub non_payer_keys: Vec<Vec<u8>>,
    pub hollow_account_aliases: Vec<[u8; 20]>,
}

/// One business operation's validation and state-mutation logic.
/// `ledger-services` provides concrete implementations; the dispatcher only
/// ever sees this trait.
#[async_trait]
pub trait TransactionHandler: Send + Sync {
    /// Structural validation only; no state access.
    fn pure_checks(&self, transaction_bytes: &[u8]) -> Result<(), PreCheckError>;

    /// Resolves the keys that must have signed for this transaction to be
    /// valid.
    fn pre_handle(&self, transaction_bytes: &[u8]) -> Result<RequiredKeys, PreCheckError>;

    /// Validates and applies the transaction under the handle context's
    /// child savepoint stack.
    async fn handle(&self, ctx: &mut dyn HandleContextView) -> Result<(), HandleError>;

    /// Runs after a successful `handle`, seeing the same child stack, for
    /// service-specific side effects that must happen only on success (e.g.
    /// token-transfer finalization).
    async fn finalize(&self, _ctx: &mut dyn HandleContextView) -> Result<(), HandleError> {
        Ok(())
    }
}

/// The façade `ledger-services` handlers are written against: transaction
/// body, payer id and key, consensus time, configuration, readable/writable
/// store by capability, verifier/authorizer/fee-calculator access, and the
/// child-dispatch primitives. The concrete `HandleContext` lives in
/// `ledger-dispatch`; this trait is the seam that lets `ledger-api` describe
/// the contract without depending upward on it.
#[async_trait]
pub trait HandleContextView: Send + Sync {
    fn transaction_bytes(&self) -> &[u8];
    fn consensus_time(&self) -> ledger_types::ids::ConsensusTimestamp;
    fn payer(&self) -> Option<AccountId>;
    fn functionality(&self) -> Functionality;

    /// A writable view of `service`'s state, scoped from the top of the
    /// current savepoint stack.
    fn writable_store(&mut self, service: &str) -> Box<dyn StateAccess + '_>;

    /// A read-only view of `service`'s state.
    fn readable_store(&self, service: &str) -> Box<dyn StateAccess + '_>;

    /// Records a transfer against the record currently being built.
    fn add_transfer(&mut self, account: AccountId, amount: i64);

    /// Overrides the status of the record currently being built. Handlers
    /// only need this for non-`HandlerFailure` business outcomes that still
    /// count as success paths; failures should return `Err` instead.
    fn set_status(&mut self, status: ResponseCode);

    fn verifier(&self) -> &dyn SignatureVerifier;
    fn authorizer(&self) -> &dyn Authorizer;

    /// Computes fees for the transaction currently being handled, returning
    /// `Fees::FREE` if the payer is authorized to waive them.
    fn dispatch_compute_fees(&self) -> Fees;

    /// Creates a *limited preceding* dispatch: capped to a per-user
    /// transaction bound, its effects committed to the base frame on
    /// success.
    async fn dispatch_preceding_limited(
        &mut self,
        functionality: Functionality,
        transaction_bytes: Vec<u8>,
    ) -> Result<(), HandleError>;

    /// Creates a *reversible preceding* dispatch: its effects stay inside
    /// the enclosing frame and are undone if the user transaction later
    /// fails.
    async fn dispatch_preceding_reversible(
        &mut self,
        functionality: Functionality,
        transaction_bytes: Vec<u8>,
    ) -> Result<(), HandleError>;

    /// Creates a *removable preceding* dispatch: its record is dropped from
    /// the emitted list entirely if the user transaction reverts.
    async fn dispatch_preceding_removable(
        &mut self,
        functionality: Functionality,
        transaction_bytes: Vec<u8>,
    ) -> Result<(), HandleError>;

    /// Creates an ordinary *following* (child) dispatch.
    async fn dispatch_child_ordinary(
        &mut self,
        functionality: Functionality,
        transaction_bytes: Vec<u8>,
    ) -> Result<(), HandleError>;

    /// Creates a *removable* following dispatch: dropped entirely from the
    /// list if its ancestor reverts.
    async fn dispatch_child_removable(
        &mut self,
        functionality: Functionality,
        transaction_bytes: Vec<u8>,
    ) -> Result<(), HandleError>;

    /// Creates a *removable* following dispatch like
    /// `dispatch_child_removable`, but runs `customize` against the child's
    /// record builder immediately after a successful handle, before it is
    /// committed — used when a service needs to tailor what gets
    /// externalized (e.g. a redacted memo) without giving the handler itself
    /// direct access to its own record metadata.
    async fn dispatch_child_removable_with_customizer(
        &mut self,
        functionality: Functionality,
        transaction_bytes: Vec<u8>,
        customize: Box<dyn for<'c> FnOnce(&'c mut RecordBuilder) + Send>,
    ) -> Result<(), HandleError>;
}
