//! Crypto-transfer and hollow-account-creation handlers: decode a
//! SCALE-encoded body, look up balances under a `KVState<AccountId, i64>`,
//! and move value with `ctx.add_transfer` once solvency is confirmed. The
//! balance schema itself (account -> i64 balance) is this crate's own
//! invention — the core has no opinion on it, and also doubles as the
//! fixture that exercises `dispatch_preceding_limited`.

use crate::CRYPTO_SERVICE;
use async_trait::async_trait;
use ledger_api::handler::{HandleContextView, RequiredKeys, TransactionHandler};
use ledger_state::container::KVState;
use ledger_types::error::{HandleError, PreCheckError, SolvencyError};
use ledger_types::ids::AccountId;
use parity_scale_codec::{Decode, Encode};

/// The wire body of a crypto transfer: move `amount` from `sender` to
/// `recipient`. Transaction bodies are opaque to the core; `ledger-services`
/// owns its own encoding.
#[derive(Clone, Encode, Decode, Debug, PartialEq, Eq)]
pub struct CryptoTransferBody {
    pub sender: AccountId,
    pub recipient: AccountId,
    pub amount: i64,
}

fn decode_body(transaction_bytes: &[u8]) -> Result<CryptoTransferBody, PreCheckError> {
    CryptoTransferBody::decode(&mut &*transaction_bytes)
        .map_err(|e| PreCheckError::InvalidBody(e.to_string()))
}

pub struct CryptoTransferHandler;

#[async_trait]
impl TransactionHandler for CryptoTransferHandler {
    fn pure_checks(&self, transaction_bytes: &[u8]) -> Result<(), PreCheckError> {
        let body = decode_body(transaction_bytes)?;
        if body.amount <= 0 {
            return Err(PreCheckError::InvalidBody("transfer amount must be positive".into()));
        }
        if body.sender == body.recipient {
            return Err(PreCheckError::InvalidBody("sender and recipient must differ".into()));
        }
        Ok(())
    }

    fn pre_handle(&self, _transaction_bytes: &[u8]) -> Result<RequiredKeys, PreCheckError> {
        Ok(RequiredKeys {
            payer_key_required: true,
            ..RequiredKeys::default()
        })
    }

    async fn handle(&self, ctx: &mut dyn HandleContextView) -> Result<(), HandleError> {
        let body = decode_body(ctx.transaction_bytes()).map_err(HandleError::from)?;

        if ctx.payer() != Some(body.sender) {
            return Err(HandleError::InvalidSignature(
                "transfer sender must be the paying account".into(),
            ));
        }

        let fee = ctx.dispatch_compute_fees().total() as i64;

        let sender_balance = {
            let mut store = ctx.writable_store(CRYPTO_SERVICE);
            let accounts: KVState<AccountId, i64> = KVState::new(&mut *store, "", "ACCOUNTS");
            accounts
                .get(&body.sender)
                .expect("account balance state is never hand-edited")
                .ok_or(SolvencyError::PayerAccountNotFound)?
        };

        if sender_balance < body.amount + fee {
            return Err(HandleError::from(SolvencyError::InsufficientPayerBalance));
        }

        let recipient_exists = {
            let mut store = ctx.writable_store(CRYPTO_SERVICE);
            let accounts: KVState<AccountId, i64> = KVState::new(&mut *store, "", "ACCOUNTS");
            accounts
                .contains(&body.recipient)
                .expect("account balance state is never hand-edited")
        };

        if !recipient_exists {
            let create_body = HollowAccountCreateBody {
                account: body.recipient,
            };
            ctx.dispatch_preceding_limited(crate::HOLLOW_ACCOUNT_CREATE, create_body.encode())
                .await?;
        }

        {
            let mut store = ctx.writable_store(CRYPTO_SERVICE);
            let mut accounts: KVState<AccountId, i64> = KVState::new(&mut *store, "", "ACCOUNTS");
            let recipient_balance = accounts
                .get(&body.recipient)
                .expect("account balance state is never hand-edited")
                .unwrap_or(0);
            accounts
                .put(body.sender, sender_balance - body.amount - fee)
                .expect("account balance state is never hand-edited");
            accounts
                .put(body.recipient, recipient_balance + body.amount)
                .expect("account balance state is never hand-edited");
        }

        ctx.add_transfer(body.sender, -(body.amount + fee));
        ctx.add_transfer(body.recipient, body.amount);
        Ok(())
    }
}

/// The wire body of a hollow-account auto-creation, dispatched as a
/// *limited preceding* record by `CryptoTransferHandler` the first time a
/// transfer targets an account with no balance entry.
#[derive(Clone, Encode, Decode, Debug, PartialEq, Eq)]
pub struct HollowAccountCreateBody {
    pub account: AccountId,
}

pub struct HollowAccountCreateHandler;

#[async_trait]
impl TransactionHandler for HollowAccountCreateHandler {
    fn pure_checks(&self, transaction_bytes: &[u8]) -> Result<(), PreCheckError> {
        HollowAccountCreateBody::decode(&mut &*transaction_bytes)
            .map(|_| ())
            .map_err(|e| PreCheckError::InvalidBody(e.to_string()))
    }

    fn pre_handle(&self, _transaction_bytes: &[u8]) -> Result<RequiredKeys, PreCheckError> {
        Ok(RequiredKeys::default())
    }

    async fn handle(&self, ctx: &mut dyn HandleContextView) -> Result<(), HandleError> {
        let body = HollowAccountCreateBody::decode(&mut &*ctx.transaction_bytes())
            .map_err(|e| HandleError::from(PreCheckError::InvalidBody(e.to_string())))?;

        let mut store = ctx.writable_store(CRYPTO_SERVICE);
        let mut accounts: KVState<AccountId, i64> = KVState::new(&mut *store, "", "ACCOUNTS");
        if !accounts
            .contains(&body.account)
            .expect("account balance state is never hand-edited")
        {
            accounts
                .put(body.account, 0)
                .expect("account balance state is never hand-edited");
        }
        Ok(())
    }
}
