//! Record status codes.
//!
//! One flat, total status space shared by every record, with a stable
//! string alongside each variant for metrics labelling, rather than a
//! service-specific error type per variant.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The externally visible outcome of a transaction, attached to every
/// finalized record.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum ResponseCode {
    Success,
    DuplicateTransaction,
    InvalidTransactionBody,
    InvalidSignature,
    Unauthorized,
    NotSupported,
    AuthorizationFailed,
    EntityNotAllowedToDelete,
    MaxChildRecordsExceeded,
    InsufficientPayerBalance,
    InsufficientTxFee,
    AccountIdDoesNotExist,
    InvalidAccountId,
    /// Catch-all for a handler-specific business rule failure. The concrete
    /// reason is carried in the record's memo/sidecar, not in this enum —
    /// the core does not know about service-specific failure modes.
    HandlerFailure,
}

impl ResponseCode {
    pub fn is_success(&self) -> bool {
        matches!(self, ResponseCode::Success)
    }

    pub fn code(&self) -> &'static str {
        match self {
            ResponseCode::Success => "SUCCESS",
            ResponseCode::DuplicateTransaction => "DUPLICATE_TRANSACTION",
            ResponseCode::InvalidTransactionBody => "INVALID_TRANSACTION_BODY",
            ResponseCode::InvalidSignature => "INVALID_SIGNATURE",
            ResponseCode::Unauthorized => "UNAUTHORIZED",
            ResponseCode::NotSupported => "NOT_SUPPORTED",
            ResponseCode::AuthorizationFailed => "AUTHORIZATION_FAILED",
            ResponseCode::EntityNotAllowedToDelete => "ENTITY_NOT_ALLOWED_TO_DELETE",
            ResponseCode::MaxChildRecordsExceeded => "MAX_CHILD_RECORDS_EXCEEDED",
            ResponseCode::InsufficientPayerBalance => "INSUFFICIENT_PAYER_BALANCE",
            ResponseCode::InsufficientTxFee => "INSUFFICIENT_TX_FEE",
            ResponseCode::AccountIdDoesNotExist => "ACCOUNT_ID_DOES_NOT_EXIST",
            ResponseCode::InvalidAccountId => "INVALID_ACCOUNT_ID",
            ResponseCode::HandlerFailure => "HANDLER_FAILURE",
        }
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
