//! The error taxonomy: one `thiserror`-derived enum per failure domain,
//! each implementing `ErrorCode` for stable metrics labelling, with
//! `#[from]` composing the recoverable kinds into `HandleError`.

use crate::status::ResponseCode;
use thiserror::Error;

/// A trait for assigning a stable, machine-readable string code to an error,
/// independent of its `Display` message.
pub trait ErrorCode {
    fn code(&self) -> &'static str;
}

/// Failures from pure-checks and pre-handle: structural validation only, no
/// state has been touched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreCheckError {
    #[error("transaction body failed structural validation: {0}")]
    InvalidBody(String),
    #[error("required signer key could not be resolved: {0}")]
    KeyResolution(String),
    #[error("transaction functionality is not recognized")]
    UnknownFunctionality,
}

impl ErrorCode for PreCheckError {
    fn code(&self) -> &'static str {
        match self {
            PreCheckError::InvalidBody(_) => "PRECHECK_INVALID_BODY",
            PreCheckError::KeyResolution(_) => "PRECHECK_KEY_RESOLUTION",
            PreCheckError::UnknownFunctionality => "PRECHECK_UNKNOWN_FUNCTIONALITY",
        }
    }
}

/// Failures from the authorizer boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationError {
    #[error("payer lacks permission to perform this functionality")]
    Unauthorized,
    #[error("operation is not supported by system policy")]
    NotSupported,
    #[error("privileged operation rejected: {0}")]
    AuthorizationFailed(String),
    #[error("entity is not allowed to be deleted")]
    EntityNotAllowedToDelete,
}

impl ErrorCode for AuthorizationError {
    fn code(&self) -> &'static str {
        match self {
            AuthorizationError::Unauthorized => "AUTHZ_UNAUTHORIZED",
            AuthorizationError::NotSupported => "AUTHZ_NOT_SUPPORTED",
            AuthorizationError::AuthorizationFailed(_) => "AUTHZ_FAILED",
            AuthorizationError::EntityNotAllowedToDelete => "AUTHZ_ENTITY_NOT_DELETABLE",
        }
    }
}

/// Failures from the payer solvency pre-check.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SolvencyError {
    #[error("payer balance insufficient to cover the transaction fee")]
    InsufficientPayerBalance,
    #[error("offered transaction fee is below the computed minimum")]
    InsufficientTxFee,
    #[error("payer account does not exist")]
    PayerAccountNotFound,
}

impl ErrorCode for SolvencyError {
    fn code(&self) -> &'static str {
        match self {
            SolvencyError::InsufficientPayerBalance => "SOLVENCY_INSUFFICIENT_BALANCE",
            SolvencyError::InsufficientTxFee => "SOLVENCY_INSUFFICIENT_FEE",
            SolvencyError::PayerAccountNotFound => "SOLVENCY_PAYER_NOT_FOUND",
        }
    }
}

/// Failures raised while a handler body or the dispatcher itself runs.
/// Recoverable: converted into a record status at the handle-context
/// boundary and never escapes to the round executor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandleError {
    #[error(transparent)]
    PreCheck(#[from] PreCheckError),
    #[error(transparent)]
    Authorization(#[from] AuthorizationError),
    #[error(transparent)]
    Solvency(#[from] SolvencyError),
    #[error("duplicate transaction")]
    DuplicateTransaction,
    #[error("signature verification failed for {0}")]
    InvalidSignature(String),
    #[error("unknown functionality")]
    UnknownFunctionality,
    #[error("a preceding dispatch may not be issued from within a PRECEDING dispatch")]
    NestedPrecedingDispatch,
    #[error("a preceding dispatch requiring standard payer checks may not follow writes already made by the current handler")]
    PrecedingRequiresUnmodifiedFrame,
    #[error("handler reported a business-rule failure: {0}")]
    HandlerFailure(String),
    #[error(transparent)]
    ResourceLimit(#[from] ResourceLimitError),
}

impl ErrorCode for HandleError {
    fn code(&self) -> &'static str {
        match self {
            HandleError::PreCheck(e) => e.code(),
            HandleError::Authorization(e) => e.code(),
            HandleError::Solvency(e) => e.code(),
            HandleError::DuplicateTransaction => "HANDLE_DUPLICATE_TRANSACTION",
            HandleError::InvalidSignature(_) => "HANDLE_INVALID_SIGNATURE",
            HandleError::UnknownFunctionality => "HANDLE_UNKNOWN_FUNCTIONALITY",
            HandleError::NestedPrecedingDispatch => "HANDLE_NESTED_PRECEDING_DISPATCH",
            HandleError::PrecedingRequiresUnmodifiedFrame => "HANDLE_PRECEDING_REQUIRES_UNMODIFIED_FRAME",
            HandleError::HandlerFailure(_) => "HANDLE_HANDLER_FAILURE",
            HandleError::ResourceLimit(e) => e.code(),
        }
    }
}

impl HandleError {
    /// Maps a recoverable `HandleError` to the record status it produces.
    /// `StateError` deliberately has no mapping here — it is fatal and is
    /// handled separately by the round executor, never converted to a
    /// status.
    pub fn to_response_code(&self) -> ResponseCode {
        match self {
            HandleError::PreCheck(PreCheckError::UnknownFunctionality) => {
                ResponseCode::InvalidTransactionBody
            }
            HandleError::PreCheck(_) => ResponseCode::InvalidTransactionBody,
            HandleError::Authorization(AuthorizationError::Unauthorized) => {
                ResponseCode::Unauthorized
            }
            HandleError::Authorization(AuthorizationError::NotSupported) => {
                ResponseCode::NotSupported
            }
            HandleError::Authorization(AuthorizationError::AuthorizationFailed(_)) => {
                ResponseCode::AuthorizationFailed
            }
            HandleError::Authorization(AuthorizationError::EntityNotAllowedToDelete) => {
                ResponseCode::EntityNotAllowedToDelete
            }
            HandleError::Solvency(SolvencyError::InsufficientPayerBalance) => {
                ResponseCode::InsufficientPayerBalance
            }
            HandleError::Solvency(SolvencyError::InsufficientTxFee) => {
                ResponseCode::InsufficientTxFee
            }
            HandleError::Solvency(SolvencyError::PayerAccountNotFound) => {
                ResponseCode::AccountIdDoesNotExist
            }
            HandleError::DuplicateTransaction => ResponseCode::DuplicateTransaction,
            HandleError::InvalidSignature(_) => ResponseCode::InvalidSignature,
            HandleError::UnknownFunctionality => ResponseCode::InvalidTransactionBody,
            HandleError::NestedPrecedingDispatch => ResponseCode::HandlerFailure,
            HandleError::PrecedingRequiresUnmodifiedFrame => ResponseCode::HandlerFailure,
            HandleError::HandlerFailure(_) => ResponseCode::HandlerFailure,
            HandleError::ResourceLimit(_) => ResponseCode::MaxChildRecordsExceeded,
        }
    }
}

/// Record-list capacity and gas-style resource exhaustion.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResourceLimitError {
    #[error("adding this record would exceed the consensus-time tracker's child record budget")]
    MaxChildRecordsExceeded,
}

impl ErrorCode for ResourceLimitError {
    fn code(&self) -> &'static str {
        match self {
            ResourceLimitError::MaxChildRecordsExceeded => "RESOURCE_MAX_CHILD_RECORDS",
        }
    }
}

/// Savepoint stack and store-factory programming errors. These are never
/// converted into a record status: a `StateError` aborts the whole round
/// and escalates via ISS.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("attempted to mutate an immutable (read-only) frame")]
    Immutable,
    #[error("commit/rollback attempted with only the base frame on the stack")]
    EmptyStack,
    #[error("a frame outlived the frame it was created to overlay")]
    DanglingFrame,
}

impl ErrorCode for StateError {
    fn code(&self) -> &'static str {
        match self {
            StateError::Immutable => "STATE_IMMUTABLE",
            StateError::EmptyStack => "STATE_EMPTY_STACK",
            StateError::DanglingFrame => "STATE_DANGLING_FRAME",
        }
    }
}
