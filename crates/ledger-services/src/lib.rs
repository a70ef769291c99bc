//! Reference transaction handlers. The core itself has no opinion on
//! concrete business transaction schemas; these exist purely to exercise
//! the `ledger-dispatch` handle-context contract end to end, not as a
//! product surface. One handler per functionality, each implementing
//! `ledger_api::handler::TransactionHandler`.

pub mod crypto;
pub mod system;

use ledger_types::ids::Functionality;

/// The service namespace `CryptoTransferHandler` and
/// `HollowAccountCreateHandler` scope their state under.
pub const CRYPTO_SERVICE: &str = "crypto";

pub const CRYPTO_TRANSFER: Functionality = Functionality(1);
pub const HOLLOW_ACCOUNT_CREATE: Functionality = Functionality(2);
pub const SYSTEM_NOOP: Functionality = Functionality(3);
