//! The trait boundaries the transaction-handling core consumes from its
//! environment: state persistence, signature verification, fee computation,
//! authorization, record streaming, notifications, and the handler contract
//! itself. Nothing in this crate has a concrete implementation — it exists
//! so `ledger-state`, `ledger-dispatch`, and `ledger-round` can depend on
//! the *shape* of their collaborators without depending on each other.

pub mod authorizer;
pub mod config;
pub mod fees;
pub mod handler;
pub mod notify;
pub mod record_stream;
pub mod state;
pub mod verifier;

pub use authorizer::{AuthorizableBody, Authorizer, PrivilegedAuthorization};
pub use config::RoundExecutorConfig;
pub use fees::{FeeCalculator, FeeData, FeeManager, Fees};
pub use handler::{HandleContextView, RequiredKeys, TransactionHandler};
pub use notify::{IssReport, NotificationBus, NotificationListener};
pub use record_stream::RecordStreamSink;
pub use state::{StateAccess, StatePersistence, StateScanIter};
pub use verifier::{SignatureVerifier, VerificationKey, VerificationResult};
