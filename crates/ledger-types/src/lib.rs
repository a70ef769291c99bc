//! Core data model and error taxonomy shared by every layer of the
//! transaction-handling core.
//!
//! The crate with no internal dependencies, sitting at the bottom of the
//! workspace graph, holding only plain data, the canonical codec, and the
//! error taxonomy.

pub mod codec;
pub mod error;
pub mod ids;
pub mod record;
pub mod status;

pub use ids::{AccountId, ConsensusTimestamp, Functionality, NodeId, TransactionId};
pub use record::{FollowingKind, PrecedingKind, Record, RecordBuilder, RecordKind, TransferEntry};
pub use status::ResponseCode;
