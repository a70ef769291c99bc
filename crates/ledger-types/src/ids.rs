//! Canonical identifiers shared across the transaction-handling core.
//!
//! Small `Copy` newtypes around fixed-size byte arrays / integers, with
//! `Ord`/`Hash` so they can key deterministic collections (`BTreeMap`,
//! `DashMap`).

use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A stable, 32-byte account identifier.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Encode, Decode, Serialize, Deserialize)]
pub struct AccountId(pub [u8; 32]);

impl AsRef<[u8]> for AccountId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for AccountId {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// A gossip-layer node identifier (opaque to the core beyond equality/ordering).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize, Deserialize)]
pub struct NodeId(pub u64);

/// A deterministic, nanosecond-granularity consensus timestamp.
///
/// The core never reads the wall clock; every value of this type is either
/// handed down by the platform round feed or derived from one by
/// adding/subtracting whole ticks.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct ConsensusTimestamp {
    pub seconds: i64,
    pub nanos: i32,
}

impl ConsensusTimestamp {
    pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

    pub fn new(seconds: i64, nanos: i32) -> Self {
        let mut ts = Self { seconds, nanos };
        ts.normalize();
        ts
    }

    fn normalize(&mut self) {
        if self.nanos >= 1_000_000_000 || self.nanos <= -1_000_000_000 {
            let carry = self.nanos as i64 / Self::NANOS_PER_SECOND;
            self.seconds += carry;
            self.nanos -= (carry * Self::NANOS_PER_SECOND) as i32;
        }
        if self.nanos < 0 {
            self.nanos += 1_000_000_000;
            self.seconds -= 1;
        }
    }

    /// Returns a timestamp offset by `ticks` nanoseconds (may be negative).
    /// Used exclusively by the consensus time tracker to assign preceding
    /// and following record offsets around a user transaction's base time.
    pub fn plus_ticks(&self, ticks: i64) -> Self {
        let total_nanos = self.seconds * Self::NANOS_PER_SECOND + self.nanos as i64 + ticks;
        let seconds = total_nanos.div_euclid(Self::NANOS_PER_SECOND);
        let nanos = total_nanos.rem_euclid(Self::NANOS_PER_SECOND) as i32;
        Self { seconds, nanos }
    }
}

impl fmt::Display for ConsensusTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.seconds, self.nanos)
    }
}

/// A transaction's globally unique identity: who paid, when they said the
/// transaction started, and a per-payer nonce that distinguishes retries and
/// child dispatches from the original submission.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct TransactionId {
    pub payer: AccountId,
    pub valid_start: ConsensusTimestamp,
    pub nonce: u32,
    pub scheduled: bool,
}

impl TransactionId {
    pub fn new(payer: AccountId, valid_start: ConsensusTimestamp) -> Self {
        Self {
            payer,
            valid_start,
            nonce: 0,
            scheduled: false,
        }
    }

    /// Returns the child id used for a newly assigned record at `nonce`.
    pub fn with_nonce(&self, nonce: u32) -> Self {
        Self {
            nonce,
            ..*self
        }
    }
}

/// A tag distinguishing the kind of business operation a transaction
/// performs. The concrete set of functionalities is owned by
/// `ledger-services`; this is just the wire-stable key type the dispatcher
/// indexes by.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct Functionality(pub u16);

impl Functionality {
    pub const UNKNOWN: Functionality = Functionality(0);
}
