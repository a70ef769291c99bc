//! The consensus time tracker: the per-round-per-transaction budget for
//! preceding and following offsets.

use ledger_types::ids::ConsensusTimestamp;

/// Tracks how much preceding/following offset budget a user transaction has
/// consumed. One instance per user transaction, constructed fresh when its
/// savepoint opens.
#[derive(Clone, Copy, Debug)]
pub struct ConsensusTimeTracker {
    base: ConsensusTimestamp,
    max_preceding_offset: u32,
    max_following_offset: u32,
    following_count: u32,
    preceding_count: u32,
    tick_nanos: i64,
}

impl ConsensusTimeTracker {
    pub fn new(
        base: ConsensusTimestamp,
        max_preceding_offset: u32,
        max_following_offset: u32,
        tick_nanos: i64,
    ) -> Self {
        Self {
            base,
            max_preceding_offset,
            max_following_offset,
            following_count: 0,
            preceding_count: 0,
            tick_nanos,
        }
    }

    pub fn base(&self) -> ConsensusTimestamp {
        self.base
    }

    pub fn tick_nanos(&self) -> i64 {
        self.tick_nanos
    }

    pub fn is_allowable_preceding_offset(&self, n: u32) -> bool {
        n <= self.max_preceding_offset
    }

    pub fn is_allowable_following_offset(&self, n: u32) -> bool {
        n <= self.max_following_offset
    }

    /// Consumes one unit of preceding budget. Offsets consumed within a
    /// round are permanent — there is no corresponding "release".
    pub fn consume_preceding(&mut self) -> bool {
        if !self.is_allowable_preceding_offset(self.preceding_count + 1) {
            return false;
        }
        self.preceding_count += 1;
        true
    }

    pub fn consume_following(&mut self) -> bool {
        if !self.is_allowable_following_offset(self.following_count + 1) {
            return false;
        }
        self.following_count += 1;
        true
    }

    pub fn preceding_count(&self) -> u32 {
        self.preceding_count
    }

    pub fn following_count(&self) -> u32 {
        self.following_count
    }
}
