//! The record cache: at-most-once duplicate detection across `(payer,
//! validStart, nonce)`, partitioned by `(payer, validStart second)` in a
//! `dashmap::DashMap` for sharded concurrent access, and lazily evicted.

use dashmap::DashMap;
use ledger_telemetry::sinks::record_metrics;
use ledger_types::ids::{AccountId, NodeId, TransactionId};
use ledger_types::record::Record;

/// The outcome of checking a transaction id against the cache.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DuplicateStatus {
    None,
    SameNode,
    DifferentNode,
}

#[derive(Clone, Debug)]
struct CacheEntry {
    nonce: u32,
    record: Record,
    submitting_node: NodeId,
    expires_at_second: i64,
}

/// A partitioned, at-most-once index of finalized records.
pub struct RecordCache {
    partitions: DashMap<(AccountId, i64), Vec<CacheEntry>>,
    ttl_seconds: i64,
}

impl RecordCache {
    pub fn new(ttl_seconds: i64) -> Self {
        Self {
            partitions: DashMap::new(),
            ttl_seconds,
        }
    }

    fn partition_key(id: &TransactionId) -> (AccountId, i64) {
        (id.payer, id.valid_start.seconds)
    }

    /// Idempotent: a re-`add` of an already-present `(payer, validStart,
    /// nonce)` is a no-op.
    pub fn add(&self, record: Record, submitting_node: NodeId) {
        let key = Self::partition_key(&record.transaction_id);
        let mut partition = self.partitions.entry(key).or_default();
        let nonce = record.transaction_id.nonce;
        if partition.iter().any(|e| e.nonce == nonce) {
            return;
        }
        let expires_at_second = record.transaction_id.valid_start.seconds + self.ttl_seconds;
        partition.push(CacheEntry {
            nonce,
            record,
            submitting_node,
            expires_at_second,
        });
    }

    pub fn has_duplicate(&self, id: &TransactionId, submitting_node: NodeId) -> DuplicateStatus {
        let key = Self::partition_key(id);
        match self.partitions.get(&key) {
            Some(partition) => match partition.iter().find(|e| e.nonce == id.nonce) {
                Some(entry) if entry.submitting_node == submitting_node => DuplicateStatus::SameNode,
                Some(_) => DuplicateStatus::DifferentNode,
                None => DuplicateStatus::None,
            },
            None => DuplicateStatus::None,
        }
    }

    pub fn get(&self, id: &TransactionId) -> Option<Record> {
        let key = Self::partition_key(id);
        self.partitions
            .get(&key)?
            .iter()
            .find(|e| e.nonce == id.nonce)
            .map(|e| e.record.clone())
    }

    /// Lazily removes entries whose `validStart + ttl < currentConsensusSecond`,
    /// run at round boundaries.
    pub fn evict(&self, current_consensus_second: i64) {
        let mut evicted = 0u64;
        self.partitions.retain(|_, entries| {
            let before = entries.len();
            entries.retain(|e| e.expires_at_second >= current_consensus_second);
            evicted += (before - entries.len()) as u64;
            !entries.is_empty()
        });
        if evicted > 0 {
            record_metrics().inc_cache_evictions(evicted);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_types::ids::ConsensusTimestamp;
    use ledger_types::record::RecordBuilder;
    use ledger_types::status::ResponseCode;

    fn payer() -> AccountId {
        AccountId::from([9u8; 32])
    }

    fn record(nonce: u32, valid_start_secs: i64) -> Record {
        let id = TransactionId::new(payer(), ConsensusTimestamp::new(valid_start_secs, 0))
            .with_nonce(nonce);
        let mut builder = RecordBuilder::new(id, ledger_types::record::RecordKind::User);
        builder.set_status(ResponseCode::Success);
        builder.finalize(None, ConsensusTimestamp::new(valid_start_secs, 0))
    }

    #[test]
    fn at_most_once_law() {
        let cache = RecordCache::new(180);
        cache.add(record(0, 1_000), NodeId(1));
        cache.add(record(0, 1_000), NodeId(1));
        let id = TransactionId::new(payer(), ConsensusTimestamp::new(1_000, 0));
        assert_eq!(cache.has_duplicate(&id, NodeId(1)), DuplicateStatus::SameNode);
        assert_eq!(cache.has_duplicate(&id, NodeId(2)), DuplicateStatus::DifferentNode);
    }

    #[test]
    fn eviction_drops_expired_entries_only() {
        let cache = RecordCache::new(100);
        cache.add(record(0, 1_000), NodeId(1));
        cache.evict(1_050);
        let id = TransactionId::new(payer(), ConsensusTimestamp::new(1_000, 0));
        assert_eq!(cache.has_duplicate(&id, NodeId(1)), DuplicateStatus::SameNode);

        cache.evict(1_200);
        assert_eq!(cache.has_duplicate(&id, NodeId(1)), DuplicateStatus::None);
    }
}
