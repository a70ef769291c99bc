//! The round executor's startup configuration: a plain `serde::Deserialize`
//! struct with sane defaults, handed to the round executor at construction.
//! Loading it from TOML/env/flags is left to whatever binary embeds the
//! core.

use serde::Deserialize;

/// Tunables for the consensus time tracker, record cache, and record list
/// builder.
#[derive(Clone, Copy, PartialEq, Debug, Deserialize)]
#[serde(default)]
pub struct RoundExecutorConfig {
    /// Unit tick (nanoseconds) separating consecutive preceding/following
    /// offsets around a user transaction's base consensus time.
    pub offset_tick_nanos: i64,
    /// Maximum preceding-offset budget per user transaction.
    pub max_preceding_offset: u32,
    /// Maximum following-offset budget per user transaction.
    pub max_following_offset: u32,
    /// Per-user-transaction cap on *limited preceding* records.
    pub max_limited_preceding_records: u32,
    /// Record-cache entry lifetime before lazy eviction, in consensus
    /// seconds (a TTL of 180s is typical).
    pub record_cache_ttl_seconds: i64,
}

impl Default for RoundExecutorConfig {
    fn default() -> Self {
        Self {
            offset_tick_nanos: 1,
            max_preceding_offset: 5_000,
            max_following_offset: 5_000,
            max_limited_preceding_records: 10,
            record_cache_ttl_seconds: 180,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_a_180_second_cache_ttl() {
        assert_eq!(RoundExecutorConfig::default().record_cache_ttl_seconds, 180);
    }

    #[test]
    fn deserializes_with_partial_overrides() {
        let cfg: RoundExecutorConfig =
            serde_json::from_str(r#"{"record_cache_ttl_seconds": 60}"#).unwrap();
        assert_eq!(cfg.record_cache_ttl_seconds, 60);
        assert_eq!(cfg.offset_tick_nanos, 1);
    }
}
