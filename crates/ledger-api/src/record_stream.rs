//! The record-stream sink boundary: where the round executor hands finished
//! records to the platform for durable streaming. Backpressure is the
//! sink's problem; the core only needs to tolerate the `emit` call blocking
//! transiently.

use async_trait::async_trait;
use ledger_types::record::Record;

/// Receives fully finalized records in emission order.
#[async_trait]
pub trait RecordStreamSink: Send + Sync {
    /// Emits one record and its sidecar payloads. May block under
    /// backpressure; handlers never observe the wait because emission only
    /// happens after handling has completed.
    async fn emit(&self, record: Record, sidecars: Vec<Vec<u8>>);
}
