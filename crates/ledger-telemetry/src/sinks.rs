//! Abstract metrics sink traits, decoupling the core from any concrete
//! metrics backend.
//!
//! One trait per subsystem, a `NopSink` default, and a
//! `OnceCell<&'static dyn MetricsSink>` global so a binary embedding this
//! core can wire in Prometheus (or anything else) without the core crates
//! taking a hard dependency on it. The core only ever calls through the
//! sink interface; picking and configuring an exporter is the embedder's
//! job.

use once_cell::sync::OnceCell;

/// A no-op sink used when telemetry has not been wired up (tests, or a
/// binary that doesn't care).
#[derive(Debug, Clone, Copy)]
pub struct NopSink;

pub static SINK: OnceCell<&'static dyn MetricsSink> = OnceCell::new();
static NOP_SINK: NopSink = NopSink;

/// Returns the configured savepoint-stack metrics sink, or a no-op.
pub fn savepoint_metrics() -> &'static dyn SavepointMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

/// Returns the configured record-list metrics sink, or a no-op.
pub fn record_metrics() -> &'static dyn RecordMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

/// Returns the configured dispatch metrics sink, or a no-op.
pub fn dispatch_metrics() -> &'static dyn DispatchMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

/// Returns the configured error metrics sink, or a no-op.
pub fn error_metrics() -> &'static dyn ErrorMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

/// Installs a process-wide metrics sink. Returns `Err` (with the rejected
/// sink) if one was already installed.
pub fn install_sink(
    sink: &'static dyn MetricsSink,
) -> Result<(), &'static dyn MetricsSink> {
    SINK.set(sink).map_err(|_| sink)
}

/// Metrics around the savepoint stack: depth excursions and commit/rollback
/// counts.
pub trait SavepointMetricsSink: Send + Sync + std::fmt::Debug {
    fn observe_stack_depth(&self, depth: usize);
    fn inc_commits(&self);
    fn inc_rollbacks(&self);
}
impl SavepointMetricsSink for NopSink {
    fn observe_stack_depth(&self, _depth: usize) {}
    fn inc_commits(&self) {}
    fn inc_rollbacks(&self) {}
}

/// Metrics around the record list builder and record cache.
pub trait RecordMetricsSink: Send + Sync + std::fmt::Debug {
    fn inc_preceding_records(&self, kind: &'static str);
    fn inc_following_records(&self, kind: &'static str);
    fn inc_duplicate_hits(&self, same_node: bool);
    fn inc_cache_evictions(&self, count: u64);
}
impl RecordMetricsSink for NopSink {
    fn inc_preceding_records(&self, _kind: &'static str) {}
    fn inc_following_records(&self, _kind: &'static str) {}
    fn inc_duplicate_hits(&self, _same_node: bool) {}
    fn inc_cache_evictions(&self, _count: u64) {}
}

/// Metrics for the dispatcher and handle context.
pub trait DispatchMetricsSink: Send + Sync + std::fmt::Debug {
    fn observe_handle_latency(&self, functionality: u16, duration_secs: f64);
    fn inc_child_dispatches(&self, removable: bool);
    fn inc_reverted_children(&self);
}
impl DispatchMetricsSink for NopSink {
    fn observe_handle_latency(&self, _functionality: u16, _duration_secs: f64) {}
    fn inc_child_dispatches(&self, _removable: bool) {}
    fn inc_reverted_children(&self) {}
}

/// Structured error metrics, labelled by the stable `ErrorCode` strings from
/// `ledger-types::error`.
pub trait ErrorMetricsSink: Send + Sync + std::fmt::Debug {
    fn inc_error(&self, kind: &'static str, code: &'static str);
}
impl ErrorMetricsSink for NopSink {
    fn inc_error(&self, _kind: &'static str, _code: &'static str) {}
}

/// A unified sink implementing every domain-specific trait, the single point
/// of implementation for a concrete backend.
pub trait MetricsSink:
    SavepointMetricsSink + RecordMetricsSink + DispatchMetricsSink + ErrorMetricsSink
{
}

impl<T> MetricsSink for T where
    T: SavepointMetricsSink + RecordMetricsSink + DispatchMetricsSink + ErrorMetricsSink
{
}
