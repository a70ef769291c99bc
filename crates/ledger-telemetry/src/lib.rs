//! Observability for the ledger transaction-handling core: structured
//! `tracing` logging plus a backend-agnostic metrics sink. The core only
//! depends on the sink interface; wiring in a concrete exporter is left to
//! whatever binary embeds the core.

pub mod prometheus;
pub mod sinks;

pub use sinks::{
    dispatch_metrics, error_metrics, install_sink, record_metrics, savepoint_metrics, MetricsSink,
    NopSink,
};
