//! A Prometheus-backed `MetricsSink`: one `IntCounterVec` / `HistogramVec`
//! per metric, registered once against a process-wide `Registry` and
//! exposed through the sink traits.

use crate::sinks::{
    DispatchMetricsSink, ErrorMetricsSink, RecordMetricsSink, SavepointMetricsSink,
};
use prometheus::{
    Gauge, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry,
};

/// Process-wide Prometheus metrics for the transaction-handling core.
#[derive(Debug)]
pub struct PrometheusSink {
    stack_depth: Gauge,
    commits: IntCounter,
    rollbacks: IntCounter,
    preceding_records: IntCounterVec,
    following_records: IntCounterVec,
    duplicate_hits: IntCounterVec,
    cache_evictions: IntCounter,
    handle_latency: Histogram,
    child_dispatches: IntCounterVec,
    reverted_children: IntCounter,
    errors: IntCounterVec,
}

impl PrometheusSink {
    pub fn new(registry: &Registry) -> prometheus::Result<Self> {
        let stack_depth = Gauge::new("savepoint_stack_depth", "Current savepoint stack depth")?;
        let commits = IntCounter::new("savepoint_commits_total", "Savepoint commits")?;
        let rollbacks = IntCounter::new("savepoint_rollbacks_total", "Savepoint rollbacks")?;
        let preceding_records = IntCounterVec::new(
            Opts::new("preceding_records_total", "Preceding records created"),
            &["kind"],
        )?;
        let following_records = IntCounterVec::new(
            Opts::new("following_records_total", "Following records created"),
            &["kind"],
        )?;
        let duplicate_hits = IntCounterVec::new(
            Opts::new("duplicate_hits_total", "Record-cache duplicate hits"),
            &["same_node"],
        )?;
        let cache_evictions =
            IntCounter::new("cache_evictions_total", "Record-cache entries evicted")?;
        let handle_latency = Histogram::with_opts(HistogramOpts::new(
            "handle_latency_seconds",
            "Dispatch handle-phase latency",
        ))?;
        let child_dispatches = IntCounterVec::new(
            Opts::new("child_dispatches_total", "Child dispatches issued"),
            &["removable"],
        )?;
        let reverted_children =
            IntCounter::new("reverted_children_total", "Descendant records reverted")?;
        let errors = IntCounterVec::new(
            Opts::new("errors_total", "Errors by kind and stable code"),
            &["kind", "code"],
        )?;

        registry.register(Box::new(stack_depth.clone()))?;
        registry.register(Box::new(commits.clone()))?;
        registry.register(Box::new(rollbacks.clone()))?;
        registry.register(Box::new(preceding_records.clone()))?;
        registry.register(Box::new(following_records.clone()))?;
        registry.register(Box::new(duplicate_hits.clone()))?;
        registry.register(Box::new(cache_evictions.clone()))?;
        registry.register(Box::new(handle_latency.clone()))?;
        registry.register(Box::new(child_dispatches.clone()))?;
        registry.register(Box::new(reverted_children.clone()))?;
        registry.register(Box::new(errors.clone()))?;

        Ok(Self {
            stack_depth,
            commits,
            rollbacks,
            preceding_records,
            following_records,
            duplicate_hits,
            cache_evictions,
            handle_latency,
            child_dispatches,
            reverted_children,
            errors,
        })
    }
}

impl SavepointMetricsSink for PrometheusSink {
    fn observe_stack_depth(&self, depth: usize) {
        self.stack_depth.set(depth as f64);
    }
    fn inc_commits(&self) {
        self.commits.inc();
    }
    fn inc_rollbacks(&self) {
        self.rollbacks.inc();
    }
}

impl RecordMetricsSink for PrometheusSink {
    fn inc_preceding_records(&self, kind: &'static str) {
        self.preceding_records.with_label_values(&[kind]).inc();
    }
    fn inc_following_records(&self, kind: &'static str) {
        self.following_records.with_label_values(&[kind]).inc();
    }
    fn inc_duplicate_hits(&self, same_node: bool) {
        let label = if same_node { "same" } else { "different" };
        self.duplicate_hits.with_label_values(&[label]).inc();
    }
    fn inc_cache_evictions(&self, count: u64) {
        self.cache_evictions.inc_by(count);
    }
}

impl DispatchMetricsSink for PrometheusSink {
    fn observe_handle_latency(&self, _functionality: u16, duration_secs: f64) {
        self.handle_latency.observe(duration_secs);
    }
    fn inc_child_dispatches(&self, removable: bool) {
        let label = if removable { "true" } else { "false" };
        self.child_dispatches.with_label_values(&[label]).inc();
    }
    fn inc_reverted_children(&self) {
        self.reverted_children.inc();
    }
}

impl ErrorMetricsSink for PrometheusSink {
    fn inc_error(&self, kind: &'static str, code: &'static str) {
        self.errors.with_label_values(&[kind, code]).inc();
    }
}
