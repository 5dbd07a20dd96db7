//! # Metrics
//!
//! Prometheus metrics for the reconciliation engine.
//!
//! ## Metrics Exposed
//!
//! - `tempo_operator_reconciliations_total` - Total number of reconciliations
//! - `tempo_operator_reconciliation_errors_total` - Total number of failed reconciliations
//! - `tempo_operator_reconciliation_duration_seconds` - Duration of reconciliation passes
//! - `tempo_operator_objects_synced_total` - Objects handled by sync, by kind and outcome
//! - `tempo_operator_object_errors_total` - Per-object sync and prune failures, by kind
//! - `tempo_operator_objects_pruned_total` - Objects deleted by the pruner, by kind
//! - `tempo_operator_status_updates_total` - Owner status writes
//! - `tempo_operator_requeues_total` - Requeues, by reason

use anyhow::Result;
use prometheus::core::Collector;
use prometheus::{Encoder, Histogram, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "tempo_operator_reconciliations_total",
        "Total number of reconciliations",
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "tempo_operator_reconciliation_errors_total",
        "Total number of failed reconciliations",
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "tempo_operator_reconciliation_duration_seconds",
            "Duration of reconciliation in seconds",
        )
        .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static OBJECTS_SYNCED_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "tempo_operator_objects_synced_total",
            "Objects handled by sync, by kind and outcome",
        ),
        &["kind", "outcome"],
    )
    .expect("Failed to create OBJECTS_SYNCED_TOTAL metric - this should never happen")
});

static OBJECT_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "tempo_operator_object_errors_total",
            "Per-object sync and prune failures, by kind",
        ),
        &["kind"],
    )
    .expect("Failed to create OBJECT_ERRORS_TOTAL metric - this should never happen")
});

static OBJECTS_PRUNED_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "tempo_operator_objects_pruned_total",
            "Objects deleted by the pruner, by kind",
        ),
        &["kind"],
    )
    .expect("Failed to create OBJECTS_PRUNED_TOTAL metric - this should never happen")
});

static STATUS_UPDATES_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "tempo_operator_status_updates_total",
        "Total number of owner status writes",
    )
    .expect("Failed to create STATUS_UPDATES_TOTAL metric - this should never happen")
});

static REQUEUES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new("tempo_operator_requeues_total", "Requeues, by reason"),
        &["reason"],
    )
    .expect("Failed to create REQUEUES_TOTAL metric - this should never happen")
});

fn register(collector: Box<dyn Collector>) -> Result<()> {
    match REGISTRY.register(collector) {
        Ok(()) | Err(prometheus::Error::AlreadyReg) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Register all metrics with the registry
///
/// Registering twice is a no-op.
#[allow(
    clippy::missing_errors_doc,
    reason = "Error documentation is provided in doc comments"
)]
pub fn register_metrics() -> Result<()> {
    register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    register(Box::new(RECONCILIATION_DURATION.clone()))?;
    register(Box::new(OBJECTS_SYNCED_TOTAL.clone()))?;
    register(Box::new(OBJECT_ERRORS_TOTAL.clone()))?;
    register(Box::new(OBJECTS_PRUNED_TOTAL.clone()))?;
    register(Box::new(STATUS_UPDATES_TOTAL.clone()))?;
    register(Box::new(REQUEUES_TOTAL.clone()))?;
    Ok(())
}

/// Render the registry in the Prometheus text format
pub fn gather_text() -> Result<String> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

pub fn increment_reconciliations() {
    RECONCILIATIONS_TOTAL.inc();
}

pub fn increment_reconciliation_errors() {
    RECONCILIATION_ERRORS_TOTAL.inc();
}

pub fn observe_reconciliation_duration(duration: f64) {
    RECONCILIATION_DURATION.observe(duration);
}

pub fn record_object_outcome(kind: &str, outcome: &str) {
    OBJECTS_SYNCED_TOTAL.with_label_values(&[kind, outcome]).inc();
}

pub fn increment_object_errors(kind: &str) {
    OBJECT_ERRORS_TOTAL.with_label_values(&[kind]).inc();
}

pub fn increment_objects_pruned(kind: &str) {
    OBJECTS_PRUNED_TOTAL.with_label_values(&[kind]).inc();
}

pub fn increment_status_updates() {
    STATUS_UPDATES_TOTAL.inc();
}

pub fn increment_requeues_total(reason: &str) {
    REQUEUES_TOTAL.with_label_values(&[reason]).inc();
}
