//! # Error Policy
//!
//! Decides when a failed owner is retried. Configuration errors wait for the owner
//! to change; everything else backs off per owner along a Fibonacci sequence.

use crate::controller::{owner_key, BackoffState, ReconcileError, Reconciler};
use crate::crd::ConditionedOwner;
use crate::observability::metrics;
use kube_runtime::controller::Action;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Handle reconciliation errors with per-owner Fibonacci backoff
pub fn handle_reconciliation_error<K: ConditionedOwner>(
    obj: Arc<K>,
    error: &ReconcileError,
    ctx: &Reconciler,
) -> Action {
    let name = obj.meta().name.as_deref().unwrap_or("unknown");
    let namespace = obj.meta().namespace.as_deref().unwrap_or("default");

    let error_span = tracing::span!(
        tracing::Level::ERROR,
        "controller.reconciliation_error",
        resource.kind = %K::kind(&()),
        resource.name = name,
        resource.namespace = namespace,
        error = %error
    );
    let _error_guard = error_span.enter();

    if error.is_terminal() {
        warn!(
            "Configuration error for {}/{}, waiting for the resource to change: {}",
            namespace, name, error
        );
        metrics::increment_requeues_total("await-change");
        return Action::await_change();
    }

    error!("Reconciliation error for {}/{}: {}", namespace, name, error);

    let (backoff_seconds, error_count) = match ctx.backoff_states.lock() {
        Ok(mut states) => {
            let state = states.entry(owner_key(obj.as_ref())).or_insert_with(|| {
                BackoffState::new(ctx.config.backoff_min_minutes, ctx.config.backoff_max_minutes)
            });
            state.increment_error();
            (state.backoff.next_backoff_seconds(), state.error_count)
        }
        Err(e) => {
            warn!("Failed to lock backoff_states: {}, using minimum backoff", e);
            (ctx.config.backoff_min_minutes.max(1) * 60, 0)
        }
    };

    info!(
        "Retrying with Fibonacci backoff: {}s (error count: {})",
        backoff_seconds, error_count
    );
    metrics::increment_requeues_total("error-backoff");
    Action::requeue(Duration::from_secs(backoff_seconds))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::controller::{SyncError, SyncReport};
    use crate::crd::{ObjectStorageSpec, TempoStack, TempoStackSpec};
    use crate::manifests::ConfigurationError;
    use crate::mutate::MergeRegistry;
    use crate::status::RecordingStatusWriter;
    use crate::store::InMemoryStore;

    fn reconciler() -> Reconciler {
        Reconciler::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(RecordingStatusWriter::new()),
            Arc::new(MergeRegistry::standard()),
            EngineConfig::default(),
        )
    }

    fn stack(name: &str) -> Arc<TempoStack> {
        let mut stack = TempoStack::new(
            name,
            TempoStackSpec {
                management_state: Default::default(),
                storage: ObjectStorageSpec::default(),
                storage_size: None,
                replication_factor: None,
                service_account: None,
            },
        );
        stack.metadata.namespace = Some("tracing".to_string());
        Arc::new(stack)
    }

    fn transient() -> ReconcileError {
        ReconcileError::Sync(SyncError {
            failures: Vec::new(),
            cancelled: true,
            report: SyncReport::default(),
        })
    }

    #[test]
    fn test_configuration_error_waits_for_change() {
        let err = ReconcileError::Configuration(ConfigurationError::new("InvalidStorage", "x"));
        let action = handle_reconciliation_error(stack("a"), &err, &reconciler());
        assert_eq!(action, Action::await_change());
    }

    #[test]
    fn test_transient_errors_back_off_per_owner() {
        let ctx = reconciler();
        let seconds: Vec<Action> = (0..3)
            .map(|_| handle_reconciliation_error(stack("a"), &transient(), &ctx))
            .collect();
        assert_eq!(
            seconds,
            vec![
                Action::requeue(Duration::from_secs(60)),
                Action::requeue(Duration::from_secs(60)),
                Action::requeue(Duration::from_secs(120)),
            ]
        );

        let other = handle_reconciliation_error(stack("b"), &transient(), &ctx);
        assert_eq!(other, Action::requeue(Duration::from_secs(60)));

        ctx.reset_backoff("tracing/a");
        let after_reset = handle_reconciliation_error(stack("a"), &transient(), &ctx);
        assert_eq!(after_reset, Action::requeue(Duration::from_secs(60)));
    }
}
