//! # Reconcile
//!
//! One full pass for an owner: sync, prune, sample health, refresh status.

use super::error::ReconcileError;
use super::{owner_key, Reconciler};
use crate::crd::{ConditionedOwner, ManagementState};
use crate::manifests::{ConfigurationError, ManagedObject};
use crate::observability::metrics;
use crate::status::{conditions_for_outcome, refresh_status, PassOutcome, StackHealth};
use chrono::Utc;
use kube_runtime::controller::Action;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

impl Reconciler {
    async fn converge<K: ConditionedOwner>(
        &self,
        owner: &K,
        desired: Result<Vec<ManagedObject>, ConfigurationError>,
        cancel: &CancellationToken,
    ) -> Result<StackHealth, ReconcileError> {
        let desired = desired?;
        let report = self.sync(owner, &desired, cancel).await?;

        self.prune(
            owner,
            &desired,
            &self.config.features.prunable_kinds(),
            &report.uids(),
            cancel,
        )
        .await?;

        StackHealth::sample(self.store.as_ref(), owner)
            .await
            .map_err(ReconcileError::Health)
    }
}

/// Reconcile `owner` toward `desired` and report the outcome on its status
///
/// `desired` is the manifest builder's output. A configuration error is written
/// as a condition and returned as a terminal error. Unmanaged owners are skipped.
#[instrument(skip_all, fields(owner = %owner_key(owner.as_ref())))]
pub async fn reconcile_owner<K: ConditionedOwner>(
    owner: Arc<K>,
    desired: Result<Vec<ManagedObject>, ConfigurationError>,
    ctx: &Reconciler,
    cancel: &CancellationToken,
) -> Result<Action, ReconcileError> {
    if owner.management_state() == ManagementState::Unmanaged {
        info!("owner is unmanaged, skipping reconciliation");
        return Ok(Action::await_change());
    }

    metrics::increment_reconciliations();
    let start = Instant::now();
    let result = ctx.converge(owner.as_ref(), desired, cancel).await;
    metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());

    match result {
        Ok(health) => {
            let conditions =
                conditions_for_outcome(owner.conditions(), PassOutcome::Clean(&health), Utc::now());
            refresh_status(ctx.status.as_ref(), owner.as_ref(), conditions).await?;
            ctx.reset_backoff(&owner_key(owner.as_ref()));
            Ok(Action::requeue(ctx.config.resync_interval()))
        }
        Err(err) => {
            metrics::increment_reconciliation_errors();
            let message = err.to_string();
            let outcome = match &err {
                ReconcileError::Configuration(config) => PassOutcome::ConfigurationError(config),
                _ => PassOutcome::Failed(&message),
            };
            let conditions = conditions_for_outcome(owner.conditions(), outcome, Utc::now());
            if let Err(status_err) =
                refresh_status(ctx.status.as_ref(), owner.as_ref(), conditions).await
            {
                warn!(error = %status_err, "failed to record failure on owner status");
            }
            Err(err)
        }
    }
}
