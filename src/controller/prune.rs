//! # Prune
//!
//! Deletes objects of conditionally created kinds (Ingress, ServiceMonitor, Route,
//! ...) that the owner no longer wants, typically because a feature was turned off.
//! Runs only after a successful sync, so it never races an object the same pass
//! just wrote.

use super::error::{ListFailure, ObjectError, ObjectFailure, PruneError};
use super::{owner_key, Reconciler};
use crate::crd::ConditionedOwner;
use crate::manifests::{ManagedObject, ObjectIdentity, ObjectUid, ResourceKind};
use crate::observability::metrics;
use std::collections::BTreeSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PruneReport {
    pub deleted: Vec<ObjectIdentity>,
    /// Owned objects inspected and kept
    pub kept: usize,
}

impl Reconciler {
    /// Delete owned objects of `kinds` that are neither desired nor kept by UID
    ///
    /// Candidates are listed by the owner's selector in its namespace. Objects
    /// controlled by another resource are never touched. An object survives when
    /// its UID is in `keep` (produced by the sync pass) or its identity is in
    /// `desired`.
    #[instrument(skip_all, fields(owner = %owner_key(owner), kinds = kinds.len()))]
    pub async fn prune<K: ConditionedOwner>(
        &self,
        owner: &K,
        desired: &[ManagedObject],
        kinds: &[ResourceKind],
        keep: &BTreeSet<ObjectUid>,
        cancel: &CancellationToken,
    ) -> Result<PruneReport, PruneError> {
        let namespace = owner.meta().namespace.as_deref();
        let selector = owner.owned_selector();
        let wanted: BTreeSet<ObjectIdentity> =
            desired.iter().map(ManagedObject::identity).collect();
        let mut report = PruneReport::default();
        let mut list_failures = Vec::new();
        let mut failures = Vec::new();
        let mut cancelled = false;

        'kinds: for &kind in kinds {
            let owned = match self.store.list(kind, namespace, &selector).await {
                Ok(owned) => owned,
                Err(error) => {
                    warn!(kind = %kind, error = %error, "failed to list owned objects");
                    list_failures.push(ListFailure { kind, error });
                    continue;
                }
            };

            for object in owned {
                let identity = object.identity();
                if !owner.controls(&object) {
                    debug!("{} is controlled by another resource, skipping", identity);
                    continue;
                }
                let kept_by_uid = object.uid().is_some_and(|uid| keep.contains(&uid));
                if kept_by_uid || wanted.contains(&identity) {
                    report.kept += 1;
                    continue;
                }
                if cancel.is_cancelled() {
                    cancelled = true;
                    break 'kinds;
                }

                match self.store.delete(&identity).await {
                    Ok(()) => {
                        debug!("pruned {}", identity);
                        metrics::increment_objects_pruned(kind.as_str());
                        report.deleted.push(identity);
                    }
                    Err(error) => {
                        warn!(
                            kind = %kind,
                            name = %identity.name,
                            error = %error,
                            "failed to prune object"
                        );
                        metrics::increment_object_errors(kind.as_str());
                        failures.push(ObjectFailure {
                            identity,
                            error: ObjectError::Store(error),
                        });
                    }
                }
            }
        }

        if list_failures.is_empty() && failures.is_empty() && !cancelled {
            if !report.deleted.is_empty() {
                info!(deleted = report.deleted.len(), "pruned objects no longer desired");
            }
            Ok(report)
        } else {
            Err(PruneError {
                list_failures,
                failures,
                cancelled,
                report,
            })
        }
    }
}
