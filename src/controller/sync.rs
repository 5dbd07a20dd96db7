//! # Sync
//!
//! Converges each desired object in order:
//!
//! 1. Attach the owner's controller reference (namespaced kinds only).
//! 2. Absent: create the desired object as is.
//! 3. Present: merge desired into a copy of the live object and write it back only
//!    when the copy differs.
//! 4. Immutable field changed: delete the object; the next pass recreates it.
//!
//! A failing object never stops the pass. Cancellation does, between objects.

use super::error::{ObjectError, ObjectFailure, SyncError};
use super::{owner_key, Reconciler};
use crate::manifests::{ManagedObject, ObjectIdentity, ObjectUid};
use crate::mutate::MutateError;
use crate::observability::metrics;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use kube::Resource;
use std::collections::BTreeSet;
use std::fmt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Created,
    Updated,
    Unchanged,
    /// Deleted over an immutable field change; recreated on the next pass
    Recreating,
}

impl SyncOutcome {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncOutcome::Created => "created",
            SyncOutcome::Updated => "updated",
            SyncOutcome::Unchanged => "unchanged",
            SyncOutcome::Recreating => "recreating",
        }
    }
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectRecord {
    pub identity: ObjectIdentity,
    pub outcome: SyncOutcome,
    /// UID of the object as it stands after the pass
    pub uid: Option<ObjectUid>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    pub records: Vec<ObjectRecord>,
    /// Not attempted because the pass was cancelled
    pub skipped: Vec<ObjectIdentity>,
}

impl SyncReport {
    /// UIDs of every object the pass left in place
    #[must_use]
    pub fn uids(&self) -> BTreeSet<ObjectUid> {
        self.records.iter().filter_map(|r| r.uid.clone()).collect()
    }

    #[must_use]
    pub fn count(&self, outcome: SyncOutcome) -> usize {
        self.records.iter().filter(|r| r.outcome == outcome).count()
    }

    #[must_use]
    pub fn outcome(&self, identity: &ObjectIdentity) -> Option<SyncOutcome> {
        self.records
            .iter()
            .find(|r| &r.identity == identity)
            .map(|r| r.outcome)
    }

    /// True when the pass wrote nothing
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.records
            .iter()
            .all(|r| r.outcome == SyncOutcome::Unchanged)
    }
}

/// Make `owner_ref` the single controller reference, keeping other owners
fn set_controller_reference(meta: &mut ObjectMeta, owner_ref: &OwnerReference) {
    let refs = meta.owner_references.get_or_insert_with(Vec::new);
    refs.retain(|r| r.uid != owner_ref.uid && r.controller != Some(true));
    refs.push(owner_ref.clone());
}

impl Reconciler {
    /// Converge every object in `desired`
    ///
    /// Every object is attempted even when earlier ones fail; the error lists all
    /// failures and carries the partial report.
    #[instrument(skip_all, fields(owner = %owner_key(owner), objects = desired.len()))]
    pub async fn sync<K>(
        &self,
        owner: &K,
        desired: &[ManagedObject],
        cancel: &CancellationToken,
    ) -> Result<SyncReport, SyncError>
    where
        K: Resource<DynamicType = ()> + Sync,
    {
        let owner_ref = owner.controller_owner_ref(&());
        if owner_ref.is_none() {
            warn!("owner has no uid, objects are written without an owner reference");
        }

        let mut report = SyncReport::default();
        let mut failures = Vec::new();
        let mut cancelled = false;

        for object in desired {
            let identity = object.identity();
            if cancelled || cancel.is_cancelled() {
                cancelled = true;
                report.skipped.push(identity);
                continue;
            }

            match self.sync_object(owner_ref.as_ref(), object).await {
                Ok(record) => {
                    metrics::record_object_outcome(identity.kind.as_str(), record.outcome.as_str());
                    report.records.push(record);
                }
                Err(error) => {
                    warn!(
                        kind = %identity.kind,
                        name = %identity.name,
                        error = %error,
                        "failed to reconcile object"
                    );
                    metrics::increment_object_errors(identity.kind.as_str());
                    failures.push(ObjectFailure { identity, error });
                }
            }
        }

        if failures.is_empty() && !cancelled {
            info!(
                created = report.count(SyncOutcome::Created),
                updated = report.count(SyncOutcome::Updated),
                unchanged = report.count(SyncOutcome::Unchanged),
                recreating = report.count(SyncOutcome::Recreating),
                "sync complete"
            );
            Ok(report)
        } else {
            Err(SyncError {
                failures,
                cancelled,
                report,
            })
        }
    }

    async fn sync_object(
        &self,
        owner_ref: Option<&OwnerReference>,
        desired: &ManagedObject,
    ) -> Result<ObjectRecord, ObjectError> {
        let identity = desired.identity();
        let mut desired = desired.clone();
        if let Some(owner_ref) = owner_ref.filter(|_| identity.kind.is_namespaced()) {
            set_controller_reference(desired.meta_mut(), owner_ref);
        }

        let Some(existing) = self.store.get(&identity).await? else {
            let created = self.store.create(&desired).await?;
            debug!("created {}", identity);
            return Ok(ObjectRecord {
                uid: created.uid(),
                identity,
                outcome: SyncOutcome::Created,
            });
        };

        let mut merged = existing.clone();
        match self.mutator.mutate(&mut merged, &desired) {
            Ok(()) => {}
            Err(MutateError::ImmutableField(violation)) => {
                warn!(
                    kind = %identity.kind,
                    name = %identity.name,
                    field = %violation.field_path,
                    existing = %violation.existing,
                    desired = %violation.desired,
                    "immutable field changed, deleting object so the next pass recreates it"
                );
                self.store.delete(&identity).await?;
                return Ok(ObjectRecord {
                    identity,
                    outcome: SyncOutcome::Recreating,
                    uid: None,
                });
            }
            Err(e) => return Err(e.into()),
        }

        if merged == existing {
            debug!("{} unchanged", identity);
            return Ok(ObjectRecord {
                uid: existing.uid(),
                identity,
                outcome: SyncOutcome::Unchanged,
            });
        }

        let updated = self.store.update(&merged).await?;
        debug!("updated {}", identity);
        Ok(ObjectRecord {
            uid: updated.uid(),
            identity,
            outcome: SyncOutcome::Updated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner_ref(uid: &str, controller: bool) -> OwnerReference {
        OwnerReference {
            api_version: "tempo.grafana.com/v1alpha1".to_string(),
            kind: "TempoStack".to_string(),
            name: "simplest".to_string(),
            uid: uid.to_string(),
            controller: Some(controller),
            block_owner_deletion: Some(true),
        }
    }

    #[test]
    fn test_controller_reference_replaces_previous_controller() {
        let mut meta = ObjectMeta {
            owner_references: Some(vec![owner_ref("old", true), owner_ref("other", false)]),
            ..Default::default()
        };
        set_controller_reference(&mut meta, &owner_ref("new", true));
        let uids: Vec<_> = meta
            .owner_references
            .unwrap()
            .into_iter()
            .map(|r| r.uid)
            .collect();
        assert_eq!(uids, vec!["other", "new"]);
    }

    #[test]
    fn test_report_queries() {
        let id = |name: &str| {
            ObjectIdentity::new(crate::manifests::ResourceKind::ConfigMap, Some("tracing"), name)
        };
        let report = SyncReport {
            records: vec![
                ObjectRecord {
                    identity: id("a"),
                    outcome: SyncOutcome::Unchanged,
                    uid: Some(ObjectUid("1".to_string())),
                },
                ObjectRecord {
                    identity: id("b"),
                    outcome: SyncOutcome::Recreating,
                    uid: None,
                },
            ],
            skipped: Vec::new(),
        };
        assert_eq!(report.uids().len(), 1);
        assert_eq!(report.outcome(&id("b")), Some(SyncOutcome::Recreating));
        assert!(!report.is_noop());
    }
}
