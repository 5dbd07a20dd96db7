//! # Status State Machine
//!
//! Folds a reconciliation outcome and sampled component health into the owner's
//! ordered condition list, then persists it when it changed.
//!
//! ## Transition policy
//!
//! - Clean pass: only Ready and Degraded are updated, from live health.
//! - Configuration error: a ConfigurationError condition; the error is terminal.
//! - Any other failure: a Failed condition with reason `FailedReconciliation`.

pub mod conditions;
pub mod health;

pub use conditions::{
    find_condition, update_condition, update_condition_at, Condition, ConditionStatus,
    ConditionType,
};
pub use health::{ComponentHealth, StackHealth};

use crate::crd::{ConditionedOwner, TempoStatus};
use crate::manifests::ConfigurationError;
use crate::observability::metrics;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kube::api::{Api, ApiResource, DynamicObject, Patch, PatchParams};
use kube::{Client, Resource};
use std::fmt;
use std::sync::Mutex;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StatusError {
    #[error("failed to patch status of {target}: {source}")]
    Patch {
        target: String,
        #[source]
        source: kube::Error,
    },
    #[error("failed to serialize status: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("status writer unavailable: {0}")]
    Unavailable(String),
}

/// What the pass amounted to, as seen by the status machine
#[derive(Debug, Clone, Copy)]
pub enum PassOutcome<'a> {
    Clean(&'a StackHealth),
    ConfigurationError(&'a ConfigurationError),
    Failed(&'a str),
}

/// Conditions after applying `outcome` to `existing`, stamped with `now`
#[must_use]
pub fn conditions_for_outcome(
    existing: &[Condition],
    outcome: PassOutcome<'_>,
    now: DateTime<Utc>,
) -> Vec<Condition> {
    match outcome {
        PassOutcome::Clean(health) => {
            let conditions = update_condition_at(existing, health.ready_condition(), now);
            update_condition_at(&conditions, health.degraded_condition(), now)
        }
        PassOutcome::ConfigurationError(err) => update_condition_at(
            existing,
            Condition::new(
                ConditionType::ConfigurationError,
                true,
                &err.reason,
                err.message.clone(),
            ),
            now,
        ),
        PassOutcome::Failed(message) => update_condition_at(
            existing,
            Condition::new(
                ConditionType::Failed,
                true,
                conditions::REASON_FAILED_RECONCILIATION,
                message,
            ),
            now,
        ),
    }
}

/// Where a status write goes
#[derive(Debug, Clone)]
pub struct StatusTarget {
    pub api_resource: ApiResource,
    pub namespace: Option<String>,
    pub name: String,
}

impl StatusTarget {
    #[must_use]
    pub fn for_owner<K: Resource<DynamicType = ()>>(owner: &K) -> Self {
        Self {
            api_resource: ApiResource::erase::<K>(&()),
            namespace: owner.meta().namespace.clone(),
            name: owner.meta().name.clone().unwrap_or_default(),
        }
    }
}

impl fmt::Display for StatusTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{} {}/{}", self.api_resource.kind, ns, self.name),
            None => write!(f, "{} {}", self.api_resource.kind, self.name),
        }
    }
}

/// Persists owner status
#[async_trait]
pub trait StatusWriter: Send + Sync {
    async fn write_status(&self, target: &StatusTarget, status: &TempoStatus)
        -> Result<(), StatusError>;
}

/// Writes the status subresource with a merge patch
#[derive(Clone)]
pub struct KubeStatusWriter {
    client: Client,
}

impl fmt::Debug for KubeStatusWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KubeStatusWriter").finish_non_exhaustive()
    }
}

impl KubeStatusWriter {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StatusWriter for KubeStatusWriter {
    async fn write_status(
        &self,
        target: &StatusTarget,
        status: &TempoStatus,
    ) -> Result<(), StatusError> {
        let api: Api<DynamicObject> = match &target.namespace {
            Some(ns) => Api::namespaced_with(self.client.clone(), ns, &target.api_resource),
            None => Api::all_with(self.client.clone(), &target.api_resource),
        };
        let patch = serde_json::json!({ "status": status });
        api.patch_status(&target.name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map_err(|source| StatusError::Patch {
                target: target.to_string(),
                source,
            })?;
        Ok(())
    }
}

/// Keeps every status write in memory
#[derive(Debug, Default)]
pub struct RecordingStatusWriter {
    writes: Mutex<Vec<(String, TempoStatus)>>,
}

impl RecordingStatusWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes so far, as `(target, status)`
    pub fn writes(&self) -> Result<Vec<(String, TempoStatus)>, StatusError> {
        self.writes
            .lock()
            .map(|w| w.clone())
            .map_err(|e| StatusError::Unavailable(e.to_string()))
    }

    pub fn last(&self) -> Result<Option<TempoStatus>, StatusError> {
        Ok(self.writes()?.pop().map(|(_, status)| status))
    }
}

#[async_trait]
impl StatusWriter for RecordingStatusWriter {
    async fn write_status(
        &self,
        target: &StatusTarget,
        status: &TempoStatus,
    ) -> Result<(), StatusError> {
        self.writes
            .lock()
            .map_err(|e| StatusError::Unavailable(e.to_string()))?
            .push((target.to_string(), status.clone()));
        Ok(())
    }
}

/// Persist `conditions` on `owner` unless nothing changed
///
/// Returns whether a write happened.
pub async fn refresh_status<K: ConditionedOwner>(
    writer: &dyn StatusWriter,
    owner: &K,
    conditions: Vec<Condition>,
) -> Result<bool, StatusError> {
    let status = TempoStatus {
        conditions,
        observed_generation: owner.meta().generation,
    };
    let target = StatusTarget::for_owner(owner);
    if owner.owner_status() == Some(&status) {
        debug!("status of {} unchanged, skipping update", target);
        return Ok(false);
    }
    writer.write_status(&target, &status).await?;
    metrics::increment_status_updates();
    Ok(true)
}
