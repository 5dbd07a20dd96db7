//! # Component Health
//!
//! Samples the owner's Deployments and StatefulSets and reduces them to per-component
//! replica counts, from which the Ready and Degraded conditions are derived.

use super::conditions::{
    Condition, ConditionType, REASON_DEGRADED, REASON_NO_DEGRADED_COMPONENTS,
    REASON_PENDING_COMPONENTS, REASON_READY,
};
use crate::constants::LABEL_COMPONENT;
use crate::crd::ConditionedOwner;
use crate::manifests::{ManagedObject, ResourceKind};
use crate::store::{ObjectStore, StoreError};
use std::collections::BTreeMap;

/// Replica counts of one component, summed over its workloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ComponentHealth {
    pub desired: i32,
    pub ready: i32,
}

impl ComponentHealth {
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready >= self.desired
    }

    /// Running, but below the desired replica count
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.ready > 0 && self.ready < self.desired
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StackHealth {
    pub components: BTreeMap<String, ComponentHealth>,
}

impl StackHealth {
    /// List the owner's workloads and read their replica counts
    ///
    /// Workloads controlled by another resource are ignored.
    pub async fn sample<K: ConditionedOwner>(
        store: &dyn ObjectStore,
        owner: &K,
    ) -> Result<Self, StoreError> {
        let namespace = owner.meta().namespace.as_deref();
        let selector = owner.owned_selector();
        let mut health = StackHealth::default();
        for kind in [ResourceKind::Deployment, ResourceKind::StatefulSet] {
            for workload in store.list(kind, namespace, &selector).await? {
                if owner.controls(&workload) {
                    health.observe(&workload);
                }
            }
        }
        Ok(health)
    }

    /// Add one workload's replica counts under its component label
    pub fn observe(&mut self, workload: &ManagedObject) {
        let (desired, ready) = match workload {
            ManagedObject::Deployment(d) => (
                d.spec.as_ref().and_then(|s| s.replicas),
                d.status.as_ref().and_then(|s| s.ready_replicas),
            ),
            ManagedObject::StatefulSet(s) => (
                s.spec.as_ref().and_then(|s| s.replicas),
                s.status.as_ref().and_then(|s| s.ready_replicas),
            ),
            _ => return,
        };
        let component = workload
            .meta()
            .labels
            .as_ref()
            .and_then(|l| l.get(LABEL_COMPONENT))
            .cloned()
            .unwrap_or_else(|| workload.name().to_string());

        let entry = self.components.entry(component).or_default();
        entry.desired += desired.unwrap_or(1);
        entry.ready += ready.unwrap_or(0);
    }

    fn pending(&self) -> Vec<&str> {
        self.components
            .iter()
            .filter(|(_, c)| !c.is_ready())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    fn degraded(&self) -> Vec<&str> {
        self.components
            .iter()
            .filter(|(_, c)| c.is_degraded())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Ready is true once at least one component exists and none is pending
    #[must_use]
    pub fn ready_condition(&self) -> Condition {
        let pending = self.pending();
        if self.components.is_empty() {
            Condition::new(
                ConditionType::Ready,
                false,
                REASON_PENDING_COMPONENTS,
                "no components found",
            )
        } else if pending.is_empty() {
            Condition::new(
                ConditionType::Ready,
                true,
                REASON_READY,
                "All components are operational",
            )
        } else {
            Condition::new(
                ConditionType::Ready,
                false,
                REASON_PENDING_COMPONENTS,
                format!("components not ready: {}", pending.join(", ")),
            )
        }
    }

    #[must_use]
    pub fn degraded_condition(&self) -> Condition {
        let degraded = self.degraded();
        if degraded.is_empty() {
            Condition::new(
                ConditionType::Degraded,
                false,
                REASON_NO_DEGRADED_COMPONENTS,
                "",
            )
        } else {
            Condition::new(
                ConditionType::Degraded,
                true,
                REASON_DEGRADED,
                format!("components running below desired replicas: {}", degraded.join(", ")),
            )
        }
    }
}
