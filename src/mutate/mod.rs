//! # Mutator
//!
//! Merges a desired object into the object observed in the cluster, applying the
//! per-kind merge policy from the [`MergeRegistry`].
//!
//! ## Rules
//!
//! - Labels and annotations: desired keys override, existing-only keys survive
//!   (other controllers add their own).
//! - Owner references: replaced when the desired object carries any.
//! - Everything else: per kind, see [`policies`].
//!
//! A failed mutation leaves the existing object untouched.

pub mod merge;
pub mod policies;
mod registry;

pub use registry::{
    CustomSpecPolicy, MergeFn, MergePolicy, MergeRegistry, MergeRegistryBuilder, RegistryError,
    TypedPolicy,
};

use crate::manifests::{ManagedObject, ResourceKind};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// A change the API server would reject on an existing object
///
/// The driver resolves it by deleting the object and creating it again on the
/// next pass.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("immutable field {field_path} differs (existing: {existing}, desired: {desired})")]
pub struct ImmutableFieldViolation {
    pub field_path: String,
    pub existing: Value,
    pub desired: Value,
}

impl ImmutableFieldViolation {
    pub fn new<T: Serialize + ?Sized>(field_path: &str, existing: &T, desired: &T) -> Self {
        Self {
            field_path: field_path.to_string(),
            existing: serde_json::to_value(existing).unwrap_or(Value::Null),
            desired: serde_json::to_value(desired).unwrap_or(Value::Null),
        }
    }
}

#[derive(Debug, Error)]
pub enum MutateError {
    #[error(transparent)]
    ImmutableField(#[from] ImmutableFieldViolation),
    #[error("missing mutate implementation for kind {0}")]
    MissingPolicy(ResourceKind),
    #[error("cannot merge {desired} into {existing}")]
    KindMismatch {
        existing: ResourceKind,
        desired: ResourceKind,
    },
    #[error("failed to merge object fields: {0}")]
    Merge(#[from] serde_json::Error),
}

/// Merge ownership metadata from `desired` into `existing`
pub fn merge_metadata(existing: &mut ObjectMeta, desired: &ObjectMeta) {
    merge::merge_string_map(&mut existing.labels, desired.labels.as_ref());
    merge::merge_string_map(&mut existing.annotations, desired.annotations.as_ref());
    if let Some(refs) = desired.owner_references.as_ref().filter(|r| !r.is_empty()) {
        existing.owner_references = Some(refs.clone());
    }
}

/// Applies merge policies looked up by kind
#[derive(Debug, Clone)]
pub struct Mutator {
    registry: Arc<MergeRegistry>,
}

impl Mutator {
    #[must_use]
    pub fn new(registry: Arc<MergeRegistry>) -> Self {
        Self { registry }
    }

    #[must_use]
    pub fn registry(&self) -> &MergeRegistry {
        &self.registry
    }

    /// Merge `desired` into `existing`
    ///
    /// On error `existing` is unchanged.
    pub fn mutate(
        &self,
        existing: &mut ManagedObject,
        desired: &ManagedObject,
    ) -> Result<(), MutateError> {
        if existing.kind() != desired.kind() {
            return Err(MutateError::KindMismatch {
                existing: existing.kind(),
                desired: desired.kind(),
            });
        }
        let policy = self.registry.policy(desired.kind())?;

        let mut candidate = existing.clone();
        merge_metadata(candidate.meta_mut(), desired.meta());
        policy.merge(&mut candidate, desired)?;
        *existing = candidate;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::ConfigMap;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
    use std::collections::BTreeMap;

    fn labels(pairs: &[(&str, &str)]) -> Option<BTreeMap<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        )
    }

    fn owner(name: &str) -> OwnerReference {
        OwnerReference {
            api_version: "tempo.grafana.com/v1alpha1".to_string(),
            kind: "TempoStack".to_string(),
            name: name.to_string(),
            uid: format!("uid-{name}"),
            controller: Some(true),
            block_owner_deletion: Some(true),
        }
    }

    #[test]
    fn test_metadata_override_semantics() {
        let mut existing = ObjectMeta {
            labels: labels(&[("shared", "old"), ("foreign", "kept")]),
            annotations: labels(&[("openshift.io/sa", "injected")]),
            ..Default::default()
        };
        let desired = ObjectMeta {
            labels: labels(&[("shared", "new")]),
            annotations: labels(&[("tempo.grafana.com/config.hash", "abc")]),
            ..Default::default()
        };
        merge_metadata(&mut existing, &desired);

        let labels = existing.labels.unwrap();
        assert_eq!(labels["shared"], "new");
        assert_eq!(labels["foreign"], "kept");
        let annotations = existing.annotations.unwrap();
        assert_eq!(annotations["openshift.io/sa"], "injected");
        assert_eq!(annotations["tempo.grafana.com/config.hash"], "abc");
    }

    #[test]
    fn test_owner_references_replaced_only_when_desired_has_some() {
        let mut existing = ObjectMeta {
            owner_references: Some(vec![owner("old")]),
            ..Default::default()
        };
        merge_metadata(&mut existing, &ObjectMeta::default());
        assert_eq!(existing.owner_references, Some(vec![owner("old")]));

        let desired = ObjectMeta {
            owner_references: Some(vec![owner("new")]),
            ..Default::default()
        };
        merge_metadata(&mut existing, &desired);
        assert_eq!(existing.owner_references, Some(vec![owner("new")]));
    }

    #[test]
    fn test_mutate_rejects_kind_mismatch() {
        let mutator = Mutator::new(Arc::new(MergeRegistry::standard()));
        let mut existing = ManagedObject::from(ConfigMap::default());
        let desired = ManagedObject::custom(
            ResourceKind::Route,
            ObjectMeta::default(),
            Value::Null,
        )
        .unwrap();
        assert!(matches!(
            mutator.mutate(&mut existing, &desired),
            Err(MutateError::KindMismatch { .. })
        ));
    }

    #[test]
    fn test_mutate_missing_policy() {
        let registry = MergeRegistry::builder().build(&[]).unwrap();
        let mutator = Mutator::new(Arc::new(registry));
        let mut existing = ManagedObject::from(ConfigMap::default());
        let desired = ManagedObject::from(ConfigMap::default());
        let err = mutator.mutate(&mut existing, &desired).unwrap_err();
        assert_eq!(err.to_string(), "missing mutate implementation for kind ConfigMap");
    }

    #[test]
    fn test_custom_spec_replaced_wholesale() {
        let mutator = Mutator::new(Arc::new(MergeRegistry::standard()));
        let meta = ObjectMeta {
            name: Some("tempo-simplest".to_string()),
            ..Default::default()
        };
        let mut existing = ManagedObject::custom(
            ResourceKind::PrometheusRule,
            meta.clone(),
            serde_json::json!({"groups": [{"name": "old"}], "extra": true}),
        )
        .unwrap();
        let desired = ManagedObject::custom(
            ResourceKind::PrometheusRule,
            meta,
            serde_json::json!({"groups": [{"name": "new"}]}),
        )
        .unwrap();
        mutator.mutate(&mut existing, &desired).unwrap();
        assert_eq!(
            existing.as_dynamic().unwrap().data["spec"],
            serde_json::json!({"groups": [{"name": "new"}]})
        );
    }
}
