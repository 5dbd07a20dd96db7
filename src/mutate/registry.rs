//! # Merge Policy Registry
//!
//! Maps each [`ResourceKind`] to the policy that merges desired state into an
//! existing object. Built once and shared read-only by every reconciliation.

use super::MutateError;
use crate::manifests::{KindObject, ManagedObject, ResourceKind};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Merge rules for one kind
pub trait MergePolicy: Send + Sync + fmt::Debug {
    /// Kind this policy applies to
    fn kind(&self) -> ResourceKind;

    /// Merge `desired` into `existing` in place
    fn merge(&self, existing: &mut ManagedObject, desired: &ManagedObject)
        -> Result<(), MutateError>;
}

/// Merge function over a typed kind
pub type MergeFn<K> = fn(&mut K, &K) -> Result<(), MutateError>;

/// Policy backed by a plain function over the typed object
pub struct TypedPolicy<K> {
    merge: MergeFn<K>,
}

impl<K: KindObject> fmt::Debug for TypedPolicy<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedPolicy")
            .field("kind", &K::KIND)
            .finish_non_exhaustive()
    }
}

impl<K> TypedPolicy<K> {
    #[must_use]
    pub fn new(merge: MergeFn<K>) -> Self {
        Self { merge }
    }
}

impl<K> MergePolicy for TypedPolicy<K>
where
    K: KindObject + Send + Sync,
{
    fn kind(&self) -> ResourceKind {
        K::KIND
    }

    fn merge(
        &self,
        existing: &mut ManagedObject,
        desired: &ManagedObject,
    ) -> Result<(), MutateError> {
        let existing_kind = existing.kind();
        let (Some(existing), Some(desired)) =
            (K::from_object_mut(existing), K::from_object(desired))
        else {
            return Err(MutateError::KindMismatch {
                existing: existing_kind,
                desired: desired.kind(),
            });
        };
        (self.merge)(existing, desired)
    }
}

/// Custom resources whose whole `spec` belongs to the operator
#[derive(Debug)]
pub struct CustomSpecPolicy {
    kind: ResourceKind,
}

impl CustomSpecPolicy {
    #[must_use]
    pub fn new(kind: ResourceKind) -> Self {
        Self { kind }
    }
}

impl MergePolicy for CustomSpecPolicy {
    fn kind(&self) -> ResourceKind {
        self.kind
    }

    fn merge(
        &self,
        existing: &mut ManagedObject,
        desired: &ManagedObject,
    ) -> Result<(), MutateError> {
        let existing_kind = existing.kind();
        if existing_kind != self.kind || desired.kind() != self.kind {
            return Err(MutateError::KindMismatch {
                existing: existing_kind,
                desired: desired.kind(),
            });
        }
        let (Some(existing), Some(desired)) = (existing.as_dynamic_mut(), desired.as_dynamic())
        else {
            return Err(MutateError::KindMismatch {
                existing: existing_kind,
                desired: self.kind,
            });
        };

        let spec = desired.data.get("spec").cloned().unwrap_or(Value::Null);
        if !existing.data.is_object() {
            existing.data = Value::Object(serde_json::Map::new());
        }
        if let Some(data) = existing.data.as_object_mut() {
            if spec.is_null() {
                data.remove("spec");
            } else {
                data.insert("spec".to_string(), spec);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("duplicate merge policy registered for kind {0}")]
    DuplicatePolicy(ResourceKind),
    #[error("missing mutate implementation for {}", join_kinds(.0))]
    MissingPolicies(Vec<ResourceKind>),
}

fn join_kinds(kinds: &[ResourceKind]) -> String {
    kinds
        .iter()
        .map(ResourceKind::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Registry of merge policies keyed by kind
#[derive(Debug)]
pub struct MergeRegistry {
    policies: HashMap<ResourceKind, Box<dyn MergePolicy>>,
}

impl MergeRegistry {
    #[must_use]
    pub fn builder() -> MergeRegistryBuilder {
        MergeRegistryBuilder::default()
    }

    /// Registry with every built-in policy
    #[must_use]
    pub fn standard() -> Self {
        Self {
            policies: super::policies::default_policies()
                .into_iter()
                .map(|p| (p.kind(), p))
                .collect(),
        }
    }

    /// Built-in policies, verified to cover `required`
    pub fn for_kinds(required: &[ResourceKind]) -> Result<Self, RegistryError> {
        Self::builder().register_defaults().build(required)
    }

    /// Look up the policy for `kind`
    pub fn policy(&self, kind: ResourceKind) -> Result<&dyn MergePolicy, MutateError> {
        self.policies
            .get(&kind)
            .map(|p| &**p)
            .ok_or(MutateError::MissingPolicy(kind))
    }

    #[must_use]
    pub fn supports(&self, kind: ResourceKind) -> bool {
        self.policies.contains_key(&kind)
    }

    /// Fail if any of `kinds` has no registered policy
    pub fn ensure_supports(&self, kinds: &[ResourceKind]) -> Result<(), RegistryError> {
        let mut missing: Vec<ResourceKind> = kinds
            .iter()
            .copied()
            .filter(|k| !self.supports(*k))
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        missing.sort();
        missing.dedup();
        Err(RegistryError::MissingPolicies(missing))
    }

    /// Registered kinds, sorted
    #[must_use]
    pub fn kinds(&self) -> Vec<ResourceKind> {
        let mut kinds: Vec<_> = self.policies.keys().copied().collect();
        kinds.sort();
        kinds
    }
}

/// Builder that rejects duplicate and missing policies up front
#[derive(Debug, Default)]
pub struct MergeRegistryBuilder {
    policies: HashMap<ResourceKind, Box<dyn MergePolicy>>,
    duplicate: Option<ResourceKind>,
}

impl MergeRegistryBuilder {
    #[must_use]
    pub fn register(self, policy: impl MergePolicy + 'static) -> Self {
        self.register_boxed(Box::new(policy))
    }

    #[must_use]
    pub fn register_boxed(mut self, policy: Box<dyn MergePolicy>) -> Self {
        let kind = policy.kind();
        if self.policies.insert(kind, policy).is_some() && self.duplicate.is_none() {
            self.duplicate = Some(kind);
        }
        self
    }

    #[must_use]
    pub fn register_defaults(self) -> Self {
        super::policies::default_policies()
            .into_iter()
            .fold(self, MergeRegistryBuilder::register_boxed)
    }

    /// Finish the registry, verifying every kind in `required` has a policy
    pub fn build(self, required: &[ResourceKind]) -> Result<MergeRegistry, RegistryError> {
        if let Some(kind) = self.duplicate {
            return Err(RegistryError::DuplicatePolicy(kind));
        }
        let registry = MergeRegistry {
            policies: self.policies,
        };
        registry.ensure_supports(required)?;
        Ok(registry)
    }
}
