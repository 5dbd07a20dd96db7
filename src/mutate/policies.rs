//! # Merge Policies
//!
//! One function per kind describing which fields the operator owns. Metadata has
//! already been merged by the [`Mutator`](super::Mutator) when these run.

use super::merge::{merge_string_map, merge_typed};
use super::registry::{CustomSpecPolicy, MergePolicy, TypedPolicy};
use super::{ImmutableFieldViolation, MutateError};
use crate::constants::INJECT_CABUNDLE_ANNOTATION;
use crate::manifests::ResourceKind;
use k8s_openapi::api::apps::v1::{Deployment, StatefulSet};
use k8s_openapi::api::core::v1::{
    ConfigMap, PersistentVolumeClaim, PersistentVolumeClaimSpec, Secret, Service, ServiceAccount,
};
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::api::rbac::v1::{ClusterRole, ClusterRoleBinding, Role, RoleBinding};
use std::collections::BTreeMap;

/// Every built-in policy, one per [`ResourceKind`]
#[must_use]
pub fn default_policies() -> Vec<Box<dyn MergePolicy>> {
    vec![
        Box::new(TypedPolicy::<ConfigMap>::new(merge_config_map)),
        Box::new(TypedPolicy::<Secret>::new(merge_secret)),
        Box::new(TypedPolicy::<Service>::new(merge_service)),
        Box::new(TypedPolicy::<ServiceAccount>::new(merge_service_account)),
        Box::new(TypedPolicy::<Deployment>::new(merge_deployment)),
        Box::new(TypedPolicy::<StatefulSet>::new(merge_stateful_set)),
        Box::new(TypedPolicy::<Role>::new(merge_role)),
        Box::new(TypedPolicy::<RoleBinding>::new(merge_role_binding)),
        Box::new(TypedPolicy::<ClusterRole>::new(merge_cluster_role)),
        Box::new(TypedPolicy::<ClusterRoleBinding>::new(merge_cluster_role_binding)),
        Box::new(TypedPolicy::<Ingress>::new(merge_ingress)),
        Box::new(CustomSpecPolicy::new(ResourceKind::ServiceMonitor)),
        Box::new(CustomSpecPolicy::new(ResourceKind::PrometheusRule)),
        Box::new(CustomSpecPolicy::new(ResourceKind::Route)),
        Box::new(CustomSpecPolicy::new(ResourceKind::GrafanaDatasource)),
    ]
}

pub fn merge_config_map(existing: &mut ConfigMap, desired: &ConfigMap) -> Result<(), MutateError> {
    // The service-ca controller writes the bundle; overwriting it would fight it forever
    let injected = existing
        .metadata
        .annotations
        .as_ref()
        .is_some_and(|a| a.contains_key(INJECT_CABUNDLE_ANNOTATION));
    if injected {
        return Ok(());
    }
    existing.data.clone_from(&desired.data);
    existing.binary_data.clone_from(&desired.binary_data);
    Ok(())
}

pub fn merge_secret(existing: &mut Secret, desired: &Secret) -> Result<(), MutateError> {
    existing.data.clone_from(&desired.data);
    Ok(())
}

pub fn merge_service(existing: &mut Service, desired: &Service) -> Result<(), MutateError> {
    let want = desired.spec.clone().unwrap_or_default();
    let spec = existing.spec.get_or_insert_with(Default::default);
    spec.ports = want.ports;
    merge_string_map(&mut spec.selector, want.selector.as_ref());
    Ok(())
}

pub fn merge_service_account(
    _existing: &mut ServiceAccount,
    _desired: &ServiceAccount,
) -> Result<(), MutateError> {
    // secrets/imagePullSecrets are populated by the platform
    Ok(())
}

pub fn merge_deployment(
    existing: &mut Deployment,
    desired: &Deployment,
) -> Result<(), MutateError> {
    let exists = existing.metadata.creation_timestamp.is_some();
    let want = desired.spec.clone().unwrap_or_default();
    let spec = existing.spec.get_or_insert_with(Default::default);

    if !exists {
        spec.selector = want.selector;
    }
    spec.replicas = want.replicas;
    merge_typed(&mut spec.template, &want.template)?;
    merge_typed(&mut spec.strategy, &want.strategy)?;
    Ok(())
}

type ClaimShape<'a> = (
    Option<&'a String>,
    Option<&'a BTreeMap<String, String>>,
    Option<&'a PersistentVolumeClaimSpec>,
);

fn claim_shapes(claims: Option<&Vec<PersistentVolumeClaim>>) -> Vec<ClaimShape<'_>> {
    claims
        .map(|claims| {
            claims
                .iter()
                .map(|c| {
                    (
                        c.metadata.name.as_ref(),
                        c.metadata.annotations.as_ref(),
                        c.spec.as_ref(),
                    )
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Fill claim fields the API server defaults (`volumeMode`) from the live templates
fn default_claim_templates(
    current: Option<&Vec<PersistentVolumeClaim>>,
    desired: Option<&mut Vec<PersistentVolumeClaim>>,
) {
    let (Some(current), Some(desired)) = (current, desired) else {
        return;
    };
    for claim in desired {
        let live = current
            .iter()
            .find(|c| c.metadata.name == claim.metadata.name)
            .and_then(|c| c.spec.as_ref());
        if let (Some(live), Some(spec)) = (live, claim.spec.as_mut()) {
            if spec.volume_mode.is_none() {
                spec.volume_mode.clone_from(&live.volume_mode);
            }
        }
    }
}

pub fn merge_stateful_set(
    existing: &mut StatefulSet,
    desired: &StatefulSet,
) -> Result<(), MutateError> {
    let exists = existing.metadata.creation_timestamp.is_some();
    let mut want = desired.spec.clone().unwrap_or_default();

    if exists {
        let current = existing.spec.clone().unwrap_or_default();
        default_claim_templates(
            current.volume_claim_templates.as_ref(),
            want.volume_claim_templates.as_mut(),
        );
        if current.selector != want.selector {
            return Err(ImmutableFieldViolation::new(
                "spec.selector",
                &current.selector,
                &want.selector,
            )
            .into());
        }
        if claim_shapes(current.volume_claim_templates.as_ref())
            != claim_shapes(want.volume_claim_templates.as_ref())
        {
            return Err(ImmutableFieldViolation::new(
                "spec.volumeClaimTemplates",
                &current.volume_claim_templates,
                &want.volume_claim_templates,
            )
            .into());
        }
    }

    let spec = existing.spec.get_or_insert_with(Default::default);
    if !exists {
        spec.selector = want.selector;
    }
    spec.replicas = want.replicas;
    spec.pod_management_policy = want.pod_management_policy;
    // Claim status belongs to the server
    spec.volume_claim_templates = match (
        spec.volume_claim_templates.take(),
        want.volume_claim_templates,
    ) {
        (Some(mut current), Some(claims)) if exists => {
            for (claim, wanted) in current.iter_mut().zip(claims) {
                claim.metadata = wanted.metadata;
                claim.spec = wanted.spec;
            }
            Some(current)
        }
        (_, claims) => claims,
    };
    merge_typed(&mut spec.template, &want.template)?;
    merge_typed(&mut spec.update_strategy, &want.update_strategy)?;
    Ok(())
}

pub fn merge_role(existing: &mut Role, desired: &Role) -> Result<(), MutateError> {
    existing.rules.clone_from(&desired.rules);
    Ok(())
}

pub fn merge_cluster_role(
    existing: &mut ClusterRole,
    desired: &ClusterRole,
) -> Result<(), MutateError> {
    existing.rules.clone_from(&desired.rules);
    existing.aggregation_rule.clone_from(&desired.aggregation_rule);
    Ok(())
}

pub fn merge_role_binding(
    existing: &mut RoleBinding,
    desired: &RoleBinding,
) -> Result<(), MutateError> {
    if existing.metadata.creation_timestamp.is_some() && existing.role_ref != desired.role_ref {
        return Err(
            ImmutableFieldViolation::new("roleRef", &existing.role_ref, &desired.role_ref).into(),
        );
    }
    existing.role_ref.clone_from(&desired.role_ref);
    existing.subjects.clone_from(&desired.subjects);
    Ok(())
}

pub fn merge_cluster_role_binding(
    existing: &mut ClusterRoleBinding,
    desired: &ClusterRoleBinding,
) -> Result<(), MutateError> {
    if existing.metadata.creation_timestamp.is_some() && existing.role_ref != desired.role_ref {
        return Err(
            ImmutableFieldViolation::new("roleRef", &existing.role_ref, &desired.role_ref).into(),
        );
    }
    existing.role_ref.clone_from(&desired.role_ref);
    existing.subjects.clone_from(&desired.subjects);
    Ok(())
}

pub fn merge_ingress(existing: &mut Ingress, desired: &Ingress) -> Result<(), MutateError> {
    let want = desired.spec.clone().unwrap_or_default();
    let spec = existing.spec.get_or_insert_with(Default::default);
    spec.default_backend = want.default_backend;
    spec.ingress_class_name = want.ingress_class_name;
    spec.rules = want.rules;
    spec.tls = want.tls;
    Ok(())
}
