//! # Prune Tests

mod common;

use common::{
    harness, harness_with, ingress, monolithic_owner, monolithic_workload, owner, INSTANCE,
    NAMESPACE,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use std::collections::BTreeSet;
use std::sync::Arc;
use tempo_operator::config::{EngineConfig, FeatureGates};
use tempo_operator::constants::{MONOLITHIC_APP_NAME, STACK_APP_NAME};
use tempo_operator::controller::reconcile_owner;
use tempo_operator::manifests::{owner_labels, ManagedObject, ResourceKind};
use tempo_operator::status::conditions::REASON_PENDING_COMPONENTS;
use tempo_operator::status::{find_condition, ConditionType};
use tokio_util::sync::CancellationToken;

fn route(name: &str) -> ManagedObject {
    ManagedObject::custom(
        ResourceKind::Route,
        ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(NAMESPACE.to_string()),
            labels: Some(owner_labels(STACK_APP_NAME, INSTANCE)),
            ..Default::default()
        },
        serde_json::json!({"to": {"kind": "Service", "name": "tempo-simplest-query-frontend"}}),
    )
    .unwrap()
}

#[tokio::test]
async fn test_undesired_owned_ingress_is_deleted() {
    let h = harness();
    let stale = ingress("tempo-simplest-query-frontend", STACK_APP_NAME, INSTANCE);
    h.store.insert(stale.clone()).unwrap();

    let report = h
        .reconciler
        .prune(
            &owner(),
            &[],
            &[ResourceKind::Ingress],
            &BTreeSet::new(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.deleted, vec![stale.identity()]);
    assert!(!h.store.contains(&stale.identity()).unwrap());
}

#[tokio::test]
async fn test_other_instance_is_untouched() {
    let h = harness();
    let foreign = ingress("tempo-other-query-frontend", STACK_APP_NAME, "other");
    h.store.insert(foreign.clone()).unwrap();

    let report = h
        .reconciler
        .prune(
            &owner(),
            &[],
            &[ResourceKind::Ingress],
            &BTreeSet::new(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(report.deleted.is_empty());
    assert!(h.store.contains(&foreign.identity()).unwrap());
    assert!(h.store.journal().unwrap().is_empty());
}

#[tokio::test]
async fn test_object_controlled_by_another_resource_is_untouched() {
    let h = harness();
    let mut adopted = ingress("tempo-simplest-gateway", STACK_APP_NAME, INSTANCE);
    adopted.meta_mut().owner_references = Some(vec![OwnerReference {
        api_version: "tempo.grafana.com/v1alpha1".to_string(),
        kind: "TempoMonolithic".to_string(),
        name: INSTANCE.to_string(),
        uid: "monolithic-uid".to_string(),
        controller: Some(true),
        block_owner_deletion: Some(true),
    }]);
    h.store.insert(adopted.clone()).unwrap();

    let report = h
        .reconciler
        .prune(
            &owner(),
            &[],
            &[ResourceKind::Ingress],
            &BTreeSet::new(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(report.deleted.is_empty());
    assert!(h.store.contains(&adopted.identity()).unwrap());
}

#[tokio::test]
async fn test_owners_sharing_a_name_keep_their_objects() {
    let h = harness();
    let cancel = CancellationToken::new();
    let jaeger_ui = ingress("tempo-simplest-jaegerui", MONOLITHIC_APP_NAME, INSTANCE);

    reconcile_owner(
        Arc::new(monolithic_owner()),
        Ok(vec![jaeger_ui.clone(), monolithic_workload()]),
        &h.reconciler,
        &cancel,
    )
    .await
    .unwrap();
    assert!(h.store.contains(&jaeger_ui.identity()).unwrap());

    reconcile_owner(Arc::new(owner()), Ok(Vec::new()), &h.reconciler, &cancel)
        .await
        .unwrap();

    assert!(h.store.contains(&jaeger_ui.identity()).unwrap());
    assert!(h.store.contains(&monolithic_workload().identity()).unwrap());

    // The stack has no workloads of its own
    let status = h.status.last().unwrap().unwrap();
    let ready = find_condition(&status.conditions, ConditionType::Ready).unwrap();
    assert_eq!(ready.reason, REASON_PENDING_COMPONENTS);
    assert_eq!(ready.message, "no components found");
}

#[tokio::test]
async fn test_desired_and_synced_objects_are_kept() {
    let h = harness();
    let desired = ingress("tempo-simplest-query-frontend", STACK_APP_NAME, INSTANCE);
    let synced = h
        .store
        .insert(ingress("tempo-simplest-gateway", STACK_APP_NAME, INSTANCE))
        .unwrap();
    h.store.insert(desired.clone()).unwrap();
    let keep = BTreeSet::from([synced.uid().unwrap()]);

    let report = h
        .reconciler
        .prune(
            &owner(),
            std::slice::from_ref(&desired),
            &[ResourceKind::Ingress],
            &keep,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(report.deleted.is_empty());
    assert_eq!(report.kept, 2);
}

#[tokio::test]
async fn test_list_failure_does_not_stop_other_kinds() {
    let h = harness();
    let stale = ingress("tempo-simplest-query-frontend", STACK_APP_NAME, INSTANCE);
    h.store.insert(stale.clone()).unwrap();
    h.store.insert(route("tempo-simplest-query-frontend")).unwrap();
    h.store
        .fail_list(ResourceKind::Route, "the server could not find the requested resource")
        .unwrap();

    let err = h
        .reconciler
        .prune(
            &owner(),
            &[],
            &[ResourceKind::Route, ResourceKind::Ingress],
            &BTreeSet::new(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.list_failures.len(), 1);
    assert_eq!(err.list_failures[0].kind, ResourceKind::Route);
    assert_eq!(err.report.deleted, vec![stale.identity()]);
    assert!(err.to_string().contains("listing Route"));
}

#[tokio::test]
async fn test_full_pass_prunes_disabled_feature() {
    let config = EngineConfig {
        features: FeatureGates {
            openshift_routes: true,
            ..Default::default()
        },
        ..Default::default()
    };
    let h = harness_with(config);
    let cancel = CancellationToken::new();
    let desired_route = route("tempo-simplest-query-frontend");

    // Feature on: route created and kept
    reconcile_owner(
        Arc::new(owner()),
        Ok(vec![desired_route.clone()]),
        &h.reconciler,
        &cancel,
    )
    .await
    .unwrap();
    assert!(h.store.contains(&desired_route.identity()).unwrap());

    // Feature off: no longer desired, pruned after sync
    reconcile_owner(Arc::new(owner()), Ok(Vec::new()), &h.reconciler, &cancel)
        .await
        .unwrap();
    assert!(!h.store.contains(&desired_route.identity()).unwrap());
}

#[tokio::test]
async fn test_cancelled_prune_deletes_nothing() {
    let h = harness();
    let stale = ingress("tempo-simplest-query-frontend", STACK_APP_NAME, INSTANCE);
    h.store.insert(stale.clone()).unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = h
        .reconciler
        .prune(
            &owner(),
            &[],
            &[ResourceKind::Ingress],
            &BTreeSet::new(),
            &cancel,
        )
        .await
        .unwrap_err();

    assert!(err.cancelled);
    assert!(h.store.contains(&stale.identity()).unwrap());
}
