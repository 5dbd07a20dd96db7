//! Shared fixtures for the engine integration tests
//!
//! Every test runs against `InMemoryStore` and records status writes in memory.

#![allow(dead_code, reason = "each test binary uses a different subset of fixtures")]

use k8s_openapi::api::apps::v1::{StatefulSet, StatefulSetSpec};
use k8s_openapi::api::core::v1::{
    ConfigMap, Container, PersistentVolumeClaim, PersistentVolumeClaimSpec, PodSpec,
    PodTemplateSpec, Service, ServicePort, ServiceSpec, VolumeResourceRequirements,
};
use k8s_openapi::api::networking::v1::{Ingress, IngressSpec};
use k8s_openapi::api::rbac::v1::{ClusterRole, PolicyRule};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector as K8sSelector, ObjectMeta};
use std::collections::BTreeMap;
use std::sync::Arc;
use tempo_operator::config::EngineConfig;
use tempo_operator::constants::{MONOLITHIC_APP_NAME, STACK_APP_NAME};
use tempo_operator::controller::Reconciler;
use tempo_operator::crd::{
    MonolithicStorageSpec, MonolithicTracesStorage, ObjectStorageSpec, StorageSecret,
    TempoMonolithic, TempoMonolithicSpec, TempoStack, TempoStackSpec,
};
use tempo_operator::manifests::{component_labels, owner_labels, ManagedObject, ResourceKind};
use tempo_operator::mutate::MergeRegistry;
use tempo_operator::status::RecordingStatusWriter;
use tempo_operator::store::InMemoryStore;

pub const NAMESPACE: &str = "tracing";
pub const INSTANCE: &str = "simplest";

pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub status: Arc<RecordingStatusWriter>,
    pub reconciler: Reconciler,
}

pub fn harness() -> Harness {
    harness_with(EngineConfig::default())
}

pub fn harness_with(config: EngineConfig) -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let status = Arc::new(RecordingStatusWriter::new());
    let registry = MergeRegistry::for_kinds(&ResourceKind::ALL).unwrap();
    let reconciler = Reconciler::new(store.clone(), status.clone(), Arc::new(registry), config);
    Harness {
        store,
        status,
        reconciler,
    }
}

pub fn owner() -> TempoStack {
    let mut stack = TempoStack::new(
        INSTANCE,
        TempoStackSpec {
            management_state: Default::default(),
            storage: ObjectStorageSpec {
                secret: StorageSecret {
                    name: "minio".to_string(),
                    r#type: "s3".to_string(),
                },
            },
            storage_size: Some("1Gi".to_string()),
            replication_factor: None,
            service_account: None,
        },
    );
    stack.metadata.namespace = Some(NAMESPACE.to_string());
    stack.metadata.uid = Some("stack-uid".to_string());
    stack.metadata.generation = Some(1);
    stack
}

/// A `TempoMonolithic` with the same name and namespace as [`owner`]
pub fn monolithic_owner() -> TempoMonolithic {
    let mut mono = TempoMonolithic::new(
        INSTANCE,
        TempoMonolithicSpec {
            management_state: Default::default(),
            storage: Some(MonolithicStorageSpec {
                traces: MonolithicTracesStorage {
                    backend: "pv".to_string(),
                    size: Some("10Gi".to_string()),
                },
            }),
        },
    );
    mono.metadata.namespace = Some(NAMESPACE.to_string());
    mono.metadata.uid = Some("monolithic-uid".to_string());
    mono.metadata.generation = Some(1);
    mono
}

fn meta(name: &str, component: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(NAMESPACE.to_string()),
        labels: Some(component_labels(STACK_APP_NAME, INSTANCE, component)),
        ..Default::default()
    }
}

pub fn config_map(config: &str) -> ManagedObject {
    ConfigMap {
        metadata: meta("tempo-simplest", "config"),
        data: Some(BTreeMap::from([("tempo.yaml".to_string(), config.to_string())])),
        ..Default::default()
    }
    .into()
}

pub fn service(name: &str) -> ManagedObject {
    Service {
        metadata: meta(name, "distributor"),
        spec: Some(ServiceSpec {
            ports: Some(vec![ServicePort {
                name: Some("otlp-grpc".to_string()),
                port: 4317,
                ..Default::default()
            }]),
            selector: Some(component_labels(STACK_APP_NAME, INSTANCE, "distributor")),
            ..Default::default()
        }),
        ..Default::default()
    }
    .into()
}

pub fn ingester(storage: &str) -> ManagedObject {
    let labels = component_labels(STACK_APP_NAME, INSTANCE, "ingester");
    StatefulSet {
        metadata: meta("tempo-simplest-ingester", "ingester"),
        spec: Some(StatefulSetSpec {
            replicas: Some(1),
            selector: K8sSelector {
                match_labels: Some(labels.clone()),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![Container {
                        name: "tempo".to_string(),
                        image: Some("docker.io/grafana/tempo:2.4.1".to_string()),
                        ..Default::default()
                    }],
                    ..Default::default()
                }),
            },
            volume_claim_templates: Some(vec![PersistentVolumeClaim {
                metadata: ObjectMeta {
                    name: Some("data".to_string()),
                    ..Default::default()
                },
                spec: Some(PersistentVolumeClaimSpec {
                    access_modes: Some(vec!["ReadWriteOnce".to_string()]),
                    resources: Some(VolumeResourceRequirements {
                        requests: Some(BTreeMap::from([(
                            "storage".to_string(),
                            Quantity(storage.to_string()),
                        )])),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
    .into()
}

/// Ingress labelled for the `app` owner kind and `instance`
pub fn ingress(name: &str, app: &str, instance: &str) -> ManagedObject {
    Ingress {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(NAMESPACE.to_string()),
            labels: Some(owner_labels(app, instance)),
            ..Default::default()
        },
        spec: Some(IngressSpec {
            ingress_class_name: Some("nginx".to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
    .into()
}

pub fn cluster_role() -> ManagedObject {
    ClusterRole {
        metadata: ObjectMeta {
            name: Some("tempo-simplest-tracing".to_string()),
            labels: Some(owner_labels(STACK_APP_NAME, INSTANCE)),
            ..Default::default()
        },
        rules: Some(vec![PolicyRule {
            api_groups: Some(vec!["authentication.k8s.io".to_string()]),
            resources: Some(vec!["tokenreviews".to_string()]),
            verbs: vec!["create".to_string()],
            ..Default::default()
        }]),
        ..Default::default()
    }
    .into()
}

/// Single-binary StatefulSet of a `TempoMonolithic`
pub fn monolithic_workload() -> ManagedObject {
    let labels = component_labels(MONOLITHIC_APP_NAME, INSTANCE, "tempo");
    StatefulSet {
        metadata: ObjectMeta {
            name: Some("tempo-simplest".to_string()),
            namespace: Some(NAMESPACE.to_string()),
            labels: Some(labels.clone()),
            ..Default::default()
        },
        spec: Some(StatefulSetSpec {
            replicas: Some(1),
            selector: K8sSelector {
                match_labels: Some(labels),
                ..Default::default()
            },
            ..Default::default()
        }),
        ..Default::default()
    }
    .into()
}
