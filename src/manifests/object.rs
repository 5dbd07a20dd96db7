//! # Managed Objects
//!
//! `ManagedObject` is the tagged union over every kind the engine reconciles.
//! Built-in kinds use the typed `k8s-openapi` structs; custom resources owned by
//! other operators (Prometheus, OpenShift, Grafana) are carried as `DynamicObject`.

use super::kind::{ObjectIdentity, ObjectUid, ResourceKind};
use k8s_openapi::api::apps::v1::{Deployment, StatefulSet};
use k8s_openapi::api::core::v1::{ConfigMap, Secret, Service, ServiceAccount};
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::api::rbac::v1::{ClusterRole, ClusterRoleBinding, Role, RoleBinding};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{DynamicObject, TypeMeta};
use serde_json::Value;

/// A desired or observed object, tagged with its kind
#[derive(Debug, Clone)]
pub enum ManagedObject {
    ConfigMap(ConfigMap),
    Secret(Secret),
    Service(Service),
    ServiceAccount(ServiceAccount),
    Deployment(Deployment),
    StatefulSet(StatefulSet),
    Role(Role),
    RoleBinding(RoleBinding),
    ClusterRole(ClusterRole),
    ClusterRoleBinding(ClusterRoleBinding),
    Ingress(Ingress),
    ServiceMonitor(DynamicObject),
    PrometheusRule(DynamicObject),
    Route(DynamicObject),
    GrafanaDatasource(DynamicObject),
}

/// Evaluate `$body` with `$o` bound to the inner value of any variant
macro_rules! with_inner {
    ($obj:expr, $o:ident => $body:expr) => {
        match $obj {
            ManagedObject::ConfigMap($o) => $body,
            ManagedObject::Secret($o) => $body,
            ManagedObject::Service($o) => $body,
            ManagedObject::ServiceAccount($o) => $body,
            ManagedObject::Deployment($o) => $body,
            ManagedObject::StatefulSet($o) => $body,
            ManagedObject::Role($o) => $body,
            ManagedObject::RoleBinding($o) => $body,
            ManagedObject::ClusterRole($o) => $body,
            ManagedObject::ClusterRoleBinding($o) => $body,
            ManagedObject::Ingress($o) => $body,
            ManagedObject::ServiceMonitor($o) => $body,
            ManagedObject::PrometheusRule($o) => $body,
            ManagedObject::Route($o) => $body,
            ManagedObject::GrafanaDatasource($o) => $body,
        }
    };
}

impl ManagedObject {
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        match self {
            ManagedObject::ConfigMap(_) => ResourceKind::ConfigMap,
            ManagedObject::Secret(_) => ResourceKind::Secret,
            ManagedObject::Service(_) => ResourceKind::Service,
            ManagedObject::ServiceAccount(_) => ResourceKind::ServiceAccount,
            ManagedObject::Deployment(_) => ResourceKind::Deployment,
            ManagedObject::StatefulSet(_) => ResourceKind::StatefulSet,
            ManagedObject::Role(_) => ResourceKind::Role,
            ManagedObject::RoleBinding(_) => ResourceKind::RoleBinding,
            ManagedObject::ClusterRole(_) => ResourceKind::ClusterRole,
            ManagedObject::ClusterRoleBinding(_) => ResourceKind::ClusterRoleBinding,
            ManagedObject::Ingress(_) => ResourceKind::Ingress,
            ManagedObject::ServiceMonitor(_) => ResourceKind::ServiceMonitor,
            ManagedObject::PrometheusRule(_) => ResourceKind::PrometheusRule,
            ManagedObject::Route(_) => ResourceKind::Route,
            ManagedObject::GrafanaDatasource(_) => ResourceKind::GrafanaDatasource,
        }
    }

    #[must_use]
    pub fn meta(&self) -> &ObjectMeta {
        with_inner!(self, o => &o.metadata)
    }

    pub fn meta_mut(&mut self) -> &mut ObjectMeta {
        with_inner!(self, o => &mut o.metadata)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.meta().name.as_deref().unwrap_or_default()
    }

    #[must_use]
    pub fn identity(&self) -> ObjectIdentity {
        ObjectIdentity::new(self.kind(), self.meta().namespace.as_deref(), self.name())
    }

    #[must_use]
    pub fn uid(&self) -> Option<ObjectUid> {
        self.meta().uid.clone().map(ObjectUid)
    }

    /// UID of the resource holding the controller reference, if any
    #[must_use]
    pub fn controller_uid(&self) -> Option<&str> {
        self.meta()
            .owner_references
            .as_ref()?
            .iter()
            .find(|r| r.controller == Some(true))
            .map(|r| r.uid.as_str())
    }

    /// True once the API server has persisted the object
    #[must_use]
    pub fn exists(&self) -> bool {
        self.meta().creation_timestamp.is_some()
    }

    /// Build a custom-resource object with the given `spec`
    ///
    /// Returns `None` for kinds that have a typed representation.
    #[must_use]
    pub fn custom(kind: ResourceKind, metadata: ObjectMeta, spec: Value) -> Option<Self> {
        let obj = DynamicObject {
            types: Some(TypeMeta {
                api_version: kind.api_version(),
                kind: kind.as_str().to_string(),
            }),
            metadata,
            data: serde_json::json!({ "spec": spec }),
        };
        match kind {
            ResourceKind::ServiceMonitor => Some(ManagedObject::ServiceMonitor(obj)),
            ResourceKind::PrometheusRule => Some(ManagedObject::PrometheusRule(obj)),
            ResourceKind::Route => Some(ManagedObject::Route(obj)),
            ResourceKind::GrafanaDatasource => Some(ManagedObject::GrafanaDatasource(obj)),
            _ => None,
        }
    }

    /// The inner dynamic object of a custom-resource variant
    #[must_use]
    pub fn as_dynamic(&self) -> Option<&DynamicObject> {
        match self {
            ManagedObject::ServiceMonitor(o)
            | ManagedObject::PrometheusRule(o)
            | ManagedObject::Route(o)
            | ManagedObject::GrafanaDatasource(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_dynamic_mut(&mut self) -> Option<&mut DynamicObject> {
        match self {
            ManagedObject::ServiceMonitor(o)
            | ManagedObject::PrometheusRule(o)
            | ManagedObject::Route(o)
            | ManagedObject::GrafanaDatasource(o) => Some(o),
            _ => None,
        }
    }

    /// Serialize to the wire representation, including `apiVersion`/`kind`
    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        let kind = self.kind();
        let mut value = with_inner!(self, o => serde_json::to_value(o))?;
        if let Some(map) = value.as_object_mut() {
            map.insert("apiVersion".into(), Value::String(kind.api_version()));
            map.insert("kind".into(), Value::String(kind.as_str().to_string()));
        }
        Ok(value)
    }

    /// Convert into a `DynamicObject` for the untyped API
    pub fn to_dynamic(&self) -> Result<DynamicObject, serde_json::Error> {
        serde_json::from_value(self.to_json()?)
    }

    /// Parse an untyped object as the given kind
    pub fn from_dynamic(
        kind: ResourceKind,
        mut obj: DynamicObject,
    ) -> Result<Self, serde_json::Error> {
        // List responses omit apiVersion/kind on items
        obj.types.get_or_insert_with(|| TypeMeta {
            api_version: kind.api_version(),
            kind: kind.as_str().to_string(),
        });
        let value = serde_json::to_value(&obj)?;
        Ok(match kind {
            ResourceKind::ConfigMap => ManagedObject::ConfigMap(serde_json::from_value(value)?),
            ResourceKind::Secret => ManagedObject::Secret(serde_json::from_value(value)?),
            ResourceKind::Service => ManagedObject::Service(serde_json::from_value(value)?),
            ResourceKind::ServiceAccount => {
                ManagedObject::ServiceAccount(serde_json::from_value(value)?)
            }
            ResourceKind::Deployment => ManagedObject::Deployment(serde_json::from_value(value)?),
            ResourceKind::StatefulSet => {
                ManagedObject::StatefulSet(serde_json::from_value(value)?)
            }
            ResourceKind::Role => ManagedObject::Role(serde_json::from_value(value)?),
            ResourceKind::RoleBinding => {
                ManagedObject::RoleBinding(serde_json::from_value(value)?)
            }
            ResourceKind::ClusterRole => {
                ManagedObject::ClusterRole(serde_json::from_value(value)?)
            }
            ResourceKind::ClusterRoleBinding => {
                ManagedObject::ClusterRoleBinding(serde_json::from_value(value)?)
            }
            ResourceKind::Ingress => ManagedObject::Ingress(serde_json::from_value(value)?),
            ResourceKind::ServiceMonitor => ManagedObject::ServiceMonitor(obj),
            ResourceKind::PrometheusRule => ManagedObject::PrometheusRule(obj),
            ResourceKind::Route => ManagedObject::Route(obj),
            ResourceKind::GrafanaDatasource => ManagedObject::GrafanaDatasource(obj),
        })
    }
}

impl PartialEq for ManagedObject {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ManagedObject::ConfigMap(a), ManagedObject::ConfigMap(b)) => a == b,
            (ManagedObject::Secret(a), ManagedObject::Secret(b)) => a == b,
            (ManagedObject::Service(a), ManagedObject::Service(b)) => a == b,
            (ManagedObject::ServiceAccount(a), ManagedObject::ServiceAccount(b)) => a == b,
            (ManagedObject::Deployment(a), ManagedObject::Deployment(b)) => a == b,
            (ManagedObject::StatefulSet(a), ManagedObject::StatefulSet(b)) => a == b,
            (ManagedObject::Role(a), ManagedObject::Role(b)) => a == b,
            (ManagedObject::RoleBinding(a), ManagedObject::RoleBinding(b)) => a == b,
            (ManagedObject::ClusterRole(a), ManagedObject::ClusterRole(b)) => a == b,
            (ManagedObject::ClusterRoleBinding(a), ManagedObject::ClusterRoleBinding(b)) => a == b,
            (ManagedObject::Ingress(a), ManagedObject::Ingress(b)) => a == b,
            (ManagedObject::ServiceMonitor(a), ManagedObject::ServiceMonitor(b))
            | (ManagedObject::PrometheusRule(a), ManagedObject::PrometheusRule(b))
            | (ManagedObject::Route(a), ManagedObject::Route(b))
            | (ManagedObject::GrafanaDatasource(a), ManagedObject::GrafanaDatasource(b)) => {
                a.metadata == b.metadata && a.data == b.data
            }
            _ => false,
        }
    }
}

/// Typed access to one variant of [`ManagedObject`]
pub trait KindObject: Sized {
    const KIND: ResourceKind;

    fn from_object(obj: &ManagedObject) -> Option<&Self>;

    fn from_object_mut(obj: &mut ManagedObject) -> Option<&mut Self>;
}

macro_rules! kind_object {
    ($($ty:ident),* $(,)?) => {
        $(
            impl KindObject for $ty {
                const KIND: ResourceKind = ResourceKind::$ty;

                fn from_object(obj: &ManagedObject) -> Option<&Self> {
                    match obj {
                        ManagedObject::$ty(o) => Some(o),
                        _ => None,
                    }
                }

                fn from_object_mut(obj: &mut ManagedObject) -> Option<&mut Self> {
                    match obj {
                        ManagedObject::$ty(o) => Some(o),
                        _ => None,
                    }
                }
            }

            impl From<$ty> for ManagedObject {
                fn from(o: $ty) -> Self {
                    ManagedObject::$ty(o)
                }
            }
        )*
    };
}

kind_object!(
    ConfigMap,
    Secret,
    Service,
    ServiceAccount,
    Deployment,
    StatefulSet,
    Role,
    RoleBinding,
    ClusterRole,
    ClusterRoleBinding,
    Ingress,
);
