//! # Resource Kinds
//!
//! The closed set of kinds the engine manages, and the identities used to key them.

use kube::core::GroupVersionKind;
use kube::discovery::ApiResource;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Concrete kind of a managed object
///
/// Each kind maps to exactly one merge policy in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
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
    ServiceMonitor,
    PrometheusRule,
    Route,
    GrafanaDatasource,
}

impl ResourceKind {
    /// Every kind the engine knows about
    pub const ALL: [ResourceKind; 15] = [
        ResourceKind::ConfigMap,
        ResourceKind::Secret,
        ResourceKind::Service,
        ResourceKind::ServiceAccount,
        ResourceKind::Deployment,
        ResourceKind::StatefulSet,
        ResourceKind::Role,
        ResourceKind::RoleBinding,
        ResourceKind::ClusterRole,
        ResourceKind::ClusterRoleBinding,
        ResourceKind::Ingress,
        ResourceKind::ServiceMonitor,
        ResourceKind::PrometheusRule,
        ResourceKind::Route,
        ResourceKind::GrafanaDatasource,
    ];

    /// Kind name as the API server spells it
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::ConfigMap => "ConfigMap",
            ResourceKind::Secret => "Secret",
            ResourceKind::Service => "Service",
            ResourceKind::ServiceAccount => "ServiceAccount",
            ResourceKind::Deployment => "Deployment",
            ResourceKind::StatefulSet => "StatefulSet",
            ResourceKind::Role => "Role",
            ResourceKind::RoleBinding => "RoleBinding",
            ResourceKind::ClusterRole => "ClusterRole",
            ResourceKind::ClusterRoleBinding => "ClusterRoleBinding",
            ResourceKind::Ingress => "Ingress",
            ResourceKind::ServiceMonitor => "ServiceMonitor",
            ResourceKind::PrometheusRule => "PrometheusRule",
            ResourceKind::Route => "Route",
            ResourceKind::GrafanaDatasource => "GrafanaDatasource",
        }
    }

    /// API group and version
    #[must_use]
    pub fn group_version(&self) -> (&'static str, &'static str) {
        match self {
            ResourceKind::ConfigMap
            | ResourceKind::Secret
            | ResourceKind::Service
            | ResourceKind::ServiceAccount => ("", "v1"),
            ResourceKind::Deployment | ResourceKind::StatefulSet => ("apps", "v1"),
            ResourceKind::Role
            | ResourceKind::RoleBinding
            | ResourceKind::ClusterRole
            | ResourceKind::ClusterRoleBinding => ("rbac.authorization.k8s.io", "v1"),
            ResourceKind::Ingress => ("networking.k8s.io", "v1"),
            ResourceKind::ServiceMonitor | ResourceKind::PrometheusRule => {
                ("monitoring.coreos.com", "v1")
            }
            ResourceKind::Route => ("route.openshift.io", "v1"),
            ResourceKind::GrafanaDatasource => ("grafana.integreatly.org", "v1beta1"),
        }
    }

    /// `apiVersion` string, e.g. `apps/v1` or `v1`
    #[must_use]
    pub fn api_version(&self) -> String {
        match self.group_version() {
            ("", version) => version.to_string(),
            (group, version) => format!("{group}/{version}"),
        }
    }

    /// Lowercase plural resource name used in API paths
    #[must_use]
    pub fn plural(&self) -> &'static str {
        match self {
            ResourceKind::ConfigMap => "configmaps",
            ResourceKind::Secret => "secrets",
            ResourceKind::Service => "services",
            ResourceKind::ServiceAccount => "serviceaccounts",
            ResourceKind::Deployment => "deployments",
            ResourceKind::StatefulSet => "statefulsets",
            ResourceKind::Role => "roles",
            ResourceKind::RoleBinding => "rolebindings",
            ResourceKind::ClusterRole => "clusterroles",
            ResourceKind::ClusterRoleBinding => "clusterrolebindings",
            ResourceKind::Ingress => "ingresses",
            ResourceKind::ServiceMonitor => "servicemonitors",
            ResourceKind::PrometheusRule => "prometheusrules",
            ResourceKind::Route => "routes",
            ResourceKind::GrafanaDatasource => "grafanadatasources",
        }
    }

    /// Cluster-scoped kinds cannot carry a namespaced controller reference
    #[must_use]
    pub fn is_namespaced(&self) -> bool {
        !matches!(
            self,
            ResourceKind::ClusterRole | ResourceKind::ClusterRoleBinding
        )
    }

    /// Kinds without a typed `k8s-openapi` representation
    #[must_use]
    pub fn is_custom(&self) -> bool {
        matches!(
            self,
            ResourceKind::ServiceMonitor
                | ResourceKind::PrometheusRule
                | ResourceKind::Route
                | ResourceKind::GrafanaDatasource
        )
    }

    /// Discovery information for building a dynamic `Api`
    #[must_use]
    pub fn api_resource(&self) -> ApiResource {
        let (group, version) = self.group_version();
        let gvk = GroupVersionKind::gvk(group, version, self.as_str());
        ApiResource::from_gvk_with_plural(&gvk, self.plural())
    }

    /// Resolve a kind from an object's `apiVersion` and `kind`
    #[must_use]
    pub fn from_type_meta(api_version: &str, kind: &str) -> Option<Self> {
        ResourceKind::ALL
            .into_iter()
            .find(|k| k.as_str() == kind && k.api_version() == api_version)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of an object within one reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectIdentity {
    pub kind: ResourceKind,
    /// `None` for cluster-scoped kinds
    pub namespace: Option<String>,
    pub name: String,
}

impl ObjectIdentity {
    #[must_use]
    pub fn new(kind: ResourceKind, namespace: Option<&str>, name: &str) -> Self {
        Self {
            kind,
            namespace: if kind.is_namespaced() {
                namespace.map(str::to_string)
            } else {
                None
            },
            name: name.to_string(),
        }
    }
}

impl fmt::Display for ObjectIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{} {}/{}", self.kind, ns, self.name),
            None => write!(f, "{} {}", self.kind, self.name),
        }
    }
}

/// Cluster-unique object UID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectUid(pub String);

impl fmt::Display for ObjectUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
