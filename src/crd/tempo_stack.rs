//! # TempoStack
//!
//! Microservices deployment of Tempo: distributor, ingester, querier,
//! query-frontend and compactor as separate workloads.

use super::{ManagementState, TempoStatus};
use serde::{Deserialize, Serialize};

/// TempoStack Custom Resource Definition
///
/// # Example
///
/// ```yaml
/// apiVersion: tempo.grafana.com/v1alpha1
/// kind: TempoStack
/// metadata:
///   name: simplest
///   namespace: tracing
/// spec:
///   storage:
///     secret:
///       name: minio
///       type: s3
///   storageSize: 1Gi
/// ```
#[derive(kube::CustomResource, Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "TempoStack",
    group = "tempo.grafana.com",
    version = "v1alpha1",
    namespaced,
    status = "TempoStatus",
    shortname = "tempo",
    printcolumn = r#"{"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}, {"name":"Management", "type":"string", "jsonPath":".spec.managementState"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct TempoStackSpec {
    #[serde(default)]
    pub management_state: ManagementState,
    pub storage: ObjectStorageSpec,
    /// Size of the ingester WAL volume, e.g. `10Gi`
    #[serde(default)]
    pub storage_size: Option<String>,
    #[serde(default)]
    pub replication_factor: Option<i32>,
    /// Service account the workloads run as; generated when unset
    #[serde(default)]
    pub service_account: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ObjectStorageSpec {
    pub secret: StorageSecret,
}

/// Secret holding object storage credentials
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StorageSecret {
    pub name: String,
    /// `s3`, `azure` or `gcs`
    pub r#type: String,
}
