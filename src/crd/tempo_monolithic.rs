//! # TempoMonolithic
//!
//! Single-binary deployment of Tempo in one StatefulSet.

use super::{ManagementState, TempoStatus};
use serde::{Deserialize, Serialize};

#[derive(kube::CustomResource, Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "TempoMonolithic",
    group = "tempo.grafana.com",
    version = "v1alpha1",
    namespaced,
    status = "TempoStatus",
    shortname = "tempomono",
    printcolumn = r#"{"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct TempoMonolithicSpec {
    #[serde(default)]
    pub management_state: ManagementState,
    #[serde(default)]
    pub storage: Option<MonolithicStorageSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonolithicStorageSpec {
    pub traces: MonolithicTracesStorage,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonolithicTracesStorage {
    /// `memory` or `pv`
    pub backend: String,
    /// Volume size for the `pv` backend
    #[serde(default)]
    pub size: Option<String>,
}
