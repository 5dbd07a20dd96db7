//! # Owner Status
//!
//! Status subresource shared by the Tempo owner resources.

use crate::status::Condition;
use serde::{Deserialize, Serialize};

/// Whether the operator reconciles the owner at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, schemars::JsonSchema)]
pub enum ManagementState {
    #[default]
    Managed,
    /// Left alone; objects are neither written nor pruned
    Unmanaged,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TempoStatus {
    /// Conditions in first-seen order
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Generation the conditions were computed for
    #[serde(default)]
    pub observed_generation: Option<i64>,
}
