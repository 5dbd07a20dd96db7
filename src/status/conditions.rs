//! # Conditions
//!
//! Ordered status conditions with transition-time bookkeeping.
//!
//! - A condition type is the identity key; its position is fixed when first seen.
//! - `lastTransitionTime` moves only when `(status, reason)` changes.
//! - The message may refresh without counting as a transition.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const REASON_READY: &str = "Ready";
pub const REASON_PENDING_COMPONENTS: &str = "PendingComponents";
pub const REASON_DEGRADED: &str = "Degraded";
pub const REASON_NO_DEGRADED_COMPONENTS: &str = "NoDegradedComponents";
pub const REASON_FAILED_RECONCILIATION: &str = "FailedReconciliation";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

impl From<bool> for ConditionStatus {
    fn from(value: bool) -> Self {
        if value {
            ConditionStatus::True
        } else {
            ConditionStatus::False
        }
    }
}

/// Condition types the engine writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionType {
    Ready,
    Degraded,
    Failed,
    ConfigurationError,
}

impl ConditionType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionType::Ready => "Ready",
            ConditionType::Degraded => "Degraded",
            ConditionType::Failed => "Failed",
            ConditionType::ConfigurationError => "ConfigurationError",
        }
    }
}

impl fmt::Display for ConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Condition represents one observation about the owner
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition
    pub r#type: String,
    /// Status of the condition (True, False, Unknown)
    pub status: ConditionStatus,
    /// Machine-readable reason for the last transition
    #[serde(default)]
    pub reason: String,
    /// Human-readable details
    #[serde(default)]
    pub message: String,
    /// Last time `(status, reason)` changed (RFC3339)
    #[serde(default)]
    pub last_transition_time: Option<String>,
}

impl Condition {
    #[must_use]
    pub fn new(
        condition_type: ConditionType,
        status: impl Into<ConditionStatus>,
        reason: &str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            r#type: condition_type.as_str().to_string(),
            status: status.into(),
            reason: reason.to_string(),
            message: message.into(),
            last_transition_time: None,
        }
    }

    #[must_use]
    pub fn is_true(&self) -> bool {
        self.status == ConditionStatus::True
    }
}

/// Find a condition by type
#[must_use]
pub fn find_condition<'a>(
    conditions: &'a [Condition],
    condition_type: ConditionType,
) -> Option<&'a Condition> {
    conditions
        .iter()
        .find(|c| c.r#type == condition_type.as_str())
}

/// Fold `new` into `existing` using the current time
#[must_use]
pub fn update_condition(existing: &[Condition], new: Condition) -> Vec<Condition> {
    update_condition_at(existing, new, Utc::now())
}

/// Fold `new` into `existing`, stamping transitions with `now`
#[must_use]
pub fn update_condition_at(
    existing: &[Condition],
    new: Condition,
    now: DateTime<Utc>,
) -> Vec<Condition> {
    let now = now.to_rfc3339_opts(SecondsFormat::Secs, true);
    let mut conditions = existing.to_vec();

    match conditions.iter_mut().find(|c| c.r#type == new.r#type) {
        Some(current) if current.status == new.status && current.reason == new.reason => {
            current.message = new.message;
        }
        Some(current) => {
            current.status = new.status;
            current.reason = new.reason;
            current.message = new.message;
            current.last_transition_time = Some(now);
        }
        None => conditions.push(Condition {
            last_transition_time: Some(now),
            ..new
        }),
    }
    conditions
}
