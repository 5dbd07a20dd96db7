//! # Ownership Labels
//!
//! Every object the operator creates carries the owner's label set. The pruner
//! and the health sampler find owned objects through it.
//!
//! `app.kubernetes.io/name` differs per owner kind, so a `TempoStack` and a
//! `TempoMonolithic` sharing a name never select each other's objects.

use crate::constants::{
    LABEL_COMPONENT, LABEL_INSTANCE, LABEL_MANAGED_BY, LABEL_NAME, MANAGED_BY_VALUE,
};
use std::collections::BTreeMap;

/// Labels shared by every object created for the instance
///
/// `app` is the owner kind's application name, see [`crate::constants::STACK_APP_NAME`].
#[must_use]
pub fn owner_labels(app: &str, instance: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        (LABEL_NAME.to_string(), app.to_string()),
        (LABEL_INSTANCE.to_string(), instance.to_string()),
        (LABEL_MANAGED_BY.to_string(), MANAGED_BY_VALUE.to_string()),
    ])
}

/// Owner labels plus the component label
#[must_use]
pub fn component_labels(app: &str, instance: &str, component: &str) -> BTreeMap<String, String> {
    let mut labels = owner_labels(app, instance);
    labels.insert(LABEL_COMPONENT.to_string(), component.to_string());
    labels
}

/// Equality-based label selector
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LabelSelector {
    match_labels: BTreeMap<String, String>,
}

impl LabelSelector {
    #[must_use]
    pub fn new(match_labels: BTreeMap<String, String>) -> Self {
        Self { match_labels }
    }

    /// Selector matching everything owned by the instance
    #[must_use]
    pub fn for_owner(app: &str, instance: &str) -> Self {
        Self::new(owner_labels(app, instance))
    }

    /// Selector string in API query form, `k1=v1,k2=v2`
    #[must_use]
    pub fn to_query(&self) -> String {
        self.match_labels
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// True when every selector pair is present in `labels`
    #[must_use]
    pub fn matches(&self, labels: Option<&BTreeMap<String, String>>) -> bool {
        self.match_labels.iter().all(|(k, v)| {
            labels
                .and_then(|l| l.get(k))
                .is_some_and(|actual| actual == v)
        })
    }
}
