//! # Custom Resource Definitions
//!
//! Owner resources the engine reconciles on behalf of.
//!
//! ## Module Structure
//!
//! - `tempo_stack.rs` - `TempoStack`, the microservices deployment
//! - `tempo_monolithic.rs` - `TempoMonolithic`, the single-binary deployment
//! - `status.rs` - status shared by both owners

mod status;
mod tempo_monolithic;
mod tempo_stack;

pub use status::{ManagementState, TempoStatus};
pub use tempo_monolithic::{
    MonolithicStorageSpec, MonolithicTracesStorage, TempoMonolithic, TempoMonolithicSpec,
};
pub use tempo_stack::{ObjectStorageSpec, StorageSecret, TempoStack, TempoStackSpec};

use crate::constants::{MONOLITHIC_APP_NAME, STACK_APP_NAME};
use crate::manifests::{LabelSelector, ManagedObject};
use crate::status::Condition;
use kube::Resource;
use std::fmt;

/// An owner whose status carries engine-managed conditions
pub trait ConditionedOwner:
    Resource<DynamicType = ()> + Clone + fmt::Debug + Send + Sync + 'static
{
    /// `app.kubernetes.io/name` on every object created for this owner kind
    const APP_NAME: &'static str;

    fn management_state(&self) -> ManagementState;

    fn owner_status(&self) -> Option<&TempoStatus>;

    fn conditions(&self) -> &[Condition] {
        self.owner_status()
            .map(|s| s.conditions.as_slice())
            .unwrap_or_default()
    }

    /// Selector matching every object created for this owner
    fn owned_selector(&self) -> LabelSelector {
        LabelSelector::for_owner(
            Self::APP_NAME,
            self.meta().name.as_deref().unwrap_or_default(),
        )
    }

    /// True unless `object` is controlled by some other resource
    ///
    /// Objects without a controller reference (cluster-scoped kinds) are judged by
    /// labels alone.
    fn controls(&self, object: &ManagedObject) -> bool {
        match object.controller_uid() {
            Some(uid) => self.meta().uid.as_deref() == Some(uid),
            None => true,
        }
    }
}

impl ConditionedOwner for TempoStack {
    const APP_NAME: &'static str = STACK_APP_NAME;

    fn management_state(&self) -> ManagementState {
        self.spec.management_state
    }

    fn owner_status(&self) -> Option<&TempoStatus> {
        self.status.as_ref()
    }
}

impl ConditionedOwner for TempoMonolithic {
    const APP_NAME: &'static str = MONOLITHIC_APP_NAME;

    fn management_state(&self) -> ManagementState {
        self.spec.management_state
    }

    fn owner_status(&self) -> Option<&TempoStatus> {
        self.status.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::LABEL_NAME;
    use k8s_openapi::api::networking::v1::Ingress;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};

    fn stack() -> TempoStack {
        let mut stack = TempoStack::new(
            "simplest",
            TempoStackSpec {
                management_state: ManagementState::Managed,
                storage: ObjectStorageSpec::default(),
                storage_size: None,
                replication_factor: None,
                service_account: None,
            },
        );
        stack.metadata.uid = Some("stack-uid".to_string());
        stack
    }

    fn controlled_by(uid: Option<&str>) -> ManagedObject {
        Ingress {
            metadata: ObjectMeta {
                name: Some("tempo-simplest-jaegerui".to_string()),
                owner_references: uid.map(|uid| {
                    vec![OwnerReference {
                        api_version: "tempo.grafana.com/v1alpha1".to_string(),
                        kind: "TempoStack".to_string(),
                        name: "simplest".to_string(),
                        uid: uid.to_string(),
                        controller: Some(true),
                        block_owner_deletion: Some(true),
                    }]
                }),
                ..Default::default()
            },
            ..Default::default()
        }
        .into()
    }

    #[test]
    fn test_owner_kinds_select_disjoint_objects() {
        let mono = TempoMonolithic::new("simplest", TempoMonolithicSpec::default());
        assert_eq!(app_name_of(&stack().owned_selector()), "tempo");
        assert_eq!(app_name_of(&mono.owned_selector()), "tempo-monolithic");
        assert_ne!(stack().owned_selector(), mono.owned_selector());
    }

    fn app_name_of(selector: &LabelSelector) -> String {
        let query = selector.to_query();
        query
            .split(',')
            .find_map(|pair| pair.strip_prefix(&format!("{LABEL_NAME}=")))
            .unwrap_or_default()
            .to_string()
    }

    #[test]
    fn test_controls_checks_controller_uid() {
        let stack = stack();
        assert!(stack.controls(&controlled_by(Some("stack-uid"))));
        assert!(!stack.controls(&controlled_by(Some("monolithic-uid"))));
        assert!(stack.controls(&controlled_by(None)));
    }
}
