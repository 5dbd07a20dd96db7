//! # Kubernetes Store
//!
//! [`ObjectStore`] over the Kubernetes API. Every kind goes through
//! `Api<DynamicObject>` built from the kind's discovery information, and is
//! converted to and from its typed form at the boundary.

use super::{ObjectStore, StoreError};
use crate::manifests::{LabelSelector, ManagedObject, ObjectIdentity, ResourceKind};
use async_trait::async_trait;
use kube::api::{Api, DeleteParams, DynamicObject, ListParams, PostParams};
use kube::Client;
use tracing::debug;

#[derive(Clone)]
pub struct KubeStore {
    client: Client,
    field_manager: String,
}

impl std::fmt::Debug for KubeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeStore")
            .field("field_manager", &self.field_manager)
            .finish_non_exhaustive()
    }
}

impl KubeStore {
    #[must_use]
    pub fn new(client: Client, field_manager: &str) -> Self {
        Self {
            client,
            field_manager: field_manager.to_string(),
        }
    }

    fn api(&self, kind: ResourceKind, namespace: Option<&str>) -> Api<DynamicObject> {
        let ar = kind.api_resource();
        match namespace {
            Some(ns) if kind.is_namespaced() => Api::namespaced_with(self.client.clone(), ns, &ar),
            _ => Api::all_with(self.client.clone(), &ar),
        }
    }

    fn post_params(&self) -> PostParams {
        PostParams {
            field_manager: Some(self.field_manager.clone()),
            ..Default::default()
        }
    }
}

#[async_trait]
impl ObjectStore for KubeStore {
    async fn get(&self, identity: &ObjectIdentity) -> Result<Option<ManagedObject>, StoreError> {
        let api = self.api(identity.kind, identity.namespace.as_deref());
        match api.get_opt(&identity.name).await? {
            Some(obj) => Ok(Some(ManagedObject::from_dynamic(identity.kind, obj)?)),
            None => Ok(None),
        }
    }

    async fn create(&self, object: &ManagedObject) -> Result<ManagedObject, StoreError> {
        let identity = object.identity();
        let api = self.api(identity.kind, identity.namespace.as_deref());
        let dynamic = object.to_dynamic()?;
        match api.create(&self.post_params(), &dynamic).await {
            Ok(created) => Ok(ManagedObject::from_dynamic(identity.kind, created)?),
            Err(kube::Error::Api(response)) if response.code == 409 => {
                Err(StoreError::AlreadyExists(identity))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update(&self, object: &ManagedObject) -> Result<ManagedObject, StoreError> {
        let identity = object.identity();
        let api = self.api(identity.kind, identity.namespace.as_deref());
        let dynamic = object.to_dynamic()?;
        match api.replace(&identity.name, &self.post_params(), &dynamic).await {
            Ok(updated) => Ok(ManagedObject::from_dynamic(identity.kind, updated)?),
            Err(kube::Error::Api(response)) if response.code == 409 => Err(StoreError::Conflict {
                identity,
                message: response.message.clone(),
            }),
            Err(kube::Error::Api(response)) if response.code == 404 => {
                Err(StoreError::NotFound(identity))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, identity: &ObjectIdentity) -> Result<(), StoreError> {
        let api = self.api(identity.kind, identity.namespace.as_deref());
        match api.delete(&identity.name, &DeleteParams::background()).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(response)) if response.code == 404 => {
                debug!("{} already gone", identity);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list(
        &self,
        kind: ResourceKind,
        namespace: Option<&str>,
        selector: &LabelSelector,
    ) -> Result<Vec<ManagedObject>, StoreError> {
        let api = self.api(kind, namespace);
        let params = ListParams::default().labels(&selector.to_query());
        let list = api.list(&params).await?;
        list.items
            .into_iter()
            .map(|obj| ManagedObject::from_dynamic(kind, obj).map_err(StoreError::from))
            .collect()
    }
}
