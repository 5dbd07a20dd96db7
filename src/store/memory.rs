//! # In-Memory Store
//!
//! [`ObjectStore`] backed by a map. Stamps the fields the API server owns (uid,
//! resourceVersion, creationTimestamp), enforces resourceVersion on update, and
//! journals every write so callers can assert on what a pass actually did.
//! Failures can be injected per operation and object.

use super::{ObjectStore, StoreError};
use crate::manifests::{LabelSelector, ManagedObject, ObjectIdentity, ResourceKind};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    Get,
    Create,
    Update,
    Delete,
}

/// A write that reached the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreWrite {
    pub operation: StoreOperation,
    pub identity: ObjectIdentity,
}

#[derive(Debug, Default)]
struct MemoryState {
    objects: BTreeMap<ObjectIdentity, ManagedObject>,
    resource_version: u64,
    failures: HashMap<(StoreOperation, ObjectIdentity), String>,
    list_failures: HashMap<ResourceKind, String>,
    journal: Vec<StoreWrite>,
}

impl MemoryState {
    fn next_resource_version(&mut self) -> String {
        self.resource_version += 1;
        self.resource_version.to_string()
    }

    fn check_failure(
        &self,
        operation: StoreOperation,
        identity: &ObjectIdentity,
    ) -> Result<(), StoreError> {
        match self.failures.get(&(operation, identity.clone())) {
            Some(message) => Err(StoreError::Rejected {
                identity: identity.clone(),
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    fn record(&mut self, operation: StoreOperation, identity: ObjectIdentity) {
        self.journal.push(StoreWrite {
            operation,
            identity,
        });
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<MemoryState>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.state
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    /// Seed an object as if created out of band, without journaling it
    pub fn insert(&self, object: ManagedObject) -> Result<ManagedObject, StoreError> {
        let mut state = self.lock()?;
        let mut object = object;
        stamp_new(&mut object, state.next_resource_version())?;
        state.objects.insert(object.identity(), object.clone());
        Ok(object)
    }

    /// Make `operation` on `identity` fail with `message` until cleared
    pub fn fail_on(
        &self,
        operation: StoreOperation,
        identity: &ObjectIdentity,
        message: &str,
    ) -> Result<(), StoreError> {
        self.lock()?
            .failures
            .insert((operation, identity.clone()), message.to_string());
        Ok(())
    }

    /// Make listing `kind` fail with `message` until cleared
    pub fn fail_list(&self, kind: ResourceKind, message: &str) -> Result<(), StoreError> {
        self.lock()?.list_failures.insert(kind, message.to_string());
        Ok(())
    }

    pub fn clear_failures(&self) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        state.failures.clear();
        state.list_failures.clear();
        Ok(())
    }

    /// Writes performed since creation or the last [`Self::take_journal`]
    pub fn journal(&self) -> Result<Vec<StoreWrite>, StoreError> {
        Ok(self.lock()?.journal.clone())
    }

    pub fn take_journal(&self) -> Result<Vec<StoreWrite>, StoreError> {
        Ok(std::mem::take(&mut self.lock()?.journal))
    }

    /// Every stored object, ordered by identity
    pub fn objects(&self) -> Result<Vec<ManagedObject>, StoreError> {
        Ok(self.lock()?.objects.values().cloned().collect())
    }

    pub fn contains(&self, identity: &ObjectIdentity) -> Result<bool, StoreError> {
        Ok(self.lock()?.objects.contains_key(identity))
    }
}

fn now() -> Result<Time, StoreError> {
    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    Ok(serde_json::from_value(serde_json::Value::String(timestamp))?)
}

fn stamp_new(object: &mut ManagedObject, resource_version: String) -> Result<(), StoreError> {
    let meta = object.meta_mut();
    meta.uid = Some(uuid::Uuid::new_v4().to_string());
    meta.resource_version = Some(resource_version);
    meta.creation_timestamp = Some(now()?);
    meta.generation = Some(1);
    Ok(())
}

#[async_trait]
impl ObjectStore for InMemoryStore {
    async fn get(&self, identity: &ObjectIdentity) -> Result<Option<ManagedObject>, StoreError> {
        let state = self.lock()?;
        state.check_failure(StoreOperation::Get, identity)?;
        Ok(state.objects.get(identity).cloned())
    }

    async fn create(&self, object: &ManagedObject) -> Result<ManagedObject, StoreError> {
        let identity = object.identity();
        let mut state = self.lock()?;
        state.check_failure(StoreOperation::Create, &identity)?;
        if state.objects.contains_key(&identity) {
            return Err(StoreError::AlreadyExists(identity));
        }

        let mut created = object.clone();
        let resource_version = state.next_resource_version();
        stamp_new(&mut created, resource_version)?;
        state.objects.insert(identity.clone(), created.clone());
        state.record(StoreOperation::Create, identity);
        Ok(created)
    }

    async fn update(&self, object: &ManagedObject) -> Result<ManagedObject, StoreError> {
        let identity = object.identity();
        let mut state = self.lock()?;
        state.check_failure(StoreOperation::Update, &identity)?;
        let Some(stored) = state.objects.get(&identity) else {
            return Err(StoreError::NotFound(identity));
        };

        let stored_meta = stored.meta().clone();
        if let Some(version) = object.meta().resource_version.as_ref() {
            if stored_meta.resource_version.as_ref() != Some(version) {
                return Err(StoreError::Conflict {
                    identity,
                    message: format!(
                        "the object has been modified (resourceVersion {} is stale)",
                        version
                    ),
                });
            }
        }

        let mut updated = object.clone();
        let resource_version = state.next_resource_version();
        let meta = updated.meta_mut();
        meta.uid = stored_meta.uid;
        meta.creation_timestamp = stored_meta.creation_timestamp;
        meta.generation = Some(stored_meta.generation.unwrap_or(0) + 1);
        meta.resource_version = Some(resource_version);
        state.objects.insert(identity.clone(), updated.clone());
        state.record(StoreOperation::Update, identity);
        Ok(updated)
    }

    async fn delete(&self, identity: &ObjectIdentity) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        state.check_failure(StoreOperation::Delete, identity)?;
        if state.objects.remove(identity).is_some() {
            state.record(StoreOperation::Delete, identity.clone());
        }
        Ok(())
    }

    async fn list(
        &self,
        kind: ResourceKind,
        namespace: Option<&str>,
        selector: &LabelSelector,
    ) -> Result<Vec<ManagedObject>, StoreError> {
        let state = self.lock()?;
        if let Some(message) = state.list_failures.get(&kind) {
            return Err(StoreError::ListFailed {
                kind,
                message: message.clone(),
            });
        }
        Ok(state
            .objects
            .iter()
            .filter(|(id, _)| id.kind == kind)
            .filter(|(id, _)| match (namespace, id.namespace.as_deref()) {
                (Some(ns), Some(object_ns)) => ns == object_ns,
                _ => true,
            })
            .filter(|(_, obj)| selector.matches(obj.meta().labels.as_ref()))
            .map(|(_, obj)| obj.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::STACK_APP_NAME;
    use crate::manifests::owner_labels;
    use k8s_openapi::api::core::v1::ConfigMap;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn config_map(name: &str, instance: &str) -> ManagedObject {
        ConfigMap {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some("tracing".to_string()),
                labels: Some(owner_labels(STACK_APP_NAME, instance)),
                ..Default::default()
            },
            ..Default::default()
        }
        .into()
    }

    #[tokio::test]
    async fn test_create_stamps_server_fields() {
        let store = InMemoryStore::new();
        let created = store.create(&config_map("a", "simplest")).await.unwrap();
        assert!(created.exists());
        assert!(created.uid().is_some());
        assert_eq!(created.meta().resource_version.as_deref(), Some("1"));

        let err = store.create(&config_map("a", "simplest")).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_update_rejects_stale_resource_version() {
        let store = InMemoryStore::new();
        let created = store.create(&config_map("a", "simplest")).await.unwrap();
        let updated = store.update(&created).await.unwrap();
        assert_eq!(updated.uid(), created.uid());
        assert_eq!(updated.meta().resource_version.as_deref(), Some("2"));

        let err = store.update(&created).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_delete_absent_is_ok_and_not_journaled() {
        let store = InMemoryStore::new();
        let id = config_map("a", "simplest").identity();
        store.delete(&id).await.unwrap();
        assert!(store.journal().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_filters_by_selector_and_namespace() {
        let store = InMemoryStore::new();
        store.insert(config_map("a", "simplest")).unwrap();
        store.insert(config_map("b", "other")).unwrap();

        let selector = LabelSelector::for_owner(STACK_APP_NAME, "simplest");
        let found = store
            .list(ResourceKind::ConfigMap, Some("tracing"), &selector)
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name(), "a");

        let none = store
            .list(ResourceKind::ConfigMap, Some("elsewhere"), &selector)
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let store = InMemoryStore::new();
        let obj = config_map("a", "simplest");
        store
            .fail_on(StoreOperation::Create, &obj.identity(), "admission webhook denied")
            .unwrap();
        let err = store.create(&obj).await.unwrap_err();
        assert!(err.to_string().contains("admission webhook denied"));

        store.clear_failures().unwrap();
        assert!(store.create(&obj).await.is_ok());
    }
}
