//! # Object Store
//!
//! The engine reaches the cluster only through [`ObjectStore`]: get, create,
//! update, delete and list. Optimistic concurrency is the store's business; a lost
//! race surfaces as [`StoreError::Conflict`] and is retried on the next pass.
//!
//! - [`KubeStore`] talks to the API server through `kube`
//! - [`InMemoryStore`] keeps objects in memory, for tests and dry runs

mod kube_store;
mod memory;

pub use kube_store::KubeStore;
pub use memory::{InMemoryStore, StoreOperation, StoreWrite};

use crate::manifests::{LabelSelector, ManagedObject, ObjectIdentity, ResourceKind};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} already exists")]
    AlreadyExists(ObjectIdentity),
    #[error("{0} not found")]
    NotFound(ObjectIdentity),
    #[error("conflict writing {identity}: {message}")]
    Conflict {
        identity: ObjectIdentity,
        message: String,
    },
    #[error("{identity} rejected: {message}")]
    Rejected {
        identity: ObjectIdentity,
        message: String,
    },
    #[error("failed to list {kind}: {message}")]
    ListFailed { kind: ResourceKind, message: String },
    #[error("Kubernetes API error: {0}")]
    Api(#[from] kube::Error),
    #[error("failed to convert object: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Lost an optimistic-concurrency race
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

/// Cluster API primitives the engine depends on
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch an object; `Ok(None)` when absent
    async fn get(&self, identity: &ObjectIdentity) -> Result<Option<ManagedObject>, StoreError>;

    /// Create an object, returning it as persisted
    async fn create(&self, object: &ManagedObject) -> Result<ManagedObject, StoreError>;

    /// Replace an object, returning it as persisted
    ///
    /// A stale `resourceVersion` fails with [`StoreError::Conflict`].
    async fn update(&self, object: &ManagedObject) -> Result<ManagedObject, StoreError>;

    /// Delete an object; deleting an absent object succeeds
    async fn delete(&self, identity: &ObjectIdentity) -> Result<(), StoreError>;

    /// List objects of `kind` matching `selector`, in `namespace` or cluster-wide
    async fn list(
        &self,
        kind: ResourceKind,
        namespace: Option<&str>,
        selector: &LabelSelector,
    ) -> Result<Vec<ManagedObject>, StoreError>;
}
