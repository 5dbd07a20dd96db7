//! # Controller
//!
//! The reconciliation engine proper.
//!
//! - `sync`: get-or-create-or-update over the desired set
//! - `prune`: delete owned objects of conditional kinds that are no longer desired
//! - `reconcile`: one full pass for an owner, ending in a status refresh
//! - `backoff`: retry delays for failed passes

pub mod backoff;
mod error;
mod prune;
mod reconcile;
mod sync;

pub use backoff::{BackoffState, FibonacciBackoff};
pub use error::{
    ListFailure, ObjectError, ObjectFailure, PruneError, ReconcileError, SyncError,
};
pub use prune::PruneReport;
pub use reconcile::reconcile_owner;
pub use sync::{ObjectRecord, SyncOutcome, SyncReport};

use crate::config::EngineConfig;
use crate::manifests::ResourceKind;
use crate::mutate::{MergeRegistry, Mutator, RegistryError};
use crate::status::{KubeStatusWriter, StatusWriter};
use crate::store::{KubeStore, ObjectStore};
use kube::{Client, Resource};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::warn;

/// Shared context for every reconciliation
#[derive(Clone)]
pub struct Reconciler {
    pub store: Arc<dyn ObjectStore>,
    pub status: Arc<dyn StatusWriter>,
    pub mutator: Mutator,
    pub config: Arc<EngineConfig>,
    // Keyed by owner namespace/name; touched only from error_policy and after clean passes
    pub backoff_states: Arc<Mutex<HashMap<String, BackoffState>>>,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("mutator", &self.mutator)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    #[must_use]
    pub fn new(
        store: Arc<dyn ObjectStore>,
        status: Arc<dyn StatusWriter>,
        registry: Arc<MergeRegistry>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            status,
            mutator: Mutator::new(registry),
            config: Arc::new(config),
            backoff_states: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Reconciler talking to the cluster, with policies verified for every kind
    pub fn for_client(client: Client, config: EngineConfig) -> Result<Self, RegistryError> {
        let registry = MergeRegistry::for_kinds(&ResourceKind::ALL)?;
        Ok(Self::new(
            Arc::new(KubeStore::new(client.clone(), &config.field_manager)),
            Arc::new(KubeStatusWriter::new(client)),
            Arc::new(registry),
            config,
        ))
    }

    /// Forget the backoff history of an owner after a clean pass
    pub fn reset_backoff(&self, owner_key: &str) {
        match self.backoff_states.lock() {
            Ok(mut states) => {
                if let Some(state) = states.get_mut(owner_key) {
                    state.reset();
                }
            }
            Err(e) => warn!("Failed to lock backoff_states: {}", e),
        }
    }
}

/// `namespace/name` of an owner, used as the backoff key and in spans
pub(crate) fn owner_key<K: Resource>(owner: &K) -> String {
    let meta = owner.meta();
    format!(
        "{}/{}",
        meta.namespace.as_deref().unwrap_or_default(),
        meta.name.as_deref().unwrap_or_default()
    )
}
