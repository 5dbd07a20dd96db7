//! # Prelude
//!
//! Re-exports the types most callers need.
//!
//! ```rust
//! use tempo_operator::prelude::*;
//! ```

// Owner resources
pub use crate::crd::*;

// Resource model
pub use crate::manifests::{
    ConfigurationError, LabelSelector, ManagedObject, ObjectIdentity, ObjectUid, ResourceKind,
};

// Engine
pub use crate::controller::{
    reconcile_owner, ReconcileError, Reconciler, SyncError, SyncOutcome, SyncReport,
};
pub use crate::mutate::{MergeRegistry, MutateError, Mutator};
pub use crate::status::{Condition, ConditionStatus, ConditionType, StatusWriter};
pub use crate::store::{ObjectStore, StoreError};

// Config
pub use crate::config::{EngineConfig, FeatureGates};
