//! # Manifests
//!
//! The resource model the engine reconciles: kinds, identities, tagged objects and
//! the ownership labels that tie objects to their owner.
//!
//! Manifests are produced by per-component builders outside this crate; the engine
//! only consumes them.

mod kind;
pub mod labels;
mod object;

pub use kind::{ObjectIdentity, ObjectUid, ResourceKind};
pub use labels::{component_labels, owner_labels, LabelSelector};
pub use object::{KindObject, ManagedObject};

use thiserror::Error;

/// The manifest builder rejected the owner's configuration
///
/// Retrying cannot fix it; the owner has to be edited.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}: {message}")]
pub struct ConfigurationError {
    /// Condition reason, e.g. `InvalidStorageConfig`
    pub reason: String,
    pub message: String,
}

impl ConfigurationError {
    #[must_use]
    pub fn new(reason: &str, message: impl Into<String>) -> Self {
        Self {
            reason: reason.to_string(),
            message: message.into(),
        }
    }
}
