//! # Pass Errors
//!
//! Per-object failures are collected, never short-circuited, and collapsed into
//! one aggregate error whose message names every failed object.

use super::prune::PruneReport;
use super::sync::SyncReport;
use crate::manifests::{ConfigurationError, ObjectIdentity, ResourceKind};
use crate::mutate::MutateError;
use crate::status::StatusError;
use crate::store::StoreError;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObjectError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Mutate(#[from] MutateError),
}

/// One object that could not be converged
#[derive(Debug)]
pub struct ObjectFailure {
    pub identity: ObjectIdentity,
    pub error: ObjectError,
}

impl fmt::Display for ObjectFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.identity, self.error)
    }
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Aggregate failure of a sync pass
///
/// Carries the partial report so callers can still see what converged.
#[derive(Debug)]
pub struct SyncError {
    pub failures: Vec<ObjectFailure>,
    /// The pass stopped early on cancellation
    pub cancelled: bool,
    pub report: SyncReport,
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.cancelled {
            write!(
                f,
                "sync cancelled with {} object(s) not attempted",
                self.report.skipped.len()
            )?;
            if !self.failures.is_empty() {
                f.write_str("; ")?;
            }
        }
        if !self.failures.is_empty() {
            write!(
                f,
                "failed to reconcile {} object(s): {}",
                self.failures.len(),
                join(&self.failures)
            )?;
        }
        Ok(())
    }
}

impl std::error::Error for SyncError {}

/// Listing one prunable kind failed
#[derive(Debug)]
pub struct ListFailure {
    pub kind: ResourceKind,
    pub error: StoreError,
}

impl fmt::Display for ListFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listing {}: {}", self.kind, self.error)
    }
}

/// Aggregate failure of a prune pass
#[derive(Debug)]
pub struct PruneError {
    pub list_failures: Vec<ListFailure>,
    pub failures: Vec<ObjectFailure>,
    pub cancelled: bool,
    pub report: PruneReport,
}

impl fmt::Display for PruneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        if self.cancelled {
            parts.push("prune cancelled".to_string());
        }
        if !self.list_failures.is_empty() {
            parts.push(join(&self.list_failures));
        }
        if !self.failures.is_empty() {
            parts.push(format!(
                "failed to delete {} object(s): {}",
                self.failures.len(),
                join(&self.failures)
            ));
        }
        f.write_str(&parts.join("; "))
    }
}

impl std::error::Error for PruneError {}

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("invalid configuration: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error(transparent)]
    Prune(#[from] PruneError),
    #[error("failed to sample component health: {0}")]
    Health(#[source] StoreError),
    #[error(transparent)]
    Status(#[from] StatusError),
}

impl ReconcileError {
    /// Retrying cannot help; wait for the owner to change
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReconcileError::Configuration(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(name: &str, message: &str) -> ObjectFailure {
        let identity = ObjectIdentity::new(ResourceKind::Service, Some("tracing"), name);
        ObjectFailure {
            error: ObjectError::Store(StoreError::Rejected {
                identity: identity.clone(),
                message: message.to_string(),
            }),
            identity,
        }
    }

    #[test]
    fn test_sync_error_lists_every_failure() {
        let err = SyncError {
            failures: vec![failure("a", "denied"), failure("b", "quota exceeded")],
            cancelled: false,
            report: SyncReport::default(),
        };
        let message = err.to_string();
        assert!(message.starts_with("failed to reconcile 2 object(s): Service tracing/a"));
        assert!(message.contains("Service tracing/b"));
        assert!(message.contains("quota exceeded"));
    }

    #[test]
    fn test_cancelled_sync_error() {
        let mut report = SyncReport::default();
        report
            .skipped
            .push(ObjectIdentity::new(ResourceKind::ConfigMap, Some("tracing"), "c"));
        let err = SyncError {
            failures: Vec::new(),
            cancelled: true,
            report,
        };
        assert_eq!(err.to_string(), "sync cancelled with 1 object(s) not attempted");
    }

    #[test]
    fn test_only_configuration_errors_are_terminal() {
        let config = ReconcileError::Configuration(ConfigurationError::new("InvalidStorage", "x"));
        assert!(config.is_terminal());
        let sync = ReconcileError::Sync(SyncError {
            failures: vec![failure("a", "denied")],
            cancelled: false,
            report: SyncReport::default(),
        });
        assert!(!sync.is_terminal());
    }
}
