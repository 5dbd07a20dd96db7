//! # Runtime
//!
//! Wires the engine into a `kube-runtime` controller.
//!
//! - `initialization`: process setup and the shared reconciler
//! - `error_policy`: maps a failed pass to the next requeue
//! - `watch_loop`: watches one owner kind and its children

pub mod error_policy;
pub mod initialization;
pub mod watch_loop;

pub use error_policy::handle_reconciliation_error;
pub use initialization::initialize;
pub use watch_loop::{run, ControllerContext, ManifestBuilder};
