//! Tempo Operator Reconciliation Engine
//!
//! Converges the objects a Tempo owner resource (`TempoStack`, `TempoMonolithic`)
//! needs toward their desired state and reports the outcome as status conditions.
//!
//! ## Quick Start
//!
//! ```rust
//! use tempo_operator::prelude::*;
//! ```
//!
//! This brings commonly used types and traits into scope. For more specific imports,
//! use the individual modules.

pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod manifests;
pub mod mutate;
pub mod observability;
pub mod prelude;
pub mod runtime;
pub mod status;
pub mod store;
