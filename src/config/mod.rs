//! # Configuration
//!
//! Engine settings loaded from environment variables.

mod engine;

pub use engine::{EngineConfig, FeatureGates, LogFormat};
