//! # Observability
//!
//! - `metrics`: Prometheus metrics for the engine
//! - `init_tracing`: structured log subscriber setup

pub mod metrics;

pub use metrics::register_metrics;

use crate::config::{EngineConfig, LogFormat};
use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber
///
/// `RUST_LOG` wins when set; otherwise the configured log level applies.
pub fn init_tracing(config: &EngineConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.to_lowercase()))?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let installed = match config.log_format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };
    installed.map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))
}

/// Set up logging and, when enabled, metrics
pub fn init(config: &EngineConfig) -> Result<()> {
    init_tracing(config)?;
    if config.enable_metrics {
        register_metrics()?;
    }
    Ok(())
}
