//! # Initialization
//!
//! Process-level setup before a controller runs: rustls crypto provider, logging,
//! metrics, the Kubernetes client and the shared reconciler.

use crate::config::EngineConfig;
use crate::controller::Reconciler;
use crate::observability;
use anyhow::{Context, Result};
use kube::Client;
use tracing::{debug, info};

/// Install the ring crypto provider for rustls
///
/// A provider installed earlier in the process is kept.
pub fn install_crypto_provider() {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }
}

/// Set up the process and build a reconciler against the cluster
pub async fn initialize(config: EngineConfig) -> Result<Reconciler> {
    install_crypto_provider();
    observability::init(&config)?;

    info!(
        field_manager = %config.field_manager,
        prunable_kinds = ?config.features.prunable_kinds(),
        "Initializing tempo operator engine"
    );

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;
    Reconciler::for_client(client, config).context("Failed to build merge policy registry")
}
