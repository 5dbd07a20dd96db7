//! # Watch Loop
//!
//! Runs a `kube-runtime` controller for one owner kind. The manifest builder turns
//! an owner into its desired objects; the engine does the rest.

use super::error_policy::handle_reconciliation_error;
use crate::controller::{reconcile_owner, ReconcileError, Reconciler};
use crate::crd::ConditionedOwner;
use crate::manifests::{ConfigurationError, ManagedObject};
use futures::StreamExt;
use k8s_openapi::api::apps::v1::{Deployment, StatefulSet};
use k8s_openapi::api::core::v1::{ConfigMap, Service};
use kube::api::Api;
use kube::Client;
use kube_runtime::controller::Action;
use kube_runtime::{watcher, Controller};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Computes the desired objects of an owner
pub type ManifestBuilder<K> =
    Arc<dyn Fn(&K) -> Result<Vec<ManagedObject>, ConfigurationError> + Send + Sync>;

pub struct ControllerContext<K> {
    pub reconciler: Reconciler,
    pub builder: ManifestBuilder<K>,
    /// Cancels in-flight passes and stops the controller
    pub shutdown: CancellationToken,
}

impl<K> std::fmt::Debug for ControllerContext<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerContext")
            .field("reconciler", &self.reconciler)
            .finish_non_exhaustive()
    }
}

async fn reconcile<K: ConditionedOwner>(
    owner: Arc<K>,
    ctx: Arc<ControllerContext<K>>,
) -> Result<Action, ReconcileError> {
    let desired = (ctx.builder)(owner.as_ref());
    reconcile_owner(owner, desired, &ctx.reconciler, &ctx.shutdown).await
}

fn error_policy<K: ConditionedOwner>(
    owner: Arc<K>,
    error: &ReconcileError,
    ctx: Arc<ControllerContext<K>>,
) -> Action {
    handle_reconciliation_error(owner, error, &ctx.reconciler)
}

/// Watch owners of kind `K` cluster-wide until `ctx.shutdown` is cancelled
pub async fn run<K>(client: Client, ctx: Arc<ControllerContext<K>>)
where
    K: ConditionedOwner + DeserializeOwned,
{
    let owners: Api<K> = Api::all(client.clone());
    let shutdown = ctx.shutdown.clone();

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal, stopping controller...");
            signal_token.cancel();
        }
    });

    info!("Starting controller watch loop for {}", K::kind(&()));
    Controller::new(owners, watcher::Config::default().any_semantic())
        .owns(Api::<StatefulSet>::all(client.clone()), watcher::Config::default())
        .owns(Api::<Deployment>::all(client.clone()), watcher::Config::default())
        .owns(Api::<ConfigMap>::all(client.clone()), watcher::Config::default())
        .owns(Api::<Service>::all(client), watcher::Config::default())
        .graceful_shutdown_on(shutdown.cancelled_owned())
        .run(reconcile::<K>, error_policy::<K>, ctx)
        .for_each(|result| {
            match result {
                Ok((obj, _)) => debug!("reconciled {}", obj.name),
                Err(e) => warn!("controller stream error: {}", e),
            }
            futures::future::ready(())
        })
        .await;
    info!("Controller watch loop stopped");
}
