//! # Watch Loop
//!
//! Runs the kube-runtime controller over `SafeEvict` resources. The runtime serializes
//! reconciles per resource, so the reconciler needs no locking of its own.

use crate::controller::reconciler::{reconcile, Reconciler};
use crate::controller::server::ServerState;
use crate::crd::SafeEvict;
use crate::runtime::error_policy::handle_reconciliation_error;
use anyhow::Result;
use futures::StreamExt;
use kube::api::Api;
use kube_runtime::{watcher, Controller};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Run the controller until SIGTERM or ctrl-c
///
/// # Errors
///
/// Currently always succeeds; per-object failures are handled by the error policy.
pub async fn run_watch_loop(
    campaigns: Api<SafeEvict>,
    reconciler: Arc<Reconciler>,
    server_state: Arc<ServerState>,
) -> Result<()> {
    info!("Starting SafeEvict controller");

    Controller::new(campaigns, watcher::Config::default())
        .shutdown_on_signal()
        .run(reconcile, handle_reconciliation_error, reconciler)
        .for_each(|result| async move {
            match result {
                Ok((object, action)) => {
                    debug!(resource.name = %object.name, action = ?action, "reconciled");
                }
                Err(e) => warn!(error = %e, "controller.watch.error"),
            }
        })
        .await;

    server_state.is_ready.store(false, Ordering::Relaxed);
    info!("Controller stopped");
    Ok(())
}
