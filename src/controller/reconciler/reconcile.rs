//! # Reconcile Entrypoint
//!
//! Called by the controller runtime for each `SafeEvict`, never concurrently for the same
//! resource.

use super::execute::{execute, Outcome};
use super::plan::{plan, Step};
use super::types::Reconciler;
use super::world::observe;
use crate::controller::validation;
use crate::crd::SafeEvict;
use crate::error::{Error, Result};
use crate::observability;
use kube::ResourceExt;
use kube_runtime::controller::Action;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, info_span, Instrument};

/// Reconcile one campaign and decide when to look at it again
///
/// # Errors
///
/// Any failure is returned to the runtime, whose error policy requeues with the error delay.
pub async fn reconcile(campaign: Arc<SafeEvict>, ctx: Arc<Reconciler>) -> Result<Action> {
    let span = info_span!(
        "reconcile",
        resource.name = %campaign.name_any(),
        resource.namespace = %campaign.campaign_namespace(),
    );

    async move {
        let start = Instant::now();
        observability::metrics::increment_reconciliations();

        validation::validate(&campaign.spec)?;

        let outcome = tokio::time::timeout(
            ctx.config.reconcile_timeout(),
            reconcile_once(&campaign, &ctx),
        )
        .await
        .map_err(|elapsed| Error::transport("reconcile", elapsed))??;

        observability::metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());

        let (delay, reason) = match outcome {
            Outcome::Steady => (ctx.config.steady_state_requeue(), "steady-state"),
            Outcome::Progress => (ctx.config.progress_requeue(), "progress"),
        };
        observability::metrics::increment_requeues_total(reason);
        info!(
            requeue_secs = delay.as_secs(),
            reason = reason,
            "reconcile.complete"
        );
        Ok(Action::requeue(delay))
    }
    .instrument(span)
    .await
}

async fn reconcile_once(campaign: &SafeEvict, ctx: &Reconciler) -> Result<Outcome> {
    let world = observe(ctx, campaign).await?;
    observability::metrics::set_outdated_pools(
        i64::try_from(world.outdated.pools.len()).unwrap_or(i64::MAX),
    );

    let step = plan(&world)?;
    match &step {
        Step::Steady => info!("campaign is steady"),
        Step::CreateSurge => info!(
            pool = %world.surge_pool,
            outdated = ?world.outdated.pools.keys().collect::<Vec<_>>(),
            "creating surge pool"
        ),
        Step::AwaitSurge(_) => {}
        Step::Converge(actions) => info!(actions = actions.len(), "converging"),
    }

    execute(ctx, campaign, &world, step).await
}
