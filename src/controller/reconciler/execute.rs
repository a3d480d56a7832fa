//! # Execution
//!
//! Carries out a [`Step`]. Actions run in order and the first failure aborts the pass;
//! nothing is rolled back because every action is safe to repeat. An action that cannot
//! complete yet ends the pass early, so later actions (surge removal in particular) never run
//! on top of it.

use super::plan::{PlannedAction, Step};
use super::types::Reconciler;
use super::world::WorldState;
use crate::controller::eviction::restrict_to_nodes;
use crate::crd::SafeEvict;
use crate::error::Result;
use crate::observability;
use k8s_openapi::api::core::v1::Pod;
use tracing::info;

/// How the pass ended, which decides the requeue delay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Fully converged
    Steady,
    /// Work is still in flight
    Progress,
}

/// Apply `step` for `campaign`
///
/// # Errors
///
/// Returns the first failing action's error. A restore that hits a busy pool or a conflicting
/// writer ends the pass with [`Outcome::Progress`] instead.
pub async fn execute(
    ctx: &Reconciler,
    campaign: &SafeEvict,
    world: &WorldState,
    step: Step,
) -> Result<Outcome> {
    match step {
        Step::Steady => {
            ctx.scaling_state.delete(campaign).await?;
            Ok(Outcome::Steady)
        }
        Step::CreateSurge => {
            ctx.surge
                .create(&world.surge_pool, &campaign.spec.base_for_backup_pool_name)
                .await?;
            Ok(Outcome::Progress)
        }
        Step::AwaitSurge(state) => {
            info!(pool = %world.surge_pool, state = %state, "waiting for surge pool");
            Ok(Outcome::Progress)
        }
        Step::Converge(actions) => {
            let mut run = Run {
                ctx,
                campaign,
                world,
                safe_pods: None,
            };
            for action in actions {
                match run.apply(&action).await {
                    Ok(Flow::Continue) => {}
                    Ok(Flow::Defer(reason)) => {
                        info!(action = ?action, reason = %reason, "action deferred to next pass");
                        return Ok(Outcome::Progress);
                    }
                    Err(e) if e.is_precondition() => {
                        info!(action = ?action, reason = %e, "action deferred to next pass");
                        return Ok(Outcome::Progress);
                    }
                    Err(e) => return Err(e),
                }
            }
            Ok(Outcome::Progress)
        }
    }
}

/// Whether the pass may go on after an action
enum Flow {
    Continue,
    Defer(String),
}

struct Run<'a> {
    ctx: &'a Reconciler,
    campaign: &'a SafeEvict,
    world: &'a WorldState,
    /// Idle pods across the cluster, selected at most once per pass
    safe_pods: Option<Vec<Pod>>,
}

impl Run<'_> {
    async fn apply(&mut self, action: &PlannedAction) -> Result<Flow> {
        match action {
            PlannedAction::RecordScaling(snapshot) => {
                self.ctx
                    .scaling_state
                    .create_if_absent(self.campaign, snapshot)
                    .await?;
            }
            PlannedAction::Drain(pool) => self.drain(pool).await?,
            PlannedAction::UpgradeNodeImage(pool) => {
                self.ctx.node_pools.begin_upgrade_node_image(pool).await?;
                observability::metrics::increment_node_image_upgrades();
                info!(pool = %pool, "reconcile.pool.upgrade_triggered");
            }
            PlannedAction::Restore { pool, config } => {
                let restore = self.ctx.scaling_state.set_scaling(pool, *config).await?;
                if !restore.is_done() {
                    // Pool stays cordoned and the record stays put until a restore lands
                    return Ok(Flow::Defer(format!("scaling restore of {pool} conflicted")));
                }
                self.ctx.eviction.cordon(pool, false).await?;
            }
            PlannedAction::DrainSurge => {
                let surge = self.world.surge_pool.clone();
                self.drain(&surge).await?;
            }
            PlannedAction::RemoveSurge => {
                self.ctx.surge.remove(&self.world.surge_pool).await?;
                self.ctx.scaling_state.delete(self.campaign).await?;
            }
        }
        Ok(Flow::Continue)
    }

    async fn drain(&mut self, pool: &str) -> Result<()> {
        self.ctx
            .surge
            .disable_autoscaling(&[pool.to_string()])
            .await?;
        self.ctx.eviction.cordon(pool, true).await?;

        if self.safe_pods.is_none() {
            let pods = self
                .ctx
                .eviction
                .select_safe_to_evict(&self.campaign.spec)
                .await?;
            self.safe_pods = Some(pods);
        }
        let safe_pods = self.safe_pods.as_deref().unwrap_or_default();
        let nodes = self
            .world
            .pool_nodes
            .get(pool)
            .cloned()
            .unwrap_or_default();
        let pods = restrict_to_nodes(safe_pods, &nodes);
        let evicted = self.ctx.eviction.evict(&pods).await?;
        if evicted > 0 {
            info!(pool = pool, pods = evicted, "reconcile.pool.drained");
        }
        Ok(())
    }
}
