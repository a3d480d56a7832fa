//! # Observation
//!
//! Everything one pass needs to know, read up front.

use super::types::Reconciler;
use crate::controller::inventory::{guarded_pods_on, NodeInventory};
use crate::controller::scaling_state::ScalingSnapshot;
use crate::controller::staleness::Outdated;
use crate::crd::SafeEvict;
use crate::error::Result;
use crate::provider::ProvisioningState;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Snapshot of the campaign's world
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorldState {
    /// Stale and busy pools, and the nodes of the stale ones
    pub outdated: Outdated,
    /// Pools running an image older than the latest one
    pub stale_pools: BTreeSet<String>,
    /// Provisioning state of every monitored pool
    pub pool_states: BTreeMap<String, ProvisioningState>,
    /// Node names per monitored pool and per surge pool
    pub pool_nodes: BTreeMap<String, BTreeSet<String>>,
    /// Running guarded pods per pool; only observed once the surge pool exists
    pub guarded_pods: BTreeMap<String, usize>,
    pub surge_pool: String,
    /// `None` when the surge pool does not exist
    pub surge: Option<ProvisioningState>,
    pub scaling_record: Option<ScalingSnapshot>,
}

impl WorldState {
    /// No guarded pod runs on the pool; an unobserved pool is never clear
    pub fn is_clear(&self, pool: &str) -> bool {
        self.guarded_pods.get(pool) == Some(&0)
    }

    pub fn state_of(&self, pool: &str) -> ProvisioningState {
        self.pool_states
            .get(pool)
            .cloned()
            .unwrap_or(ProvisioningState::Succeeded)
    }
}

/// Read the world for `campaign`
///
/// # Errors
///
/// Any failed read fails the observation; nothing has been changed yet.
pub async fn observe(ctx: &Reconciler, campaign: &SafeEvict) -> Result<WorldState> {
    let spec = &campaign.spec;
    let inventory = NodeInventory::from_nodes(&ctx.cluster.list_nodes().await?);

    let mut outdated = ctx
        .staleness
        .compute_outdated(&spec.nodepools, &inventory)
        .await?;
    let stale_pools: BTreeSet<String> = outdated.pools.keys().cloned().collect();

    let not_ready = ctx.staleness.not_ready(&spec.nodepools).await?;
    let mut pool_states: BTreeMap<String, ProvisioningState> = spec
        .nodepools
        .iter()
        .map(|pool| (pool.clone(), ProvisioningState::Succeeded))
        .collect();
    for (name, pool) in &not_ready {
        pool_states.insert(name.clone(), pool.provisioning_state());
    }
    outdated.merge_not_ready(not_ready);

    let surge_pool = spec.surge_pool_name();
    let surge = if ctx.surge.exists(&surge_pool).await? {
        Some(ctx.surge.provisioning_state(&surge_pool).await?)
    } else {
        None
    };

    let scaling_record = ctx.scaling_state.get(campaign).await?;

    let pool_nodes: BTreeMap<String, BTreeSet<String>> = spec
        .nodepools
        .iter()
        .chain(std::iter::once(&surge_pool))
        .map(|pool| (pool.clone(), inventory.node_names(pool)))
        .collect();

    let mut guarded_pods = BTreeMap::new();
    if surge.is_some() {
        let pods = ctx.cluster.list_pods().await?;
        for (pool, nodes) in &pool_nodes {
            guarded_pods.insert(pool.clone(), guarded_pods_on(&pods, &spec.namespaces, nodes));
        }
    }

    let world = WorldState {
        outdated,
        stale_pools,
        pool_states,
        pool_nodes,
        guarded_pods,
        surge_pool,
        surge,
        scaling_record,
    };
    debug!(
        outdated_pools = world.outdated.pools.len(),
        outdated_nodes = world.outdated.nodes.len(),
        surge = ?world.surge,
        recorded = world.scaling_record.is_some(),
        "world observed"
    );
    Ok(world)
}
