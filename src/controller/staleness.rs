//! # Staleness Detection
//!
//! A pool is outdated when any of its nodes booted from an image other than the latest one
//! in the pool's upgrade profile, or when the pool is not in the `Succeeded` provisioning
//! state. Busy pools block steady state exactly like stale ones.

use crate::controller::inventory::NodeInventory;
use crate::error::Result;
use crate::provider::{AgentPool, NodePoolProvider};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info};

/// Outdated nodes and pools, keyed by name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outdated {
    pub nodes: BTreeSet<String>,
    pub pools: BTreeMap<String, AgentPool>,
}

impl Outdated {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.pools.is_empty()
    }

    /// Fold busy pools in; a pool that is both stale and busy keeps its stale entry
    pub fn merge_not_ready(&mut self, not_ready: BTreeMap<String, AgentPool>) {
        for (name, pool) in not_ready {
            self.pools.entry(name).or_insert(pool);
        }
    }
}

pub struct StalenessDetector {
    provider: Arc<dyn NodePoolProvider>,
}

impl std::fmt::Debug for StalenessDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StalenessDetector").finish_non_exhaustive()
    }
}

impl StalenessDetector {
    pub fn new(provider: Arc<dyn NodePoolProvider>) -> Self {
        Self { provider }
    }

    /// Pools whose nodes run an image older than the latest available one
    ///
    /// Only nodes carrying an image version label take part in the comparison. Pools without
    /// any such node are skipped.
    ///
    /// # Errors
    ///
    /// Reading an upgrade profile or a stale pool fails the whole computation.
    pub async fn compute_outdated(
        &self,
        monitored: &[String],
        inventory: &NodeInventory,
    ) -> Result<Outdated> {
        let mut outdated = Outdated::default();
        let pools: BTreeSet<&String> = monitored.iter().collect();

        for pool_name in pools {
            let nodes = inventory.nodes_in(pool_name);
            let versions: Vec<(&str, &str)> = nodes
                .iter()
                .filter_map(|node| Some((node.name.as_str(), node.image_version.as_deref()?)))
                .collect();
            if versions.is_empty() {
                debug!(pool = %pool_name, "pool has no versioned nodes, skipping staleness check");
                continue;
            }

            let latest = self.provider.latest_node_image_version(pool_name).await?;
            let stale: Vec<&str> = versions
                .iter()
                .filter(|(_, version)| *version != latest)
                .map(|(name, _)| *name)
                .collect();
            if stale.is_empty() {
                debug!(pool = %pool_name, version = %latest, "pool is on the latest node image");
                continue;
            }

            info!(
                pool = %pool_name,
                latest = %latest,
                stale_nodes = stale.len(),
                "staleness.pool.outdated"
            );
            let pool = self.provider.get_agent_pool(pool_name).await?;
            outdated
                .nodes
                .extend(nodes.iter().map(|node| node.name.clone()));
            outdated.pools.insert(pool_name.clone(), pool);
        }

        Ok(outdated)
    }

    /// Pools whose provisioning state is anything but `Succeeded`
    ///
    /// # Errors
    ///
    /// Fails when any pool cannot be read, including when it does not exist.
    pub async fn not_ready(&self, pools: &[String]) -> Result<BTreeMap<String, AgentPool>> {
        let mut busy = BTreeMap::new();
        let names: BTreeSet<&String> = pools.iter().collect();

        for pool_name in names {
            let pool = self.provider.get_agent_pool(pool_name).await?;
            let state = pool.provisioning_state();
            if !state.is_succeeded() {
                info!(pool = %pool_name, state = %state, "staleness.pool.not_ready");
                busy.insert(pool_name.clone(), pool);
            }
        }

        Ok(busy)
    }
}
