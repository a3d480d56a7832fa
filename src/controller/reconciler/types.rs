//! Reconciler context shared by every reconcile invocation.

use crate::cluster::ClusterOps;
use crate::config::ControllerConfig;
use crate::controller::eviction::SafeEvictionPipeline;
use crate::controller::scaling_state::ScalingStateStore;
use crate::controller::staleness::StalenessDetector;
use crate::controller::surge::SurgeCapacityManager;
use crate::provider::{AgentRegistry, NodePoolProvider};
use std::sync::Arc;

pub struct Reconciler {
    pub staleness: StalenessDetector,
    pub surge: SurgeCapacityManager,
    pub scaling_state: ScalingStateStore,
    pub eviction: SafeEvictionPipeline,
    pub cluster: Arc<dyn ClusterOps>,
    pub node_pools: Arc<dyn NodePoolProvider>,
    pub config: ControllerConfig,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    pub fn new(
        cluster: Arc<dyn ClusterOps>,
        node_pools: Arc<dyn NodePoolProvider>,
        agents: Arc<dyn AgentRegistry>,
        config: ControllerConfig,
    ) -> Self {
        Self {
            staleness: StalenessDetector::new(Arc::clone(&node_pools)),
            surge: SurgeCapacityManager::new(Arc::clone(&node_pools)),
            scaling_state: ScalingStateStore::new(Arc::clone(&cluster), Arc::clone(&node_pools)),
            eviction: SafeEvictionPipeline::new(Arc::clone(&cluster), agents),
            cluster,
            node_pools,
            config,
        }
    }
}
