//! # Surge Capacity
//!
//! Lifecycle of the temporary pool that absorbs agent workload while outdated pools are
//! drained. The pool is cloned from the campaign's base pool, frozen at its current size
//! once work moves back, and deleted when no guarded pod runs on it.

use crate::error::Result;
use crate::observability;
use crate::provider::{NodePoolProvider, ProvisioningState};
use std::sync::Arc;
use tracing::{debug, info};

pub struct SurgeCapacityManager {
    provider: Arc<dyn NodePoolProvider>,
}

impl std::fmt::Debug for SurgeCapacityManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurgeCapacityManager").finish_non_exhaustive()
    }
}

impl SurgeCapacityManager {
    pub fn new(provider: Arc<dyn NodePoolProvider>) -> Self {
        Self { provider }
    }

    /// Whether the pool exists; a missing pool is not an error
    pub async fn exists(&self, name: &str) -> Result<bool> {
        match self.provider.get_agent_pool(name).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Submit creation of `name` with the same profile as `base`
    ///
    /// Returns once the management plane accepts the request; provisioning continues in the
    /// background.
    pub async fn create(&self, name: &str, base: &str) -> Result<()> {
        let base_pool = self.provider.get_agent_pool(base).await?;
        let profile = base_pool.clone_profile();
        self.provider.begin_create_or_update(name, &profile).await?;
        observability::metrics::increment_surge_operations("create");
        info!(pool = name, base = base, "surge.create");
        Ok(())
    }

    pub async fn provisioning_state(&self, name: &str) -> Result<ProvisioningState> {
        Ok(self.provider.get_agent_pool(name).await?.provisioning_state())
    }

    /// Freeze each user pool at its current node count
    ///
    /// System pools and pools mid-operation are left alone. A conflict means another actor
    /// got there first and is not an error.
    pub async fn disable_autoscaling(&self, pools: &[String]) -> Result<()> {
        for name in pools {
            let mut pool = self.provider.get_agent_pool(name).await?;
            if pool.is_system_mode() {
                debug!(pool = %name, "system pool, keeping autoscaler");
                continue;
            }
            let state = pool.provisioning_state();
            if !state.is_succeeded() {
                debug!(pool = %name, state = %state, "pool is busy, not touching autoscaler");
                continue;
            }
            if pool.properties.enable_auto_scaling != Some(true) {
                continue;
            }

            pool.properties.enable_auto_scaling = Some(false);
            pool.properties.min_count = None;
            pool.properties.max_count = None;

            match self.provider.begin_create_or_update(name, &pool).await {
                Ok(()) => {
                    info!(
                        pool = %name,
                        count = pool.properties.count.unwrap_or_default(),
                        "surge.autoscaling.disabled"
                    );
                }
                Err(e) if e.is_retryable() => {
                    info!(pool = %name, "autoscaling change conflicted, re-evaluating next pass");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Submit deletion of the pool
    pub async fn remove(&self, name: &str) -> Result<()> {
        match self.provider.begin_delete(name).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                debug!(pool = name, "surge pool already gone");
            }
            Err(e) => return Err(e),
        }
        observability::metrics::increment_surge_operations("delete");
        info!(pool = name, "surge.delete");
        Ok(())
    }
}
