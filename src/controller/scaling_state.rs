//! # Scaling State
//!
//! Before an outdated pool is frozen, its scaling settings are written to a ConfigMap in the
//! campaign's namespace, one data key per pool:
//!
//! ```json
//! {"MinCount": 2, "MaxCount": 5}
//! {"Count": 3}
//! ```
//!
//! The record is written once per campaign and never overwritten while it exists, so a
//! controller restart mid-upgrade still restores the original settings. It is deleted only
//! when the campaign is back in steady state.

use crate::cluster::ClusterOps;
use crate::crd::SafeEvict;
use crate::error::{Error, Result};
use crate::observability;
use crate::provider::{AgentPool, NodePoolProvider};
use k8s_openapi::api::core::v1::ConfigMap;
use kube::api::ObjectMeta;
use kube::Resource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Scaling settings of one pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ScalingConfig {
    Autoscaled {
        #[serde(rename = "MinCount")]
        min_count: i32,
        #[serde(rename = "MaxCount")]
        max_count: i32,
    },
    Fixed {
        #[serde(rename = "Count")]
        count: i32,
    },
}

/// Pool name to its pre-upgrade scaling settings
pub type ScalingSnapshot = BTreeMap<String, ScalingConfig>;

impl ScalingConfig {
    /// Scaling settings currently configured on `pool`
    ///
    /// # Errors
    ///
    /// A pool with neither autoscaler bounds nor a node count is malformed.
    pub fn from_pool(name: &str, pool: &AgentPool) -> Result<Self> {
        let p = &pool.properties;
        match (p.min_count, p.max_count, p.count) {
            (Some(min_count), Some(max_count), _) => Ok(ScalingConfig::Autoscaled {
                min_count,
                max_count,
            }),
            (_, _, Some(count)) => Ok(ScalingConfig::Fixed { count }),
            _ => Err(Error::malformed(
                format!("agent pool {name}"),
                "neither minCount/maxCount nor count is set",
            )),
        }
    }

    /// # Errors
    ///
    /// Fails on anything but the two record shapes.
    pub fn parse(pool: &str, raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|e| Error::malformed(format!("scaling state of {pool}"), e.to_string()))
    }

    /// Whether the live pool already has these settings
    pub fn is_applied(&self, pool: &AgentPool) -> bool {
        let p = &pool.properties;
        match *self {
            ScalingConfig::Autoscaled {
                min_count,
                max_count,
            } => {
                p.enable_auto_scaling == Some(true)
                    && p.min_count == Some(min_count)
                    && p.max_count == Some(max_count)
            }
            ScalingConfig::Fixed { count } => {
                p.enable_auto_scaling != Some(true) && p.count == Some(count)
            }
        }
    }

    /// Rewrite the pool's scaling fields in place
    pub fn apply(&self, pool: &mut AgentPool) {
        let p = &mut pool.properties;
        match *self {
            ScalingConfig::Autoscaled {
                min_count,
                max_count,
            } => {
                p.enable_auto_scaling = Some(true);
                p.min_count = Some(min_count);
                p.max_count = Some(max_count);
                // The autoscaler rejects a current count outside its bounds
                p.count = p.count.map(|count| count.clamp(min_count, max_count));
            }
            ScalingConfig::Fixed { count } => {
                p.enable_auto_scaling = Some(false);
                p.min_count = None;
                p.max_count = None;
                p.count = Some(count);
            }
        }
    }
}

/// Capture the scaling settings of every pool in `pools`
///
/// # Errors
///
/// Fails when any pool's settings cannot be read.
pub fn capture(pools: &BTreeMap<String, AgentPool>) -> Result<ScalingSnapshot> {
    pools
        .iter()
        .map(|(name, pool)| Ok((name.clone(), ScalingConfig::from_pool(name, pool)?)))
        .collect()
}

pub struct ScalingStateStore {
    cluster: Arc<dyn ClusterOps>,
    provider: Arc<dyn NodePoolProvider>,
}

impl std::fmt::Debug for ScalingStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScalingStateStore").finish_non_exhaustive()
    }
}

impl ScalingStateStore {
    pub fn new(cluster: Arc<dyn ClusterOps>, provider: Arc<dyn NodePoolProvider>) -> Self {
        Self { cluster, provider }
    }

    /// The campaign's record, or `None` when it has not been written
    ///
    /// # Errors
    ///
    /// Any entry that does not parse fails the read.
    pub async fn get(&self, campaign: &SafeEvict) -> Result<Option<ScalingSnapshot>> {
        let namespace = campaign.campaign_namespace();
        let name = campaign.scaling_state_name();
        let Some(config_map) = self.cluster.get_config_map(&namespace, &name).await? else {
            return Ok(None);
        };

        let snapshot = config_map
            .data
            .unwrap_or_default()
            .iter()
            .map(|(pool, raw)| Ok((pool.clone(), ScalingConfig::parse(pool, raw)?)))
            .collect::<Result<ScalingSnapshot>>()?;
        Ok(Some(snapshot))
    }

    /// Write `snapshot` unless a record already exists
    ///
    /// Returns `true` when this call wrote the record.
    pub async fn create_if_absent(
        &self,
        campaign: &SafeEvict,
        snapshot: &ScalingSnapshot,
    ) -> Result<bool> {
        let namespace = campaign.campaign_namespace();
        let name = campaign.scaling_state_name();
        if self.cluster.get_config_map(&namespace, &name).await?.is_some() {
            debug!(record = %name, "scaling state already recorded");
            return Ok(false);
        }

        let data = snapshot
            .iter()
            .map(|(pool, config)| {
                serde_json::to_string(config)
                    .map(|raw| (pool.clone(), raw))
                    .map_err(|e| Error::malformed(format!("scaling state of {pool}"), e.to_string()))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;

        let config_map = ConfigMap {
            metadata: ObjectMeta {
                name: Some(name.clone()),
                namespace: Some(namespace.clone()),
                labels: Some(BTreeMap::from([(
                    "app.kubernetes.io/managed-by".to_string(),
                    crate::constants::FIELD_MANAGER.to_string(),
                )])),
                owner_references: campaign.controller_owner_ref(&()).map(|owner| vec![owner]),
                ..Default::default()
            },
            data: Some(data),
            ..Default::default()
        };

        match self.cluster.create_config_map(&namespace, &config_map).await {
            Ok(()) => {
                info!(record = %name, pools = snapshot.len(), "scaling_state.recorded");
                Ok(true)
            }
            // Lost a race with another writer; the existing record wins
            Err(e) if e.is_retryable() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Delete the campaign's record; an absent record is fine
    pub async fn delete(&self, campaign: &SafeEvict) -> Result<()> {
        let name = campaign.scaling_state_name();
        self.cluster
            .delete_config_map(&campaign.campaign_namespace(), &name)
            .await?;
        debug!(record = %name, "scaling state cleared");
        Ok(())
    }

    /// Apply recorded settings to a live pool
    ///
    /// A pool that already matches is left alone. A write that loses to another writer is
    /// reported as [`Restore::Conflicted`] so the caller can keep the record for the next pass.
    ///
    /// # Errors
    ///
    /// A pool that is not `Succeeded` yields a precondition error.
    pub async fn set_scaling(&self, pool_name: &str, config: ScalingConfig) -> Result<Restore> {
        let mut pool = self.provider.get_agent_pool(pool_name).await?;
        let state = pool.provisioning_state();
        if !state.is_succeeded() {
            return Err(Error::Precondition(format!(
                "agent pool {pool_name} is {state}"
            )));
        }
        if config.is_applied(&pool) {
            return Ok(Restore::AlreadyApplied);
        }

        config.apply(&mut pool);
        match self.provider.begin_create_or_update(pool_name, &pool).await {
            Ok(()) => {
                observability::metrics::increment_pool_restores();
                info!(pool = pool_name, config = ?config, "scaling_state.restored");
                Ok(Restore::Submitted)
            }
            Err(e) if e.is_retryable() => {
                info!(pool = pool_name, "scaling restore conflicted, re-evaluating next pass");
                Ok(Restore::Conflicted)
            }
            Err(e) => Err(e),
        }
    }
}

/// Result of [`ScalingStateStore::set_scaling`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Restore {
    /// An update carrying the recorded settings was accepted
    Submitted,
    /// The live pool already had the recorded settings
    AlreadyApplied,
    /// Another writer got there first; the record must outlive this pass
    Conflicted,
}

impl Restore {
    /// Whether the pool is known to carry the recorded settings
    pub fn is_done(self) -> bool {
        !matches!(self, Restore::Conflicted)
    }
}
