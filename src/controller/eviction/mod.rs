//! # Safe Eviction
//!
//! Drains agent pods that are provably idle. For each pod, in order:
//!
//! 1. Resolve its Azure DevOps pool (from `AZP_POOL`) and its owning Job
//! 2. Disable, then remove, the agent registration, and mark the pod with
//!    [`AGENT_REMOVED_ANNOTATION`]
//! 3. Delete the owning Job
//! 4. Delete the pod
//!
//! Lookups happen before anything is changed, so a pod that cannot be fully severed is
//! reported without side effects. A failure part-way aborts the call and the next pass
//! re-runs the sequence. A pod that already carries the annotation has no registration left,
//! so the retry goes straight to the Job and pod deletes.

mod selection;

pub use selection::{is_candidate, is_idle_log, restrict_to_nodes, satisfies_done_labels};

use crate::cluster::ClusterOps;
use crate::constants::{AGENT_POOL_ENV_VAR, AGENT_POOL_LABEL, AGENT_REMOVED_ANNOTATION};
use crate::crd::SafeEvictSpec;
use crate::error::{Error, Result};
use crate::observability;
use crate::provider::AgentRegistry;
use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct SafeEvictionPipeline {
    cluster: Arc<dyn ClusterOps>,
    agents: Arc<dyn AgentRegistry>,
}

impl std::fmt::Debug for SafeEvictionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SafeEvictionPipeline").finish_non_exhaustive()
    }
}

impl SafeEvictionPipeline {
    pub fn new(cluster: Arc<dyn ClusterOps>, agents: Arc<dyn AgentRegistry>) -> Self {
        Self { cluster, agents }
    }

    /// Running pods in monitored namespaces whose log ends with an idle sentinel
    ///
    /// A pod whose log cannot be read is skipped; it has not been proven idle.
    pub async fn select_safe_to_evict(&self, spec: &SafeEvictSpec) -> Result<Vec<Pod>> {
        let pods = self.cluster.list_pods().await?;
        let mut safe = Vec::new();

        for pod in pods.into_iter().filter(|pod| is_candidate(pod, spec)) {
            let namespace = pod.namespace().unwrap_or_default();
            let name = pod.name_any();
            let log = match self.cluster.pod_logs(&namespace, &name).await {
                Ok(log) => log,
                Err(e) => {
                    warn!(pod = %name, namespace = %namespace, error = %e, "could not read pod log, skipping");
                    continue;
                }
            };
            if is_idle_log(&log, &spec.last_log_lines) {
                debug!(pod = %name, namespace = %namespace, "pod is idle");
                safe.push(pod);
            }
        }

        Ok(safe)
    }

    /// Evict every pod, stopping at the first failure
    ///
    /// Returns the number of pods evicted.
    pub async fn evict(&self, pods: &[Pod]) -> Result<usize> {
        for pod in pods {
            self.evict_one(pod).await?;
        }
        Ok(pods.len())
    }

    async fn evict_one(&self, pod: &Pod) -> Result<()> {
        let namespace = pod.namespace().unwrap_or_default();
        let name = pod.name_any();

        let agent_pool = agent_pool_of(pod)
            .ok_or_else(|| Error::not_found("agent pool variable", format!("{namespace}/{name}")))?;
        let job = owning_job(pod)
            .ok_or_else(|| Error::not_found("owning job", format!("{namespace}/{name}")))?;

        if agent_removed(pod) {
            debug!(pod = %name, namespace = %namespace, "agent already deregistered");
        } else {
            self.agents.disable_agent(&agent_pool, &name).await?;
            self.agents.remove_agent(&agent_pool, &name).await?;
            self.cluster
                .annotate_pod(&namespace, &name, AGENT_REMOVED_ANNOTATION, "true")
                .await?;
        }
        self.cluster.delete_job(&namespace, &job).await?;
        self.cluster.delete_pod(&namespace, &name).await?;

        observability::metrics::increment_pods_evicted();
        info!(
            pod = %name,
            namespace = %namespace,
            job = %job,
            agent.pool = %agent_pool,
            "eviction.pod.evicted"
        );
        Ok(())
    }

    /// Mark every node of `pool` (un)schedulable
    ///
    /// Nodes already in the requested state are not touched. Returns the number changed.
    pub async fn cordon(&self, pool: &str, cordon: bool) -> Result<usize> {
        let nodes = self.cluster.list_nodes().await?;
        let mut changed = 0;
        for node in &nodes {
            if node.labels().get(AGENT_POOL_LABEL).map(String::as_str) != Some(pool) {
                continue;
            }
            let unschedulable = node
                .spec
                .as_ref()
                .and_then(|spec| spec.unschedulable)
                .unwrap_or(false);
            if unschedulable == cordon {
                continue;
            }
            self.cluster.set_unschedulable(&node.name_any(), cordon).await?;
            changed += 1;
        }
        if changed > 0 {
            info!(pool = pool, nodes = changed, cordon = cordon, "eviction.pool.cordon");
        }
        Ok(changed)
    }
}

/// Value of `AZP_POOL` on the first container that sets it
pub fn agent_pool_of(pod: &Pod) -> Option<String> {
    pod.spec
        .as_ref()?
        .containers
        .iter()
        .flat_map(|container| container.env.iter().flatten())
        .find(|var| var.name == AGENT_POOL_ENV_VAR)
        .and_then(|var| var.value.clone())
        .filter(|value| !value.is_empty())
}

/// Whether an earlier pass already deregistered the pod's agent
pub fn agent_removed(pod: &Pod) -> bool {
    pod.annotations().contains_key(AGENT_REMOVED_ANNOTATION)
}

/// Name of the Job owning the pod
pub fn owning_job(pod: &Pod) -> Option<String> {
    pod.owner_references()
        .iter()
        .find(|owner| owner.kind.eq_ignore_ascii_case("job"))
        .map(|owner| owner.name.clone())
}
