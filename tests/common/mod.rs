//! In-memory stand-ins for the Kubernetes API, the AKS management plane and Azure DevOps.
//!
//! Each fake keeps its state behind a `Mutex` so tests can inspect and mutate it between
//! reconcile passes.

#![allow(dead_code, reason = "each test binary uses a different subset of the helpers")]

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{
    ConfigMap, Container, EnvVar, Node, NodeSpec, Pod, PodSpec, PodStatus,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::api::ObjectMeta;
use node_image_updater::cluster::ClusterOps;
use node_image_updater::constants::{AGENT_POOL_LABEL, NODE_IMAGE_VERSION_LABEL};
use node_image_updater::provider::{AgentPool, AgentRegistry, NodePoolProvider};
use node_image_updater::{Error, Result, SafeEvict, SafeEvictSpec};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

pub const IDLE_LINE: &str = "Listening for Jobs";
pub const AGENT_NAMESPACE: &str = "azp";
pub const CAMPAIGN_NAMESPACE: &str = "ops";

pub fn node(name: &str, pool: &str, image_version: &str) -> Node {
    Node {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            labels: Some(BTreeMap::from([
                (AGENT_POOL_LABEL.to_string(), pool.to_string()),
                (
                    NODE_IMAGE_VERSION_LABEL.to_string(),
                    image_version.to_string(),
                ),
            ])),
            ..Default::default()
        },
        spec: Some(NodeSpec::default()),
        ..Default::default()
    }
}

/// A running agent pod owned by `<name>-job`, registered in Azure DevOps pool `linux`
pub fn agent_pod(name: &str, node: &str) -> Pod {
    Pod {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(AGENT_NAMESPACE.to_string()),
            owner_references: Some(vec![OwnerReference {
                api_version: "batch/v1".to_string(),
                kind: "Job".to_string(),
                name: format!("{name}-job"),
                uid: format!("uid-{name}"),
                ..Default::default()
            }]),
            ..Default::default()
        },
        spec: Some(PodSpec {
            node_name: Some(node.to_string()),
            containers: vec![Container {
                name: "agent".to_string(),
                env: Some(vec![EnvVar {
                    name: "AZP_POOL".to_string(),
                    value: Some("linux".to_string()),
                    ..Default::default()
                }]),
                ..Default::default()
            }],
            ..Default::default()
        }),
        status: Some(PodStatus {
            phase: Some("Running".to_string()),
            ..Default::default()
        }),
    }
}

pub fn pool(state: &str, autoscale: Option<(i32, i32)>, count: i32) -> AgentPool {
    let mut pool = AgentPool::default();
    pool.properties.provisioning_state = Some(state.to_string());
    pool.properties.mode = Some("User".to_string());
    pool.properties.vm_size = Some("Standard_D4s_v5".to_string());
    pool.properties.count = Some(count);
    match autoscale {
        Some((min, max)) => {
            pool.properties.enable_auto_scaling = Some(true);
            pool.properties.min_count = Some(min);
            pool.properties.max_count = Some(max);
        }
        None => pool.properties.enable_auto_scaling = Some(false),
    }
    pool
}

pub fn campaign(name: &str, nodepools: &[&str], base: &str) -> SafeEvict {
    let mut campaign = SafeEvict::new(
        name,
        SafeEvictSpec {
            label_selector: BTreeMap::from([("job-state".to_string(), "done".to_string())]),
            last_log_lines: vec![IDLE_LINE.to_string()],
            nodepools: nodepools.iter().map(ToString::to_string).collect(),
            namespaces: vec![AGENT_NAMESPACE.to_string()],
            base_for_backup_pool_name: base.to_string(),
        },
    );
    campaign.metadata.namespace = Some(CAMPAIGN_NAMESPACE.to_string());
    campaign
}

#[derive(Debug, Default)]
pub struct ClusterState {
    pub nodes: BTreeMap<String, Node>,
    pub pods: BTreeMap<(String, String), Pod>,
    pub logs: BTreeMap<(String, String), String>,
    pub config_maps: BTreeMap<(String, String), ConfigMap>,
    pub deleted_jobs: Vec<(String, String)>,
    pub deleted_pods: Vec<(String, String)>,
    /// Jobs whose next delete fails
    pub fail_job_deletes: BTreeSet<String>,
    /// Mutating calls in the order they were made
    pub calls: Vec<String>,
}

#[derive(Debug, Default)]
pub struct FakeCluster {
    pub state: Mutex<ClusterState>,
}

impl FakeCluster {
    pub fn add_node(&self, node: Node) {
        let name = node.metadata.name.clone().unwrap_or_default();
        self.state.lock().unwrap().nodes.insert(name, node);
    }

    pub fn add_pod(&self, pod: Pod, log: &str) {
        let key = (
            pod.metadata.namespace.clone().unwrap_or_default(),
            pod.metadata.name.clone().unwrap_or_default(),
        );
        let mut state = self.state.lock().unwrap();
        state.logs.insert(key.clone(), log.to_string());
        state.pods.insert(key, pod);
    }

    pub fn set_node_image(&self, node: &str, image_version: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(labels) = state
            .nodes
            .get_mut(node)
            .and_then(|n| n.metadata.labels.as_mut())
        {
            labels.insert(
                NODE_IMAGE_VERSION_LABEL.to_string(),
                image_version.to_string(),
            );
        }
    }

    pub fn is_cordoned(&self, node: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .nodes
            .get(node)
            .and_then(|n| n.spec.as_ref())
            .and_then(|spec| spec.unschedulable)
            .unwrap_or(false)
    }

    pub fn has_pod(&self, namespace: &str, name: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .pods
            .contains_key(&(namespace.to_string(), name.to_string()))
    }

    pub fn config_map(&self, namespace: &str, name: &str) -> Option<ConfigMap> {
        self.state
            .lock()
            .unwrap()
            .config_maps
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    pub fn pod(&self, namespace: &str, name: &str) -> Option<Pod> {
        self.state
            .lock()
            .unwrap()
            .pods
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }
}

#[async_trait]
impl ClusterOps for FakeCluster {
    async fn list_nodes(&self) -> Result<Vec<Node>> {
        Ok(self.state.lock().unwrap().nodes.values().cloned().collect())
    }

    async fn set_unschedulable(&self, node: &str, unschedulable: bool) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("cordon {node} {unschedulable}"));
        let entry = state
            .nodes
            .get_mut(node)
            .ok_or_else(|| Error::not_found("node", node))?;
        entry.spec.get_or_insert_with(NodeSpec::default).unschedulable = Some(unschedulable);
        Ok(())
    }

    async fn list_pods(&self) -> Result<Vec<Pod>> {
        Ok(self.state.lock().unwrap().pods.values().cloned().collect())
    }

    async fn pod_logs(&self, namespace: &str, name: &str) -> Result<String> {
        self.state
            .lock()
            .unwrap()
            .logs
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| Error::not_found("pod log", format!("{namespace}/{name}")))
    }

    async fn annotate_pod(
        &self,
        namespace: &str,
        name: &str,
        key: &str,
        value: &str,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("annotate pod {namespace}/{name}"));
        let pod = state
            .pods
            .get_mut(&(namespace.to_string(), name.to_string()))
            .ok_or_else(|| Error::not_found("pod", format!("{namespace}/{name}")))?;
        pod.metadata
            .annotations
            .get_or_insert_with(BTreeMap::new)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete_pod(&self, namespace: &str, name: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("delete pod {namespace}/{name}"));
        let key = (namespace.to_string(), name.to_string());
        state.pods.remove(&key);
        state.deleted_pods.push(key);
        Ok(())
    }

    async fn delete_job(&self, namespace: &str, name: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("delete job {namespace}/{name}"));
        if state.fail_job_deletes.remove(name) {
            return Err(Error::Status {
                operation: "delete job".to_string(),
                status: 500,
                message: "etcd request timed out".to_string(),
            });
        }
        state
            .deleted_jobs
            .push((namespace.to_string(), name.to_string()));
        Ok(())
    }

    async fn get_config_map(&self, namespace: &str, name: &str) -> Result<Option<ConfigMap>> {
        Ok(self.config_map(namespace, name))
    }

    async fn create_config_map(&self, namespace: &str, config_map: &ConfigMap) -> Result<()> {
        let name = config_map.metadata.name.clone().unwrap_or_default();
        let mut state = self.state.lock().unwrap();
        let key = (namespace.to_string(), name.clone());
        if state.config_maps.contains_key(&key) {
            return Err(Error::Conflict(format!("configmap {namespace}/{name}")));
        }
        state.calls.push(format!("create configmap {namespace}/{name}"));
        state.config_maps.insert(key, config_map.clone());
        Ok(())
    }

    async fn delete_config_map(&self, namespace: &str, name: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state
            .config_maps
            .remove(&(namespace.to_string(), name.to_string()))
            .is_some()
        {
            state.calls.push(format!("delete configmap {namespace}/{name}"));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct PoolState {
    pub pools: BTreeMap<String, AgentPool>,
    pub latest_versions: BTreeMap<String, String>,
    pub writes: Vec<(String, AgentPool)>,
    pub upgrades: Vec<String>,
    pub deletes: Vec<String>,
    /// Provisioning state given to newly created pools
    pub new_pool_state: Option<String>,
    /// Pools whose next write fails with a conflict
    pub conflict_on_write: BTreeSet<String>,
}

#[derive(Debug, Default)]
pub struct FakeNodePools {
    pub state: Mutex<PoolState>,
}

impl FakeNodePools {
    pub fn add_pool(&self, name: &str, mut pool: AgentPool, latest: &str) {
        let mut state = self.state.lock().unwrap();
        pool.name = Some(name.to_string());
        state.pools.insert(name.to_string(), pool);
        state
            .latest_versions
            .insert(name.to_string(), latest.to_string());
    }

    pub fn pool(&self, name: &str) -> Option<AgentPool> {
        self.state.lock().unwrap().pools.get(name).cloned()
    }

    pub fn set_state(&self, name: &str, provisioning_state: &str) {
        if let Some(pool) = self.state.lock().unwrap().pools.get_mut(name) {
            pool.properties.provisioning_state = Some(provisioning_state.to_string());
        }
    }

    pub fn upgrades(&self) -> Vec<String> {
        self.state.lock().unwrap().upgrades.clone()
    }

    pub fn writes(&self) -> Vec<(String, AgentPool)> {
        self.state.lock().unwrap().writes.clone()
    }
}

#[async_trait]
impl NodePoolProvider for FakeNodePools {
    async fn get_agent_pool(&self, name: &str) -> Result<AgentPool> {
        self.pool(name)
            .ok_or_else(|| Error::not_found("agent pool", name))
    }

    async fn begin_create_or_update(&self, name: &str, pool: &AgentPool) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.conflict_on_write.remove(name) {
            return Err(Error::Conflict(format!("agent pool {name}")));
        }
        state.writes.push((name.to_string(), pool.clone()));

        let mut stored = pool.clone();
        stored.name = Some(name.to_string());
        stored.properties.provisioning_state = match state.pools.get(name) {
            Some(existing) => existing.properties.provisioning_state.clone(),
            None => Some(
                state
                    .new_pool_state
                    .clone()
                    .unwrap_or_else(|| "Succeeded".to_string()),
            ),
        };
        state.pools.insert(name.to_string(), stored);
        Ok(())
    }

    async fn begin_delete(&self, name: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.deletes.push(name.to_string());
        state
            .pools
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Error::not_found("agent pool", name))
    }

    async fn latest_node_image_version(&self, name: &str) -> Result<String> {
        self.state
            .lock()
            .unwrap()
            .latest_versions
            .get(name)
            .cloned()
            .ok_or_else(|| Error::not_found("agent pool", name))
    }

    async fn begin_upgrade_node_image(&self, name: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.upgrades.push(name.to_string());
        let pool = state
            .pools
            .get_mut(name)
            .ok_or_else(|| Error::not_found("agent pool", name))?;
        pool.properties.provisioning_state = Some("UpgradingNodeImageVersion".to_string());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct FakeAgents {
    pub calls: Mutex<Vec<String>>,
    /// Registered `(pool, agent)` pairs
    pub registrations: Mutex<BTreeSet<(String, String)>>,
    /// Agent names whose disable call fails
    pub fail_disable: Mutex<BTreeSet<String>>,
}

impl FakeAgents {
    pub fn register(&self, pool_name: &str, agent_name: &str) {
        self.registrations
            .lock()
            .unwrap()
            .insert((pool_name.to_string(), agent_name.to_string()));
    }

    pub fn is_registered(&self, pool_name: &str, agent_name: &str) -> bool {
        self.registrations
            .lock()
            .unwrap()
            .contains(&(pool_name.to_string(), agent_name.to_string()))
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AgentRegistry for FakeAgents {
    async fn disable_agent(&self, pool_name: &str, agent_name: &str) -> Result<()> {
        if self.fail_disable.lock().unwrap().contains(agent_name) {
            return Err(Error::Status {
                operation: "disable agent".to_string(),
                status: 500,
                message: "agent service unavailable".to_string(),
            });
        }
        if !self.is_registered(pool_name, agent_name) {
            return Err(Error::not_found("agent", format!("{pool_name}/{agent_name}")));
        }
        self.calls
            .lock()
            .unwrap()
            .push(format!("disable {pool_name}/{agent_name}"));
        Ok(())
    }

    async fn remove_agent(&self, pool_name: &str, agent_name: &str) -> Result<()> {
        let removed = self
            .registrations
            .lock()
            .unwrap()
            .remove(&(pool_name.to_string(), agent_name.to_string()));
        if !removed {
            return Err(Error::not_found("agent", format!("{pool_name}/{agent_name}")));
        }
        self.calls
            .lock()
            .unwrap()
            .push(format!("remove {pool_name}/{agent_name}"));
        Ok(())
    }
}
