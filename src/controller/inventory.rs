//! # Inventory
//!
//! Point-in-time views over nodes and pods, built from a single list call each.

use crate::constants::{AGENT_POOL_LABEL, NODE_IMAGE_VERSION_LABEL};
use k8s_openapi::api::core::v1::{Node, Pod};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeInfo {
    pub name: String,
    pub image_version: Option<String>,
    pub unschedulable: bool,
}

impl NodeInfo {
    fn from_node(node: &Node) -> Option<Self> {
        let name = node.metadata.name.clone()?;
        Some(Self {
            name,
            image_version: label(node, NODE_IMAGE_VERSION_LABEL).map(str::to_string),
            unschedulable: node
                .spec
                .as_ref()
                .and_then(|spec| spec.unschedulable)
                .unwrap_or(false),
        })
    }
}

/// Nodes grouped by the agent pool they belong to
#[derive(Debug, Clone, Default)]
pub struct NodeInventory {
    pools: BTreeMap<String, Vec<NodeInfo>>,
}

impl NodeInventory {
    /// Nodes without the agent pool label are ignored
    pub fn from_nodes(nodes: &[Node]) -> Self {
        let mut pools: BTreeMap<String, Vec<NodeInfo>> = BTreeMap::new();
        for node in nodes {
            let Some(pool) = label(node, AGENT_POOL_LABEL) else {
                continue;
            };
            if let Some(info) = NodeInfo::from_node(node) {
                pools.entry(pool.to_string()).or_default().push(info);
            }
        }
        for members in pools.values_mut() {
            members.sort_by(|a, b| a.name.cmp(&b.name));
        }
        Self { pools }
    }

    pub fn nodes_in(&self, pool: &str) -> &[NodeInfo] {
        self.pools.get(pool).map_or(&[], Vec::as_slice)
    }

    pub fn node_names(&self, pool: &str) -> BTreeSet<String> {
        self.nodes_in(pool).iter().map(|n| n.name.clone()).collect()
    }
}

fn label<'a>(node: &'a Node, key: &str) -> Option<&'a str> {
    node.metadata
        .labels
        .as_ref()
        .and_then(|labels| labels.get(key))
        .map(String::as_str)
}

pub fn is_running(pod: &Pod) -> bool {
    pod.status
        .as_ref()
        .and_then(|status| status.phase.as_deref())
        == Some("Running")
}

pub fn node_of(pod: &Pod) -> Option<&str> {
    pod.spec.as_ref().and_then(|spec| spec.node_name.as_deref())
}

/// Running pods in the guarded namespaces scheduled on any of `nodes`
pub fn guarded_pods_on(pods: &[Pod], namespaces: &[String], nodes: &BTreeSet<String>) -> usize {
    pods.iter()
        .filter(|pod| {
            pod.metadata
                .namespace
                .as_ref()
                .is_some_and(|ns| namespaces.contains(ns))
        })
        .filter(|pod| is_running(pod))
        .filter(|pod| node_of(pod).is_some_and(|node| nodes.contains(node)))
        .count()
}
