//! # Custom Resource Definitions
//!
//! The `SafeEvict` custom resource. One instance describes one node image upgrade campaign:
//! which pools to keep current, which namespaces hold build agents that must not be killed
//! mid-job, how to recognise an idle agent from its log, and which pool to clone for surge
//! capacity.

mod status;

pub use status::SafeEvictStatus;

use crate::constants::{MAX_POOL_NAME_LEN, TEMPORARY_PREFIX};
use kube::ResourceExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// SafeEvict Custom Resource Definition
///
/// # Example
///
/// ```yaml
/// apiVersion: nodeupdate.azure.dev/v1
/// kind: SafeEvict
/// metadata:
///   name: build-agents
///   namespace: node-image-updater
/// spec:
///   nodepools: ["agents1", "agents2"]
///   namespaces: ["azp"]
///   labelSelector:
///     job-state: done
///   lastLogLines:
///     - "Listening for Jobs"
///   baseForBackupPoolName: agents1
/// ```
#[derive(kube::CustomResource, Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "SafeEvict",
    group = "nodeupdate.azure.dev",
    version = "v1",
    namespaced,
    status = "SafeEvictStatus",
    shortname = "se",
    printcolumn = r#"{"name":"Base Pool", "type":"string", "jsonPath":".spec.baseForBackupPoolName"}, {"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct SafeEvictSpec {
    /// Pods matching every entry are considered done and are never evicted
    #[serde(default)]
    pub label_selector: BTreeMap<String, String>,
    /// Log suffixes that mark an agent pod as idle
    pub last_log_lines: Vec<String>,
    /// Agent pools kept on the latest node image
    #[serde(default)]
    pub nodepools: Vec<String>,
    /// Namespaces whose pods are guarded during a drain
    #[serde(default)]
    pub namespaces: Vec<String>,
    /// Pool cloned to create surge capacity
    pub base_for_backup_pool_name: String,
}

impl SafeEvictSpec {
    /// Name of the temporary surge pool, truncated to the AKS pool name limit
    pub fn surge_pool_name(&self) -> String {
        let budget = MAX_POOL_NAME_LEN - TEMPORARY_PREFIX.len();
        let base: String = self.base_for_backup_pool_name.chars().take(budget).collect();
        format!("{TEMPORARY_PREFIX}{base}")
    }

    pub fn monitors_namespace(&self, namespace: &str) -> bool {
        self.namespaces.iter().any(|ns| ns == namespace)
    }
}

impl SafeEvict {
    /// Name of the ConfigMap holding pre-upgrade scaling settings
    pub fn scaling_state_name(&self) -> String {
        format!("{TEMPORARY_PREFIX}{}", self.name_any())
    }

    /// Namespace the campaign lives in; the scaling-state record is stored alongside it
    pub fn campaign_namespace(&self) -> String {
        self.namespace().unwrap_or_else(|| "default".to_string())
    }
}
