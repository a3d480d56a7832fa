//! # Agent Pool Model
//!
//! The subset of the AKS `agentPools` resource the controller reads and writes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// An AKS agent pool as returned by the management plane
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentPool {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub properties: AgentPoolProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentPoolProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_count: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_count: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_auto_scaling: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vm_size: Option<String>,
    #[serde(
        default,
        rename = "vnetSubnetID",
        skip_serializing_if = "Option::is_none"
    )]
    pub vnet_subnet_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orchestrator_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_labels: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_taints: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_type: Option<String>,
    /// Read-only, never sent back to the management plane
    #[serde(default, skip_serializing)]
    pub provisioning_state: Option<String>,
    /// Read-only, never sent back to the management plane
    #[serde(default, skip_serializing)]
    pub node_image_version: Option<String>,
    /// Properties the controller does not interpret, sent back unchanged on update
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl AgentPool {
    pub fn provisioning_state(&self) -> ProvisioningState {
        ProvisioningState::from(self.properties.provisioning_state.as_deref().unwrap_or(""))
    }

    pub fn is_system_mode(&self) -> bool {
        self.properties
            .mode
            .as_deref()
            .is_some_and(|mode| mode.eq_ignore_ascii_case("System"))
    }

    /// Create profile for a new pool with the same shape as this one
    pub fn clone_profile(&self) -> AgentPool {
        let p = &self.properties;
        AgentPool {
            name: None,
            properties: AgentPoolProperties {
                count: p.count,
                min_count: p.min_count,
                max_count: p.max_count,
                enable_auto_scaling: p.enable_auto_scaling,
                vm_size: p.vm_size.clone(),
                vnet_subnet_id: p.vnet_subnet_id.clone(),
                mode: p.mode.clone(),
                orchestrator_version: p.orchestrator_version.clone(),
                node_labels: p.node_labels.clone(),
                node_taints: p.node_taints.clone(),
                os_type: p.os_type.clone(),
                provisioning_state: None,
                node_image_version: None,
                extra: BTreeMap::new(),
            },
        }
    }
}

/// Provisioning state of an agent pool
///
/// The management plane adds states over time, so anything unrecognised is kept verbatim in
/// `Other` rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisioningState {
    Succeeded,
    Creating,
    Updating,
    UpgradingNodeImageVersion,
    Deleting,
    Failed,
    Other(String),
}

impl ProvisioningState {
    pub fn as_str(&self) -> &str {
        match self {
            ProvisioningState::Succeeded => "Succeeded",
            ProvisioningState::Creating => "Creating",
            ProvisioningState::Updating => "Updating",
            ProvisioningState::UpgradingNodeImageVersion => "UpgradingNodeImageVersion",
            ProvisioningState::Deleting => "Deleting",
            ProvisioningState::Failed => "Failed",
            ProvisioningState::Other(state) => state,
        }
    }

    pub fn is_succeeded(&self) -> bool {
        *self == ProvisioningState::Succeeded
    }

    /// Whether a new long-running operation may be submitted against the pool
    pub fn accepts_operations(&self) -> bool {
        matches!(
            self,
            ProvisioningState::Succeeded | ProvisioningState::Failed
        )
    }
}

impl From<&str> for ProvisioningState {
    fn from(value: &str) -> Self {
        match value {
            "Succeeded" => ProvisioningState::Succeeded,
            "Creating" => ProvisioningState::Creating,
            "Updating" => ProvisioningState::Updating,
            "UpgradingNodeImageVersion" => ProvisioningState::UpgradingNodeImageVersion,
            "Deleting" => ProvisioningState::Deleting,
            "Failed" => ProvisioningState::Failed,
            other => ProvisioningState::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ProvisioningState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
