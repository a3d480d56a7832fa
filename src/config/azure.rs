//! # Azure Settings
//!
//! Identity of the managed cluster whose agent pools are upgraded, and the Azure DevOps
//! organization whose agents are deregistered during a drain.

use super::required_env_var;
use crate::constants::{DEFAULT_ARM_ENDPOINT, DEFAULT_DEVOPS_URL};
use anyhow::{Context, Result};
use regex::Regex;
use std::sync::LazyLock;
use zeroize::Zeroizing;

static SUBSCRIPTION_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("subscription id pattern is valid")
});

static RESOURCE_GROUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-\w\._\(\)]{1,90}$").expect("resource group pattern is valid")
});

static CLUSTER_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9_-]{0,62}$").expect("cluster name pattern is valid")
});

/// Managed cluster identity and credential selection
#[derive(Debug, Clone)]
pub struct AzureConfig {
    pub subscription_id: String,
    pub resource_group: String,
    pub cluster_name: String,
    /// Workload identity client id; managed identity is used when unset
    pub client_id: Option<String>,
    pub arm_endpoint: String,
}

impl AzureConfig {
    /// # Errors
    ///
    /// Fails when a required variable is missing or does not look like an Azure identifier.
    pub fn from_env() -> Result<Self> {
        let config = Self {
            subscription_id: required_env_var("AZURE_SUBSCRIPTION_ID")?,
            resource_group: required_env_var("AZURE_RESOURCE_GROUP")?,
            cluster_name: required_env_var("AZURE_CLUSTER_NAME")?,
            client_id: std::env::var("AZURE_CLIENT_ID")
                .ok()
                .filter(|id| !id.is_empty()),
            arm_endpoint: std::env::var("AZURE_ARM_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_ARM_ENDPOINT.to_string()),
        };
        config.validate().context("invalid Azure cluster settings")?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !SUBSCRIPTION_ID.is_match(&self.subscription_id) {
            anyhow::bail!("subscription id '{}' is not a GUID", self.subscription_id);
        }
        if !RESOURCE_GROUP.is_match(&self.resource_group) || self.resource_group.ends_with('.') {
            anyhow::bail!("resource group '{}' is not valid", self.resource_group);
        }
        if !CLUSTER_NAME.is_match(&self.cluster_name) {
            anyhow::bail!("cluster name '{}' is not valid", self.cluster_name);
        }
        Ok(())
    }
}

/// Azure DevOps organization and personal access token
#[derive(Clone)]
pub struct DevOpsConfig {
    pub organization: String,
    pub personal_access_token: Zeroizing<String>,
    pub base_url: String,
}

impl std::fmt::Debug for DevOpsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DevOpsConfig")
            .field("organization", &self.organization)
            .field("personal_access_token", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl DevOpsConfig {
    /// # Errors
    ///
    /// Fails when the organization or the token is missing.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            organization: required_env_var("AZURE_DEVOPS_ORG")?,
            personal_access_token: Zeroizing::new(required_env_var("AZURE_DEVOPS_PAT")?),
            base_url: std::env::var("AZURE_DEVOPS_URL")
                .unwrap_or_else(|_| DEFAULT_DEVOPS_URL.to_string()),
        })
    }
}
