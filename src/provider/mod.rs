//! # Provider Module
//!
//! External systems the controller drives besides the Kubernetes API:
//!
//! - [`NodePoolProvider`] - the AKS management plane (agent pools and their upgrade profiles)
//! - [`AgentRegistry`] - the Azure DevOps agent pool service
//!
//! Both are traits so the reconciler can be exercised against in-memory implementations.

pub mod azure;
pub mod azure_devops;
pub mod pool;

pub use pool::{AgentPool, AgentPoolProperties, ProvisioningState};

use crate::error::Result;
use async_trait::async_trait;

/// Agent pool operations on the managed cluster
///
/// Long-running operations (`begin_*`) return once the management plane has accepted the
/// request, not when provisioning finishes.
#[async_trait]
pub trait NodePoolProvider: Send + Sync {
    /// Fails with a not-found error when the pool does not exist
    async fn get_agent_pool(&self, name: &str) -> Result<AgentPool>;

    /// Conflicts surface as [`crate::Error::Conflict`]
    async fn begin_create_or_update(&self, name: &str, pool: &AgentPool) -> Result<()>;

    async fn begin_delete(&self, name: &str) -> Result<()>;

    async fn latest_node_image_version(&self, name: &str) -> Result<String>;

    async fn begin_upgrade_node_image(&self, name: &str) -> Result<()>;
}

/// Build agent registrations bound one-to-one to agent pods
#[async_trait]
pub trait AgentRegistry: Send + Sync {
    /// Stop the agent from accepting new jobs
    async fn disable_agent(&self, pool_name: &str, agent_name: &str) -> Result<()>;

    /// Remove the agent registration entirely
    async fn remove_agent(&self, pool_name: &str, agent_name: &str) -> Result<()>;
}
