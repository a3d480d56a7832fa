//! # Azure Provider
//!
//! AKS management plane access over the Azure Resource Manager REST API.
//!
//! ## Sub-modules
//!
//! - `auth` - Token credential creation (workload identity or managed identity)
//! - `agent_pools` - Agent pool client implementing [`crate::provider::NodePoolProvider`]

pub mod agent_pools;
pub mod auth;

pub use agent_pools::AksAgentPoolClient;
pub use auth::create_credential;
