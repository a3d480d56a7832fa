//! # Azure DevOps Provider
//!
//! Deregisters self-hosted build agents through the distributed task REST API before their
//! pods are deleted, so Azure DevOps never schedules a job onto an agent that is going away.

mod client;
mod types;

pub use client::AzureDevOpsClient;
pub use types::{TaskAgent, TaskAgentPool};
