//! # Cluster Operations
//!
//! The Kubernetes calls the reconciler makes, behind a trait so the engine can run against an
//! in-memory cluster in tests. [`KubeCluster`] is the real implementation.
//!
//! Deletes treat "already gone" as success; callers never need to special-case a 404.

mod kubernetes;

pub use kubernetes::KubeCluster;

use crate::error::Result;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ConfigMap, Node, Pod};

#[async_trait]
pub trait ClusterOps: Send + Sync {
    async fn list_nodes(&self) -> Result<Vec<Node>>;

    /// Set `spec.unschedulable` on one node
    async fn set_unschedulable(&self, node: &str, unschedulable: bool) -> Result<()>;

    /// Pods in every namespace
    async fn list_pods(&self) -> Result<Vec<Pod>>;

    /// Complete log of the pod's default container
    async fn pod_logs(&self, namespace: &str, name: &str) -> Result<String>;

    /// Set one annotation on a pod
    async fn annotate_pod(
        &self,
        namespace: &str,
        name: &str,
        key: &str,
        value: &str,
    ) -> Result<()>;

    async fn delete_pod(&self, namespace: &str, name: &str) -> Result<()>;

    /// Delete a Job, letting the garbage collector remove its pods in the background
    async fn delete_job(&self, namespace: &str, name: &str) -> Result<()>;

    async fn get_config_map(&self, namespace: &str, name: &str) -> Result<Option<ConfigMap>>;

    /// Fails with a conflict when the ConfigMap already exists
    async fn create_config_map(&self, namespace: &str, config_map: &ConfigMap) -> Result<()>;

    async fn delete_config_map(&self, namespace: &str, name: &str) -> Result<()>;
}
