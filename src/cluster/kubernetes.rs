//! `ClusterOps` over the Kubernetes API.

use super::ClusterOps;
use crate::constants::FIELD_MANAGER;
use crate::error::{Error, Result};
use async_trait::async_trait;
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{ConfigMap, Node, Pod};
use kube::api::{Api, DeleteParams, ListParams, LogParams, Patch, PatchParams, PostParams};
use kube::Client;
use serde_json::json;
use tracing::debug;

#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
}

impl std::fmt::Debug for KubeCluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeCluster").finish_non_exhaustive()
    }
}

impl KubeCluster {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

/// Treat a 404 from a delete as success
fn ignore_not_found<T>(result: kube::Result<T>, kind: &str, name: &str) -> Result<()> {
    match result {
        Ok(_) => Ok(()),
        Err(kube::Error::Api(api_err)) if api_err.code == 404 => {
            debug!("{} {} already deleted", kind, name);
            Ok(())
        }
        Err(e) => Err(Error::Kube(e)),
    }
}

#[async_trait]
impl ClusterOps for KubeCluster {
    async fn list_nodes(&self) -> Result<Vec<Node>> {
        let nodes: Api<Node> = Api::all(self.client.clone());
        Ok(nodes.list(&ListParams::default()).await?.items)
    }

    async fn set_unschedulable(&self, node: &str, unschedulable: bool) -> Result<()> {
        let nodes: Api<Node> = Api::all(self.client.clone());
        let patch = json!({ "spec": { "unschedulable": unschedulable } });
        nodes
            .patch(node, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }

    async fn list_pods(&self) -> Result<Vec<Pod>> {
        let pods: Api<Pod> = Api::all(self.client.clone());
        Ok(pods.list(&ListParams::default()).await?.items)
    }

    async fn pod_logs(&self, namespace: &str, name: &str) -> Result<String> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        Ok(pods.logs(name, &LogParams::default()).await?)
    }

    async fn annotate_pod(
        &self,
        namespace: &str,
        name: &str,
        key: &str,
        value: &str,
    ) -> Result<()> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let patch = json!({ "metadata": { "annotations": { key: value } } });
        pods.patch(name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }

    async fn delete_pod(&self, namespace: &str, name: &str) -> Result<()> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        ignore_not_found(pods.delete(name, &DeleteParams::default()).await, "pod", name)
    }

    async fn delete_job(&self, namespace: &str, name: &str) -> Result<()> {
        let jobs: Api<Job> = Api::namespaced(self.client.clone(), namespace);
        ignore_not_found(
            jobs.delete(name, &DeleteParams::background()).await,
            "job",
            name,
        )
    }

    async fn get_config_map(&self, namespace: &str, name: &str) -> Result<Option<ConfigMap>> {
        let config_maps: Api<ConfigMap> = Api::namespaced(self.client.clone(), namespace);
        Ok(config_maps.get_opt(name).await?)
    }

    async fn create_config_map(&self, namespace: &str, config_map: &ConfigMap) -> Result<()> {
        let config_maps: Api<ConfigMap> = Api::namespaced(self.client.clone(), namespace);
        let params = PostParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..Default::default()
        };
        match config_maps.create(&params, config_map).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(api_err)) if api_err.code == 409 => {
                let name = config_map.metadata.name.as_deref().unwrap_or_default();
                Err(Error::Conflict(format!("configmap {namespace}/{name}")))
            }
            Err(e) => Err(Error::Kube(e)),
        }
    }

    async fn delete_config_map(&self, namespace: &str, name: &str) -> Result<()> {
        let config_maps: Api<ConfigMap> = Api::namespaced(self.client.clone(), namespace);
        ignore_not_found(
            config_maps.delete(name, &DeleteParams::default()).await,
            "configmap",
            name,
        )
    }
}
