//! # AKS Agent Pool Client
//!
//! Agent pool operations against
//! `/subscriptions/{sub}/resourceGroups/{rg}/providers/Microsoft.ContainerService/managedClusters/{cluster}/agentPools`.
//!
//! Create, delete and node image upgrades are long-running on the management plane; the
//! client returns as soon as the request is accepted and callers poll the provisioning state.

use super::auth::get_token;
use crate::config::AzureConfig;
use crate::constants::AKS_API_VERSION;
use crate::error::{Error, Result};
use crate::provider::{AgentPool, NodePoolProvider};
use anyhow::Context;
use async_trait::async_trait;
use azure_core::credentials::TokenCredential;
use reqwest::{header::CONTENT_LENGTH, Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, info_span, Instrument};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpgradeProfile {
    properties: UpgradeProfileProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpgradeProfileProperties {
    #[serde(default)]
    latest_node_image_version: Option<String>,
}

/// Agent pool client for one managed cluster
#[derive(Clone)]
pub struct AksAgentPoolClient {
    http_client: Client,
    credential: Arc<dyn TokenCredential>,
    cluster_url: String,
}

impl std::fmt::Debug for AksAgentPoolClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AksAgentPoolClient")
            .field("cluster_url", &self.cluster_url)
            .finish_non_exhaustive()
    }
}

impl AksAgentPoolClient {
    /// # Errors
    ///
    /// Fails when the HTTP client cannot be built.
    pub fn new(config: &AzureConfig, credential: Arc<dyn TokenCredential>) -> anyhow::Result<Self> {
        let cluster_url = format!(
            "{}/subscriptions/{}/resourceGroups/{}/providers/Microsoft.ContainerService/managedClusters/{}",
            config.arm_endpoint.trim_end_matches('/'),
            config.subscription_id,
            config.resource_group,
            config.cluster_name
        );
        info!("AKS management endpoint: {}", cluster_url);

        let http_client = Client::builder()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            credential,
            cluster_url,
        })
    }

    fn pool_url(&self, name: &str, suffix: &str) -> String {
        format!(
            "{}/agentPools/{}{}?api-version={}",
            self.cluster_url, name, suffix, AKS_API_VERSION
        )
    }

    async fn send(&self, request: RequestBuilder, operation: &str, pool: &str) -> Result<Response> {
        let token = get_token(&self.credential).await?;
        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| Error::transport(operation, e))?;
        check_status(response, operation, pool).await
    }
}

/// Map management plane status codes onto the error classification
async fn check_status(response: Response, operation: &str, pool: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    match status {
        StatusCode::NOT_FOUND => Err(Error::not_found("agent pool", pool)),
        StatusCode::CONFLICT => {
            debug!(pool = pool, body = %message, "agent pool conflict");
            Err(Error::Conflict(format!("agent pool {pool}")))
        }
        _ => Err(Error::Status {
            operation: format!("{operation} {pool}"),
            status: status.as_u16(),
            message,
        }),
    }
}

#[async_trait]
impl NodePoolProvider for AksAgentPoolClient {
    async fn get_agent_pool(&self, name: &str) -> Result<AgentPool> {
        let span = info_span!("aks.agent_pool.get", pool.name = name);
        async move {
            let response = self
                .send(self.http_client.get(self.pool_url(name, "")), "get agent pool", name)
                .await?;
            response
                .json::<AgentPool>()
                .await
                .map_err(|e| Error::malformed(format!("agent pool {name}"), e.to_string()))
        }
        .instrument(span)
        .await
    }

    async fn begin_create_or_update(&self, name: &str, pool: &AgentPool) -> Result<()> {
        let span = info_span!("aks.agent_pool.create_or_update", pool.name = name);
        async move {
            let request = self.http_client.put(self.pool_url(name, "")).json(pool);
            self.send(request, "create or update agent pool", name).await?;
            info!(pool = name, "agent pool create or update accepted");
            Ok(())
        }
        .instrument(span)
        .await
    }

    async fn begin_delete(&self, name: &str) -> Result<()> {
        let span = info_span!("aks.agent_pool.delete", pool.name = name);
        async move {
            self.send(
                self.http_client.delete(self.pool_url(name, "")),
                "delete agent pool",
                name,
            )
            .await?;
            info!(pool = name, "agent pool delete accepted");
            Ok(())
        }
        .instrument(span)
        .await
    }

    async fn latest_node_image_version(&self, name: &str) -> Result<String> {
        let response = self
            .send(
                self.http_client
                    .get(self.pool_url(name, "/upgradeProfiles/default")),
                "get upgrade profile",
                name,
            )
            .await?;
        let profile = response
            .json::<UpgradeProfile>()
            .await
            .map_err(|e| Error::malformed(format!("upgrade profile of {name}"), e.to_string()))?;
        profile
            .properties
            .latest_node_image_version
            .ok_or_else(|| {
                Error::malformed(
                    format!("upgrade profile of {name}"),
                    "latestNodeImageVersion is missing",
                )
            })
    }

    async fn begin_upgrade_node_image(&self, name: &str) -> Result<()> {
        let span = info_span!("aks.agent_pool.upgrade_node_image", pool.name = name);
        async move {
            let request = self
                .http_client
                .post(self.pool_url(name, "/upgradeNodeImageVersion"))
                .header(CONTENT_LENGTH, 0);
            self.send(request, "upgrade node image", name).await?;
            info!(pool = name, "node image upgrade accepted");
            Ok(())
        }
        .instrument(span)
        .await
    }
}
