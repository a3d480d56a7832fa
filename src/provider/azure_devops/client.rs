//! # Azure DevOps Client
//!
//! `_apis/distributedtask` calls authenticated with a personal access token (basic auth with
//! an empty user name). Any non-2xx status fails the call.

use super::types::{ListResponse, TaskAgent, TaskAgentPool};
use crate::config::DevOpsConfig;
use crate::constants::DEVOPS_API_VERSION;
use crate::error::{Error, Result};
use crate::provider::AgentRegistry;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, info, info_span, Instrument};
use zeroize::Zeroizing;

pub struct AzureDevOpsClient {
    http_client: Client,
    organization_url: String,
    personal_access_token: Zeroizing<String>,
}

impl std::fmt::Debug for AzureDevOpsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureDevOpsClient")
            .field("organization_url", &self.organization_url)
            .finish_non_exhaustive()
    }
}

impl AzureDevOpsClient {
    /// # Errors
    ///
    /// Fails when the HTTP client cannot be built.
    pub fn new(config: &DevOpsConfig) -> anyhow::Result<Self> {
        let organization_url = format!(
            "{}/{}",
            config.base_url.trim_end_matches('/'),
            config.organization
        );
        info!("Azure DevOps organization: {}", organization_url);

        let http_client = Client::builder()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            organization_url,
            personal_access_token: config.personal_access_token.clone(),
        })
    }

    fn pools_url(&self) -> String {
        format!("{}/_apis/distributedtask/pools", self.organization_url)
    }

    fn agents_url(&self, pool_id: i64) -> String {
        format!("{}/{}/agents", self.pools_url(), pool_id)
    }

    fn agent_url(&self, pool_id: i64, agent_id: i64) -> String {
        format!("{}/{}", self.agents_url(pool_id), agent_id)
    }

    async fn send(&self, request: RequestBuilder, operation: &str) -> Result<Response> {
        let response = request
            .query(&[("api-version", DEVOPS_API_VERSION)])
            .basic_auth("", Some(self.personal_access_token.as_str()))
            .send()
            .await
            .map_err(|e| Error::transport(operation, e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Status {
                operation: operation.to_string(),
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }

    async fn list<T: DeserializeOwned>(&self, url: String, operation: &str) -> Result<Vec<T>> {
        let response = self.send(self.http_client.get(url), operation).await?;
        let list = response
            .json::<ListResponse<T>>()
            .await
            .map_err(|e| Error::malformed(operation.to_string(), e.to_string()))?;
        Ok(list.value)
    }

    /// Resolve an agent pool name to its id
    pub async fn find_pool(&self, pool_name: &str) -> Result<TaskAgentPool> {
        let pools: Vec<TaskAgentPool> = self.list(self.pools_url(), "list agent pools").await?;
        pools
            .into_iter()
            .find(|pool| pool.name == pool_name)
            .ok_or_else(|| Error::not_found("agent pool", pool_name))
    }

    /// Resolve an agent name to its registration inside a pool
    pub async fn find_agent(&self, pool: &TaskAgentPool, agent_name: &str) -> Result<TaskAgent> {
        let agents: Vec<TaskAgent> = self
            .list(self.agents_url(pool.id), "list agents")
            .await?;
        agents
            .into_iter()
            .find(|agent| agent.name == agent_name)
            .ok_or_else(|| Error::not_found("agent", format!("{}/{}", pool.name, agent_name)))
    }
}

#[async_trait]
impl AgentRegistry for AzureDevOpsClient {
    async fn disable_agent(&self, pool_name: &str, agent_name: &str) -> Result<()> {
        let span = info_span!(
            "azure_devops.agent.disable",
            agent.pool = pool_name,
            agent.name = agent_name
        );
        async move {
            let pool = self.find_pool(pool_name).await?;
            let agent = self.find_agent(&pool, agent_name).await?;
            let request = self
                .http_client
                .patch(self.agent_url(pool.id, agent.id))
                .json(&json!({ "id": agent.id, "enabled": false }));
            self.send(request, "disable agent").await?;
            debug!(agent.id = agent.id, "agent disabled");
            Ok(())
        }
        .instrument(span)
        .await
    }

    async fn remove_agent(&self, pool_name: &str, agent_name: &str) -> Result<()> {
        let span = info_span!(
            "azure_devops.agent.remove",
            agent.pool = pool_name,
            agent.name = agent_name
        );
        async move {
            let pool = self.find_pool(pool_name).await?;
            let agent = self.find_agent(&pool, agent_name).await?;
            self.send(
                self.http_client.delete(self.agent_url(pool.id, agent.id)),
                "remove agent",
            )
            .await?;
            info!(agent.id = agent.id, "agent registration removed");
            Ok(())
        }
        .instrument(span)
        .await
    }
}
