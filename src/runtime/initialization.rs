//! # Initialization
//!
//! Controller initialization: rustls setup, tracing, metrics, server startup, Kubernetes
//! client, Azure credential and the provider clients.

use crate::cluster::KubeCluster;
use crate::config::{AzureConfig, ControllerConfig, DevOpsConfig, ServerConfig};
use crate::controller::reconciler::Reconciler;
use crate::controller::server::{start_server, ServerState};
use crate::crd::SafeEvict;
use crate::observability;
use crate::provider::azure::{create_credential, AksAgentPoolClient};
use crate::provider::azure_devops::AzureDevOpsClient;
use anyhow::{Context, Result};
use kube::api::{Api, ListParams};
use kube::Client;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{error, info};

/// Everything the watch loop needs
pub struct InitializationResult {
    /// API for SafeEvict resources, scoped to `WATCH_NAMESPACE` when set
    pub campaigns: Api<SafeEvict>,
    /// Reconciler context
    pub reconciler: Arc<Reconciler>,
    /// Server state for health checks
    pub server_state: Arc<ServerState>,
}

/// Initialize the controller runtime
///
/// # Errors
///
/// Fails when configuration is missing or invalid, the HTTP server cannot start, or the
/// cluster is unreachable.
pub async fn initialize() -> Result<InitializationResult> {
    // Must run before anything opens a TLS connection
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "node_image_updater=info".into()),
        )
        .init();

    info!(
        "Starting node image updater v{}",
        env!("CARGO_PKG_VERSION")
    );

    let controller_config = ControllerConfig::from_env();
    let server_config = ServerConfig::from_env();
    let azure_config = AzureConfig::from_env()?;
    let devops_config = DevOpsConfig::from_env()?;
    info!(
        subscription = %azure_config.subscription_id,
        resource_group = %azure_config.resource_group,
        cluster = %azure_config.cluster_name,
        "managed cluster"
    );

    observability::metrics::register_metrics()?;

    let server_state = Arc::new(ServerState::default());
    let server_state_clone = Arc::clone(&server_state);
    let addr = server_config.bind_addr;
    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(addr, server_state_clone).await {
            error!("HTTP server error: {:#}", e);
        }
    });
    wait_for_server_ready(&server_config, &server_state, &server_handle).await?;

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    let campaigns: Api<SafeEvict> = match &controller_config.watch_namespace {
        Some(namespace) => Api::namespaced(client.clone(), namespace),
        None => Api::all(client.clone()),
    };
    check_crd_installed(&campaigns).await?;

    let credential = create_credential(&azure_config)?;
    let node_pools = Arc::new(AksAgentPoolClient::new(&azure_config, credential)?);
    let agents = Arc::new(AzureDevOpsClient::new(&devops_config)?);
    let cluster = Arc::new(KubeCluster::new(client));

    let reconciler = Arc::new(Reconciler::new(
        cluster,
        node_pools,
        agents,
        controller_config,
    ));

    info!("Controller initialized, starting watch loop...");

    Ok(InitializationResult {
        campaigns,
        reconciler,
        server_state,
    })
}

/// Wait for the HTTP server to become ready
async fn wait_for_server_ready(
    config: &ServerConfig,
    server_state: &Arc<ServerState>,
    server_handle: &tokio::task::JoinHandle<()>,
) -> Result<()> {
    let deadline = tokio::time::Instant::now() + config.startup_timeout;

    loop {
        if server_handle.is_finished() {
            return Err(anyhow::anyhow!(
                "HTTP server failed to start on {}",
                config.bind_addr
            ));
        }

        if server_state.is_ready.load(Ordering::Relaxed) {
            info!(addr = %config.bind_addr, "HTTP server is ready and accepting connections");
            return Ok(());
        }

        if tokio::time::Instant::now() > deadline {
            return Err(anyhow::anyhow!(
                "HTTP server failed to become ready within {:?}",
                config.startup_timeout
            ));
        }

        tokio::time::sleep(config.poll_interval).await;
    }
}

/// Fail fast when the SafeEvict CRD is not installed or not readable
async fn check_crd_installed(campaigns: &Api<SafeEvict>) -> Result<()> {
    let existing = campaigns
        .list(&ListParams::default().limit(1))
        .await
        .context("SafeEvict CRD is not queryable; is it installed and is RBAC in place?")?;
    info!(
        "SafeEvict CRD is available ({} resource(s) in first page)",
        existing.items.len()
    );
    Ok(())
}
