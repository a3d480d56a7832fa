//! # Constants
//!
//! Default values and well-known names shared across the controller.

/// Default requeue delay after a failed reconcile (seconds)
pub const DEFAULT_ERROR_REQUEUE_SECS: u64 = 10;

/// Default requeue delay while a campaign is making progress (seconds)
pub const DEFAULT_PROGRESS_REQUEUE_SECS: u64 = 10;

/// Default requeue delay once a campaign is fully converged (seconds)
pub const DEFAULT_STEADY_STATE_REQUEUE_SECS: u64 = 3600;

/// Upper bound on a single reconcile invocation (seconds)
pub const DEFAULT_RECONCILE_TIMEOUT_SECS: u64 = 600;

/// Default port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 5000;

/// How long to wait for the HTTP server to bind (seconds)
pub const DEFAULT_SERVER_STARTUP_TIMEOUT_SECS: u64 = 10;

/// Poll interval while waiting for the HTTP server (milliseconds)
pub const DEFAULT_SERVER_POLL_INTERVAL_MS: u64 = 50;

/// Field manager used for every write this controller makes
pub const FIELD_MANAGER: &str = "node-image-updater";

/// Node label naming the AKS agent pool a node belongs to
pub const AGENT_POOL_LABEL: &str = "agentpool";

/// Node label carrying the node image version the node booted from
pub const NODE_IMAGE_VERSION_LABEL: &str = "kubernetes.azure.com/node-image-version";

/// Container environment variable holding the Azure DevOps agent pool name
pub const AGENT_POOL_ENV_VAR: &str = "AZP_POOL";

/// Pod annotation set once the pod's agent has been deregistered from Azure DevOps
pub const AGENT_REMOVED_ANNOTATION: &str = "nodeupdate.azure.dev/agent-removed";

/// Prefix shared by the surge pool and the scaling-state ConfigMap names
pub const TEMPORARY_PREFIX: &str = "tmp";

/// AKS limits agent pool names to 12 characters
pub const MAX_POOL_NAME_LEN: usize = 12;

/// Azure Resource Manager endpoint
pub const DEFAULT_ARM_ENDPOINT: &str = "https://management.azure.com";

/// Token scope for Azure Resource Manager
pub const ARM_SCOPE: &str = "https://management.azure.com/.default";

/// API version used for managed cluster agent pool operations
pub const AKS_API_VERSION: &str = "2024-09-01";

/// Azure DevOps organization base URL
pub const DEFAULT_DEVOPS_URL: &str = "https://dev.azure.com";

/// API version used for distributed task pool and agent operations
pub const DEVOPS_API_VERSION: &str = "7.1-preview.1";
