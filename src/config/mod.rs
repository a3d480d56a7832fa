//! # Controller Configuration
//!
//! Configuration loaded from environment variables (populated from a ConfigMap and a Secret
//! via `envFrom` in the deployment).
//!
//! Requeue intervals and server settings have defaults. Cluster identity and Azure DevOps
//! credentials are required and validated at startup.

mod azure;
mod controller;
mod server;

pub use azure::{AzureConfig, DevOpsConfig};
pub use controller::ControllerConfig;
pub use server::ServerConfig;

/// Read environment variable or return default value
pub(crate) fn env_var_or_default<T: std::str::FromStr>(key: &str, default: T) -> T
where
    <T as std::str::FromStr>::Err: std::fmt::Debug,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Read a required, non-empty environment variable
pub(crate) fn required_env_var(key: &str) -> anyhow::Result<String> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(anyhow::anyhow!("environment variable {key} must be set")),
    }
}
